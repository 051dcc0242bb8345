use chrono::{Months, NaiveDate};
use tracing::debug;

use crate::config::{FeeStructure, SchedulePolicy};
use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::types::{ItemKey, PaymentPlan};

use super::overrides::ScheduleDateOverride;
use super::{PaymentSchedule, ScheduleItem};

/// lays out payable items and default due dates for a plan.
///
/// base amounts are whole currency units. the last item of every split absorbs
/// the rounding residual, so the leaf bases plus the admission fee always add
/// up to the total program fee.
pub struct ScheduleGenerator {
    policy: SchedulePolicy,
}

impl ScheduleGenerator {
    pub fn new(policy: SchedulePolicy) -> Self {
        Self { policy }
    }

    /// generate the unadjusted schedule, applying due-date overrides when given
    pub fn generate(
        &self,
        structure: &FeeStructure,
        plan: PaymentPlan,
        start_date: NaiveDate,
        overrides: Option<&ScheduleDateOverride>,
    ) -> Result<PaymentSchedule> {
        structure.validate()?;

        let amount = structure.schedulable_amount();
        let mut items = match plan {
            PaymentPlan::OneShot => vec![ScheduleItem::new(ItemKey::OneShot, start_date, amount)],
            PaymentPlan::SemWise => self.semester_items(structure, amount, start_date)?,
            PaymentPlan::InstalmentWise => self.installment_items(structure, amount, start_date)?,
            PaymentPlan::NotSelected => return Err(FeeError::InvalidPlan { plan }),
        };

        if let Some(overrides) = overrides {
            if overrides.plan() != plan {
                return Err(FeeError::invalid_override(format!(
                    "override is for {} but schedule is {}",
                    overrides.plan(),
                    plan
                )));
            }
            for item in items.iter_mut() {
                if let Some(date) = overrides.due_date_for(&item.key) {
                    item.due_date = date;
                }
            }
        }

        let schedule = PaymentSchedule {
            plan,
            start_date,
            admission: ScheduleItem::new(ItemKey::Admission, start_date, structure.admission_fee),
            items,
        };

        debug!(
            plan = %plan,
            items = schedule.items.len(),
            total_base = %schedule.total_base(),
            "generated schedule"
        );

        Ok(schedule)
    }

    fn semester_items(
        &self,
        structure: &FeeStructure,
        amount: Money,
        start_date: NaiveDate,
    ) -> Result<Vec<ScheduleItem>> {
        let shares = amount.split_evenly(structure.number_of_semesters as usize);

        shares
            .into_iter()
            .enumerate()
            .map(|(i, base)| {
                let semester = i as u32 + 1;
                let due = self.semester_start(start_date, semester)?;
                Ok(ScheduleItem::new(ItemKey::Semester { semester }, due, base))
            })
            .collect()
    }

    fn installment_items(
        &self,
        structure: &FeeStructure,
        amount: Money,
        start_date: NaiveDate,
    ) -> Result<Vec<ScheduleItem>> {
        let capacity = structure.item_count(PaymentPlan::InstalmentWise)? as usize;
        let per_semester = structure.installments_per_semester as usize;
        let semester_shares = amount.split_evenly(structure.number_of_semesters as usize);

        let mut items = Vec::with_capacity(capacity);
        for (i, semester_amount) in semester_shares.into_iter().enumerate() {
            let semester = i as u32 + 1;
            let semester_start = self.semester_start(start_date, semester)?;

            for (j, base) in semester_amount.split_evenly(per_semester).into_iter().enumerate() {
                let installment = j as u32 + 1;
                let offset = (installment - 1) * self.policy.installment_interval_months;
                let due = add_months(semester_start, offset)?;
                items.push(ScheduleItem::new(
                    ItemKey::Installment { semester, installment },
                    due,
                    base,
                ));
            }
        }
        Ok(items)
    }

    fn semester_start(&self, start_date: NaiveDate, semester: u32) -> Result<NaiveDate> {
        add_months(start_date, (semester - 1) * self.policy.semester_length_months)
    }
}

impl Default for ScheduleGenerator {
    fn default() -> Self {
        Self::new(SchedulePolicy::default())
    }
}

/// add calendar months, clamping to the end of shorter months
fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| FeeError::calculation(format!("due date overflow: {} + {} months", date, months)))
}
