use chrono::NaiveDate;
use tracing::debug;

use crate::config::FeeStructure;
use crate::decimal::{Money, Rate};
use crate::errors::{FeeError, Result};
use crate::schedule::{PaymentSchedule, ScheduleItem};
use crate::transactions::PaymentTransaction;
use crate::types::{ItemKey, PaymentPlan, PaymentStatus};

use super::reconciliation::reconcile;
use super::{ItemBreakdown, OverallSummary, PaymentBreakdown, SemesterBreakdown};

/// percentage reductions applied to a schedule
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Adjustments {
    pub scholarship: Rate,
    /// only honored for the one-shot plan
    pub one_shot_discount: Option<Rate>,
    /// extra discount on every item of any plan
    pub additional_discount: Rate,
}

impl Adjustments {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_scholarship(mut self, scholarship: Rate) -> Self {
        self.scholarship = scholarship;
        self
    }

    pub fn with_one_shot_discount(mut self, discount: Rate) -> Self {
        self.one_shot_discount = Some(discount);
        self
    }

    pub fn with_additional_discount(mut self, discount: Rate) -> Self {
        self.additional_discount = discount;
        self
    }

    fn validate(&self) -> Result<()> {
        let rates = [
            ("scholarship", Some(self.scholarship)),
            ("one-shot discount", self.one_shot_discount),
            ("additional discount", Some(self.additional_discount)),
        ];
        for (name, rate) in rates {
            if let Some(rate) = rate {
                if !rate.is_valid_percentage() {
                    return Err(FeeError::calculation(format!("{} out of range: {}", name, rate)));
                }
            }
        }
        Ok(())
    }
}

/// applies GST, discounts and scholarship to a schedule and reconciles payments.
///
/// every leaf amount is a whole currency unit. GST is always charged on the base
/// left after discount and scholarship. the scholarship is sized once on the
/// total program fee, the additional discount once on the aggregate base; both
/// are then spread with the last item absorbing the residual. reported
/// reductions are capped at the item's base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakdownCalculator {
    gst: Rate,
    program_fee_includes_gst: bool,
    equal_scholarship_distribution: bool,
}

impl BreakdownCalculator {
    pub fn new(gst: Rate, program_fee_includes_gst: bool, equal_scholarship_distribution: bool) -> Self {
        Self {
            gst,
            program_fee_includes_gst,
            equal_scholarship_distribution,
        }
    }

    pub fn for_structure(structure: &FeeStructure) -> Self {
        Self::new(
            structure.gst,
            structure.program_fee_includes_gst,
            structure.equal_scholarship_distribution,
        )
    }

    pub fn compute_breakdown(
        &self,
        schedule: &PaymentSchedule,
        adjustments: &Adjustments,
        transactions: &[PaymentTransaction],
        today: NaiveDate,
    ) -> Result<PaymentBreakdown> {
        if !schedule.plan.is_selected() {
            return Err(FeeError::InvalidPlan { plan: schedule.plan });
        }
        if schedule.items.is_empty() {
            return Err(FeeError::calculation("schedule has no items"));
        }
        if !self.gst.is_valid_percentage() {
            return Err(FeeError::calculation(format!("gst out of range: {}", self.gst)));
        }
        adjustments.validate()?;
        if let Some(item) = schedule
            .items
            .iter()
            .chain(std::iter::once(&schedule.admission))
            .find(|i| i.base_amount.is_negative())
        {
            return Err(FeeError::calculation(format!(
                "negative scheduled amount on {}: {}",
                item.key, item.base_amount
            )));
        }

        let gross: Vec<Money> = schedule.items.iter().map(|i| i.base_amount).collect();
        let total_program_fee = schedule.total_base() + schedule.admission.base_amount;
        let bases = self.exclusive_bases(&gross);
        let scholarships = self.scholarship_shares(&gross, total_program_fee, adjustments.scholarship);
        let discounts = self.discount_shares(schedule.plan, &bases, adjustments);

        let mut items: Vec<ItemBreakdown> = Vec::with_capacity(schedule.items.len() + 1);
        items.push(admission_item(&schedule.admission));
        for (i, scheduled) in schedule.items.iter().enumerate() {
            // reductions never exceed the base: discount first, scholarship from the rest
            let discount = discounts[i].min(bases[i]);
            let scholarship = scholarships[i].min(bases[i] - discount);
            let net_base = bases[i] - discount - scholarship;
            let gst_amount = net_base.percentage_units(self.gst);

            items.push(ItemBreakdown {
                key: scheduled.key,
                due_date: scheduled.due_date,
                gross_amount: scheduled.base_amount,
                base_amount: bases[i],
                gst_amount,
                discount_amount: discount,
                scholarship_amount: scholarship,
                amount_payable: net_base + gst_amount,
                amount_paid: Money::ZERO,
                amount_pending: Money::ZERO,
                status: PaymentStatus::Pending,
            });
        }

        let issues = reconcile(&mut items, transactions, today);

        if let Some(item) = items.iter().find(|i| has_negative_amount(i)) {
            return Err(FeeError::calculation(format!("negative amount computed for {}", item.key)));
        }

        let mut items = items.into_iter();
        let admission_fee = items
            .next()
            .ok_or_else(|| FeeError::calculation("admission item missing"))?;
        let leaves: Vec<ItemBreakdown> = items.collect();

        let overall_summary = summarize(&admission_fee, &leaves);
        let (one_shot_payment, semesters) = match schedule.plan {
            PaymentPlan::OneShot => (leaves.into_iter().next(), Vec::new()),
            _ => (None, group_by_semester(leaves)),
        };

        debug!(
            plan = %schedule.plan,
            total_payable = %overall_summary.total_amount_payable,
            total_paid = %overall_summary.total_amount_paid,
            issues = issues.len(),
            "computed breakdown"
        );

        Ok(PaymentBreakdown {
            payment_plan: schedule.plan,
            admission_fee,
            one_shot_payment,
            semesters,
            overall_summary,
            issues,
        })
    }

    /// strip included GST; the aggregate is rounded once and spread by gross amount
    fn exclusive_bases(&self, gross: &[Money]) -> Vec<Money> {
        if !self.program_fee_includes_gst || self.gst.is_zero() {
            return gross.to_vec();
        }
        let total: Money = gross.iter().copied().sum();
        total.exclusive_of(self.gst).allocate(gross)
    }

    /// scholarship is sized once on the whole program fee and spread over the
    /// plan items; the admission fee itself is never reduced
    fn scholarship_shares(&self, gross: &[Money], total_program_fee: Money, scholarship: Rate) -> Vec<Money> {
        if scholarship.is_zero() {
            return vec![Money::ZERO; gross.len()];
        }
        let aggregate = total_program_fee.percentage_units(scholarship);

        if self.equal_scholarship_distribution {
            aggregate.split_evenly(gross.len())
        } else {
            aggregate.allocate(gross)
        }
    }

    fn discount_shares(&self, plan: PaymentPlan, bases: &[Money], adjustments: &Adjustments) -> Vec<Money> {
        let one_shot: Vec<Money> = match (plan, adjustments.one_shot_discount) {
            (PaymentPlan::OneShot, Some(rate)) => bases
                .iter()
                .map(|b| b.percentage_units(rate))
                .collect(),
            _ => vec![Money::ZERO; bases.len()],
        };

        let additional = if adjustments.additional_discount.is_zero() {
            vec![Money::ZERO; bases.len()]
        } else {
            let total_base: Money = bases.iter().copied().sum();
            total_base
                .percentage_units(adjustments.additional_discount)
                .allocate(bases)
        };

        one_shot
            .into_iter()
            .zip(additional)
            .map(|(a, b)| a + b)
            .collect()
    }
}

fn admission_item(admission: &ScheduleItem) -> ItemBreakdown {
    ItemBreakdown {
        key: ItemKey::Admission,
        due_date: admission.due_date,
        gross_amount: admission.base_amount,
        base_amount: admission.base_amount,
        gst_amount: Money::ZERO,
        discount_amount: Money::ZERO,
        scholarship_amount: Money::ZERO,
        amount_payable: admission.base_amount,
        amount_paid: Money::ZERO,
        amount_pending: Money::ZERO,
        status: PaymentStatus::Pending,
    }
}

fn has_negative_amount(item: &ItemBreakdown) -> bool {
    [
        item.base_amount,
        item.gst_amount,
        item.discount_amount,
        item.scholarship_amount,
        item.amount_payable,
        item.amount_paid,
        item.amount_pending,
    ]
    .iter()
    .any(|m| m.is_negative())
}

fn summarize(admission: &ItemBreakdown, leaves: &[ItemBreakdown]) -> OverallSummary {
    let sum = |f: fn(&ItemBreakdown) -> Money| -> Money { leaves.iter().map(f).sum() };

    OverallSummary {
        total_program_fee: sum(|i| i.gross_amount) + admission.gross_amount,
        admission_fee: admission.amount_payable,
        total_base_amount: sum(|i| i.base_amount),
        total_gst: sum(|i| i.gst_amount),
        total_discount: sum(|i| i.discount_amount),
        total_scholarship: sum(|i| i.scholarship_amount),
        total_amount_payable: sum(|i| i.amount_payable) + admission.amount_payable,
        total_amount_paid: sum(|i| i.amount_paid) + admission.amount_paid,
        total_amount_pending: sum(|i| i.amount_pending) + admission.amount_pending,
    }
}

fn group_by_semester(leaves: Vec<ItemBreakdown>) -> Vec<SemesterBreakdown> {
    let mut semesters: Vec<SemesterBreakdown> = Vec::new();
    let mut current: Option<(u32, Vec<ItemBreakdown>)> = None;

    for item in leaves {
        let semester = item.key.semester().unwrap_or(0);
        match current.as_mut() {
            Some((number, items)) if *number == semester => items.push(item),
            _ => {
                if let Some((number, items)) = current.take() {
                    semesters.push(SemesterBreakdown::new(number, items));
                }
                current = Some((semester, vec![item]));
            }
        }
    }
    if let Some((number, items)) = current {
        semesters.push(SemesterBreakdown::new(number, items));
    }
    semesters
}
