use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{FeeError, Result};
use crate::types::{CohortId, PaymentPlan};

/// GST rate applied to program fees when the stored row leaves it blank
pub const DEFAULT_GST_PERCENTAGE: Decimal = dec!(18);

/// upper bounds on schedule shape; anything larger is a corrupt row
pub const MAX_SEMESTERS: u32 = 24;
pub const MAX_INSTALLMENTS_PER_SEMESTER: u32 = 24;

/// canonical fee structure of a cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeStructure {
    pub cohort_id: CohortId,
    pub total_program_fee: Money,
    pub admission_fee: Money,
    pub number_of_semesters: u32,
    pub installments_per_semester: u32,
    pub one_shot_discount: Rate,
    pub gst: Rate,
    pub program_fee_includes_gst: bool,
    pub equal_scholarship_distribution: bool,
    /// bumped on every explicit revision
    pub version: u32,
}

impl FeeStructure {
    pub fn builder() -> FeeStructureBuilder {
        FeeStructureBuilder::new()
    }

    /// check amounts, counts and percentages
    pub fn validate(&self) -> Result<()> {
        if self.total_program_fee.is_negative() {
            return Err(FeeError::calculation(format!(
                "total program fee is negative: {}",
                self.total_program_fee
            )));
        }
        if self.admission_fee.is_negative() {
            return Err(FeeError::calculation(format!(
                "admission fee is negative: {}",
                self.admission_fee
            )));
        }
        if self.admission_fee > self.total_program_fee {
            return Err(FeeError::calculation(format!(
                "admission fee {} exceeds total program fee {}",
                self.admission_fee, self.total_program_fee
            )));
        }
        if self.number_of_semesters == 0 {
            return Err(FeeError::configuration("number of semesters must be at least 1"));
        }
        if self.installments_per_semester == 0 {
            return Err(FeeError::configuration(
                "installments per semester must be at least 1",
            ));
        }
        if self.number_of_semesters > MAX_SEMESTERS {
            return Err(FeeError::configuration(format!(
                "number of semesters {} exceeds {}",
                self.number_of_semesters, MAX_SEMESTERS
            )));
        }
        if self.installments_per_semester > MAX_INSTALLMENTS_PER_SEMESTER {
            return Err(FeeError::configuration(format!(
                "installments per semester {} exceeds {}",
                self.installments_per_semester, MAX_INSTALLMENTS_PER_SEMESTER
            )));
        }
        if !self.one_shot_discount.is_valid_percentage() {
            return Err(FeeError::calculation(format!(
                "one-shot discount out of range: {}",
                self.one_shot_discount
            )));
        }
        if !self.gst.is_valid_percentage() {
            return Err(FeeError::calculation(format!("gst out of range: {}", self.gst)));
        }
        Ok(())
    }

    /// program fee left after the admission fee, spread over the schedule
    pub fn schedulable_amount(&self) -> Money {
        self.total_program_fee - self.admission_fee
    }

    /// number of leaf items the plan produces
    pub fn item_count(&self, plan: PaymentPlan) -> Result<u32> {
        match plan {
            PaymentPlan::OneShot => Ok(1),
            PaymentPlan::SemWise => Ok(self.number_of_semesters),
            PaymentPlan::InstalmentWise => self
                .number_of_semesters
                .checked_mul(self.installments_per_semester)
                .ok_or_else(|| {
                    FeeError::calculation(format!(
                        "{} semesters x {} installments overflows",
                        self.number_of_semesters, self.installments_per_semester
                    ))
                }),
            PaymentPlan::NotSelected => Ok(0),
        }
    }

    /// apply an explicit revision and bump the version
    pub fn revise<F>(&self, change: F) -> Result<FeeStructure>
    where
        F: FnOnce(&mut FeeStructure),
    {
        let mut revised = self.clone();
        change(&mut revised);
        revised.version = self.version + 1;
        revised.validate()?;
        Ok(revised)
    }
}

/// fee structure row as persisted by cohort administration.
/// amounts are stored as strings, flags may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeStructureRecord {
    pub cohort_id: CohortId,
    pub total_program_fee: Option<String>,
    pub admission_fee: Option<String>,
    pub number_of_semesters: Option<i64>,
    pub instalments_per_semester: Option<i64>,
    pub one_shot_discount_percentage: Option<String>,
    pub gst_percentage: Option<String>,
    pub program_fee_includes_gst: Option<bool>,
    pub equal_scholarship_distribution: Option<bool>,
    pub is_setup_complete: bool,
    pub version: Option<u32>,
}

/// semester cadence used to lay out default due dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    pub semester_length_months: u32,
    pub installment_interval_months: u32,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            semester_length_months: 6,
            installment_interval_months: 1,
        }
    }
}

impl SchedulePolicy {
    pub fn new(semester_length_months: u32, installment_interval_months: u32) -> Self {
        Self {
            semester_length_months,
            installment_interval_months,
        }
    }
}

pub struct FeeStructureBuilder {
    cohort_id: Option<CohortId>,
    total_program_fee: Option<Money>,
    admission_fee: Money,
    number_of_semesters: u32,
    installments_per_semester: u32,
    one_shot_discount: Rate,
    gst: Rate,
    program_fee_includes_gst: bool,
    equal_scholarship_distribution: bool,
}

impl FeeStructureBuilder {
    pub fn new() -> Self {
        Self {
            cohort_id: None,
            total_program_fee: None,
            admission_fee: Money::ZERO,
            number_of_semesters: 1,
            installments_per_semester: 1,
            one_shot_discount: Rate::ZERO,
            gst: Rate::from_percentage(DEFAULT_GST_PERCENTAGE),
            program_fee_includes_gst: true,
            equal_scholarship_distribution: false,
        }
    }

    pub fn cohort_id(mut self, cohort_id: CohortId) -> Self {
        self.cohort_id = Some(cohort_id);
        self
    }

    pub fn total_program_fee(mut self, amount: Money) -> Self {
        self.total_program_fee = Some(amount);
        self
    }

    pub fn admission_fee(mut self, amount: Money) -> Self {
        self.admission_fee = amount;
        self
    }

    pub fn semesters(mut self, count: u32) -> Self {
        self.number_of_semesters = count;
        self
    }

    pub fn installments_per_semester(mut self, count: u32) -> Self {
        self.installments_per_semester = count;
        self
    }

    /// one-shot discount as a percentage (e.g., 5 for 5%)
    pub fn one_shot_discount(mut self, percentage: Decimal) -> Self {
        self.one_shot_discount = Rate::from_percentage(percentage);
        self
    }

    /// gst as a percentage (e.g., 18 for 18%)
    pub fn gst_percentage(mut self, percentage: Decimal) -> Self {
        self.gst = Rate::from_percentage(percentage);
        self
    }

    pub fn program_fee_includes_gst(mut self, includes: bool) -> Self {
        self.program_fee_includes_gst = includes;
        self
    }

    pub fn equal_scholarship_distribution(mut self, equal: bool) -> Self {
        self.equal_scholarship_distribution = equal;
        self
    }

    pub fn build(self) -> Result<FeeStructure> {
        let total_program_fee = self
            .total_program_fee
            .ok_or_else(|| FeeError::configuration("total program fee is required"))?;

        let structure = FeeStructure {
            cohort_id: self.cohort_id.unwrap_or_else(Uuid::new_v4),
            total_program_fee,
            admission_fee: self.admission_fee,
            number_of_semesters: self.number_of_semesters,
            installments_per_semester: self.installments_per_semester,
            one_shot_discount: self.one_shot_discount,
            gst: self.gst,
            program_fee_includes_gst: self.program_fee_includes_gst,
            equal_scholarship_distribution: self.equal_scholarship_distribution,
            version: 1,
        };
        structure.validate()?;
        Ok(structure)
    }
}

impl Default for FeeStructureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
