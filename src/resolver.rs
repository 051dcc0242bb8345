use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;

use crate::config::{FeeStructure, FeeStructureRecord, DEFAULT_GST_PERCENTAGE};
use crate::decimal::{Money, Rate};
use crate::errors::{FeeError, Result};
use crate::events::{Event, EventStore};
use crate::scholarship::Scholarship;
use crate::transactions::PaymentTransaction;
use crate::types::{CohortId, PaymentPlan, ScholarshipId, StudentId};

/// persistence collaborator the engine reads from
pub trait FeeRepository {
    /// stored fee structure row for a cohort
    fn fee_structure(&self, cohort_id: CohortId) -> Result<Option<FeeStructureRecord>>;

    fn scholarship(&self, scholarship_id: ScholarshipId) -> Result<Option<Scholarship>>;

    /// active scholarship assigned to the student in the cohort
    fn student_scholarship(&self, student_id: StudentId, cohort_id: CohortId) -> Result<Option<Scholarship>>;

    /// all recorded payments of the student in the cohort, read fresh on every call
    fn transactions(&self, student_id: StudentId, cohort_id: CohortId) -> Result<Vec<PaymentTransaction>>;

    /// persisted due-date override json for the student's plan
    fn schedule_override(
        &self,
        student_id: StudentId,
        cohort_id: CohortId,
        plan: PaymentPlan,
    ) -> Result<Option<Value>>;
}

/// in-memory repository for tests and demos
#[derive(Debug, Default)]
pub struct InMemoryFeeRepository {
    fee_structures: HashMap<CohortId, FeeStructureRecord>,
    scholarships: HashMap<ScholarshipId, Scholarship>,
    assignments: HashMap<(StudentId, CohortId), ScholarshipId>,
    transactions: HashMap<(StudentId, CohortId), Vec<PaymentTransaction>>,
    overrides: HashMap<(StudentId, CohortId, PaymentPlan), Value>,
}

impl InMemoryFeeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_fee_structure(&mut self, record: FeeStructureRecord) {
        self.fee_structures.insert(record.cohort_id, record);
    }

    pub fn insert_scholarship(&mut self, scholarship: Scholarship) {
        self.scholarships.insert(scholarship.id, scholarship);
    }

    /// replaces any earlier assignment; one active scholarship per student per cohort
    pub fn assign_scholarship(&mut self, student_id: StudentId, cohort_id: CohortId, scholarship_id: ScholarshipId) {
        self.assignments.insert((student_id, cohort_id), scholarship_id);
    }

    pub fn record_transaction(&mut self, cohort_id: CohortId, transaction: PaymentTransaction) {
        self.transactions
            .entry((transaction.student_id, cohort_id))
            .or_default()
            .push(transaction);
    }

    pub fn save_schedule_override(&mut self, student_id: StudentId, cohort_id: CohortId, plan: PaymentPlan, json: Value) {
        self.overrides.insert((student_id, cohort_id, plan), json);
    }
}

impl FeeRepository for InMemoryFeeRepository {
    fn fee_structure(&self, cohort_id: CohortId) -> Result<Option<FeeStructureRecord>> {
        Ok(self.fee_structures.get(&cohort_id).cloned())
    }

    fn scholarship(&self, scholarship_id: ScholarshipId) -> Result<Option<Scholarship>> {
        Ok(self.scholarships.get(&scholarship_id).cloned())
    }

    fn student_scholarship(&self, student_id: StudentId, cohort_id: CohortId) -> Result<Option<Scholarship>> {
        Ok(self
            .assignments
            .get(&(student_id, cohort_id))
            .and_then(|id| self.scholarships.get(id))
            .cloned())
    }

    fn transactions(&self, student_id: StudentId, cohort_id: CohortId) -> Result<Vec<PaymentTransaction>> {
        Ok(self
            .transactions
            .get(&(student_id, cohort_id))
            .cloned()
            .unwrap_or_default())
    }

    fn schedule_override(
        &self,
        student_id: StudentId,
        cohort_id: CohortId,
        plan: PaymentPlan,
    ) -> Result<Option<Value>> {
        Ok(self.overrides.get(&(student_id, cohort_id, plan)).cloned())
    }
}

/// loads and normalizes cohort fee structures
pub struct FeeStructureResolver<'a, R: FeeRepository> {
    repository: &'a R,
}

impl<'a, R: FeeRepository> FeeStructureResolver<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    /// fetch the cohort's fee structure and convert it to canonical form
    pub fn resolve(&self, cohort_id: CohortId, events: &mut EventStore) -> Result<FeeStructure> {
        let record = self
            .repository
            .fee_structure(cohort_id)?
            .ok_or_else(|| {
                FeeError::configuration(format!("no fee structure for cohort {}", cohort_id))
            })?;

        let structure = normalize(&record)?;

        info!(
            cohort_id = %cohort_id,
            total_program_fee = %structure.total_program_fee,
            admission_fee = %structure.admission_fee,
            version = structure.version,
            "resolved fee structure"
        );
        events.emit(Event::FeeStructureResolved {
            cohort_id,
            total_program_fee: structure.total_program_fee,
            admission_fee: structure.admission_fee,
            version: structure.version,
        });

        Ok(structure)
    }
}

/// type coercion and defaulting of a stored row
pub fn normalize(record: &FeeStructureRecord) -> Result<FeeStructure> {
    if !record.is_setup_complete {
        return Err(FeeError::configuration(format!(
            "fee setup incomplete for cohort {}",
            record.cohort_id
        )));
    }

    let total_program_fee = parse_money("total_program_fee", record.total_program_fee.as_deref())?
        .ok_or_else(|| FeeError::configuration("total_program_fee is missing"))?;
    let admission_fee =
        parse_money("admission_fee", record.admission_fee.as_deref())?.unwrap_or(Money::ZERO);

    let number_of_semesters = parse_count("number_of_semesters", record.number_of_semesters)?;
    let installments_per_semester =
        parse_count("instalments_per_semester", record.instalments_per_semester)?;

    let one_shot_discount = parse_percentage(
        "one_shot_discount_percentage",
        record.one_shot_discount_percentage.as_deref(),
    )?
    .unwrap_or(Decimal::ZERO);
    let gst = parse_percentage("gst_percentage", record.gst_percentage.as_deref())?
        .unwrap_or(DEFAULT_GST_PERCENTAGE);

    let structure = FeeStructure {
        cohort_id: record.cohort_id,
        total_program_fee,
        admission_fee,
        number_of_semesters,
        installments_per_semester,
        one_shot_discount: Rate::from_percentage(one_shot_discount),
        gst: Rate::from_percentage(gst),
        program_fee_includes_gst: record.program_fee_includes_gst.unwrap_or(true),
        equal_scholarship_distribution: record.equal_scholarship_distribution.unwrap_or(false),
        version: record.version.unwrap_or(1),
    };
    structure.validate()?;
    Ok(structure)
}

fn parse_money(field: &str, raw: Option<&str>) -> Result<Option<Money>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => Money::from_str_exact(text).map(Some).map_err(|e| {
            FeeError::configuration(format!("{} is not a valid amount '{}': {}", field, text, e))
        }),
    }
}

fn parse_percentage(field: &str, raw: Option<&str>) -> Result<Option<Decimal>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => Decimal::from_str(text).map(Some).map_err(|e| {
            FeeError::configuration(format!("{} is not a valid percentage '{}': {}", field, text, e))
        }),
    }
}

fn parse_count(field: &str, raw: Option<i64>) -> Result<u32> {
    let value = raw.ok_or_else(|| FeeError::configuration(format!("{} is missing", field)))?;
    if value < 1 {
        return Err(FeeError::configuration(format!("{} must be at least 1, got {}", field, value)));
    }
    u32::try_from(value)
        .map_err(|_| FeeError::configuration(format!("{} is too large: {}", field, value)))
}
