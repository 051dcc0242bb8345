use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::breakdown::{
    count_installments, Adjustments, BreakdownCalculator, InstallmentCounts, PaymentBreakdown,
    ReconciliationIssue,
};
use crate::config::{FeeStructure, SchedulePolicy};
use crate::decimal::Rate;
use crate::errors::{FeeError, Result};
use crate::events::{Event, EventStore};
use crate::resolver::{FeeRepository, FeeStructureResolver};
use crate::schedule::{PaymentSchedule, ScheduleDateOverride, ScheduleGenerator};
use crate::scholarship::Scholarship;
use crate::types::{CohortId, PaymentPlan, ScholarshipId, StudentId};

/// breakdown request as sent by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    pub student_id: StudentId,
    pub cohort_id: CohortId,
    pub payment_plan: PaymentPlan,
    #[serde(default)]
    pub scholarship_id: Option<ScholarshipId>,
    #[serde(default)]
    pub additional_discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl BreakdownRequest {
    pub fn new(student_id: StudentId, cohort_id: CohortId, payment_plan: PaymentPlan) -> Self {
        Self {
            student_id,
            cohort_id,
            payment_plan,
            scholarship_id: None,
            additional_discount_percentage: None,
            start_date: None,
        }
    }

    pub fn with_scholarship(mut self, scholarship_id: ScholarshipId) -> Self {
        self.scholarship_id = Some(scholarship_id);
        self
    }

    pub fn with_additional_discount(mut self, percentage: Decimal) -> Self {
        self.additional_discount_percentage = Some(percentage);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }
}

/// end-to-end fee flow: resolve, schedule, adjust and reconcile.
///
/// nothing is cached between calls; every breakdown re-reads the fee structure
/// and the transactions from the repository.
pub struct FeeScheduleService<'a, R: FeeRepository> {
    repository: &'a R,
    time: &'a SafeTimeProvider,
    generator: ScheduleGenerator,
    events: EventStore,
}

impl<'a, R: FeeRepository> FeeScheduleService<'a, R> {
    pub fn new(repository: &'a R, time: &'a SafeTimeProvider) -> Self {
        Self::with_policy(repository, time, SchedulePolicy::default())
    }

    pub fn with_policy(repository: &'a R, time: &'a SafeTimeProvider, policy: SchedulePolicy) -> Self {
        Self {
            repository,
            time,
            generator: ScheduleGenerator::new(policy),
            events: EventStore::new(),
        }
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    fn today(&self) -> NaiveDate {
        self.time.now().date_naive()
    }

    /// unadjusted schedule for the request, with persisted due-date overrides applied
    pub fn schedule(&mut self, request: &BreakdownRequest) -> Result<PaymentSchedule> {
        let structure = self.resolve(request)?;
        self.generate_schedule(&structure, request)
    }

    fn resolve(&mut self, request: &BreakdownRequest) -> Result<FeeStructure> {
        if !request.payment_plan.is_selected() {
            return Err(FeeError::InvalidPlan { plan: request.payment_plan });
        }
        FeeStructureResolver::new(self.repository).resolve(request.cohort_id, &mut self.events)
    }

    fn generate_schedule(&mut self, structure: &FeeStructure, request: &BreakdownRequest) -> Result<PaymentSchedule> {
        let overrides = self
            .repository
            .schedule_override(request.student_id, request.cohort_id, request.payment_plan)?
            .map(|json| ScheduleDateOverride::from_plan_json(request.payment_plan, &json))
            .transpose()?;

        let start_date = request.start_date.unwrap_or_else(|| self.today());
        let schedule = self
            .generator
            .generate(structure, request.payment_plan, start_date, overrides.as_ref())?;

        self.events.emit(Event::ScheduleGenerated {
            plan: schedule.plan,
            item_count: schedule.items.len(),
            schedulable_amount: structure.schedulable_amount(),
            timestamp: self.time.now(),
        });
        for item in schedule.items.iter().filter(|i| i.is_overridden()) {
            self.events.emit(Event::DueDateOverridden {
                item: item.key,
                default_date: item.default_due_date,
                override_date: item.due_date,
            });
        }

        Ok(schedule)
    }

    /// full breakdown for one student and plan
    pub fn compute_breakdown(&mut self, request: &BreakdownRequest) -> Result<PaymentBreakdown> {
        let structure = self.resolve(request)?;
        let schedule = self.generate_schedule(&structure, request)?;

        let scholarship = self.scholarship_for(request)?;
        let mut adjustments = Adjustments::none().with_one_shot_discount(structure.one_shot_discount);
        if let Some(scholarship) = &scholarship {
            adjustments = adjustments.with_scholarship(scholarship.amount);
        }
        if let Some(percentage) = request.additional_discount_percentage {
            adjustments = adjustments.with_additional_discount(Rate::from_percentage(percentage));
        }

        let transactions = self.repository.transactions(request.student_id, request.cohort_id)?;
        let breakdown = BreakdownCalculator::for_structure(&structure).compute_breakdown(
            &schedule,
            &adjustments,
            &transactions,
            self.today(),
        )?;

        for issue in &breakdown.issues {
            self.events.emit(match issue {
                ReconciliationIssue::Overpaid { item, amount_payable, amount_paid } => {
                    Event::OverpaymentClamped {
                        item: *item,
                        amount_payable: *amount_payable,
                        amount_paid: *amount_paid,
                    }
                }
                ReconciliationIssue::Unmatched { transaction_id, target, amount } => {
                    Event::UnmatchedTransaction {
                        transaction_id: *transaction_id,
                        target: *target,
                        amount: *amount,
                    }
                }
            });
        }
        self.events.emit(Event::BreakdownComputed {
            student_id: request.student_id,
            cohort_id: request.cohort_id,
            plan: request.payment_plan,
            scholarship: adjustments.scholarship,
            total_payable: breakdown.overall_summary.total_amount_payable,
            total_paid: breakdown.overall_summary.total_amount_paid,
            timestamp: self.time.now(),
        });

        Ok(breakdown)
    }

    /// installment progress; falls back to plan defaults when the breakdown fails
    pub fn installment_counts(&mut self, request: &BreakdownRequest) -> InstallmentCounts {
        match self.compute_breakdown(request) {
            Ok(breakdown) => count_installments(&breakdown),
            Err(error) => {
                warn!(
                    student_id = %request.student_id,
                    plan = %request.payment_plan,
                    error = %error,
                    "breakdown unavailable, showing plan defaults"
                );
                self.events.emit(Event::InstallmentCountFallback {
                    student_id: request.student_id,
                    plan: request.payment_plan,
                    reason: error.to_string(),
                });
                InstallmentCounts::plan_default(request.payment_plan)
            }
        }
    }

    fn scholarship_for(&self, request: &BreakdownRequest) -> Result<Option<Scholarship>> {
        let scholarship = match request.scholarship_id {
            Some(id) => Some(
                self.repository
                    .scholarship(id)?
                    .ok_or(FeeError::ScholarshipNotFound { id })?,
            ),
            None => self
                .repository
                .student_scholarship(request.student_id, request.cohort_id)?,
        };

        if let Some(s) = &scholarship {
            s.validate()?;
            if s.cohort_id != request.cohort_id {
                return Err(FeeError::configuration(format!(
                    "scholarship '{}' belongs to another cohort",
                    s.name
                )));
            }
        }
        Ok(scholarship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeeStructureRecord;
    use crate::decimal::Money;
    use crate::resolver::InMemoryFeeRepository;
    use crate::transactions::{PaymentMethod, PaymentTransaction, TransactionStatus};
    use crate::types::{ItemKey, PaymentStatus};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use uuid::Uuid;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()))
    }

    fn repository(cohort_id: CohortId) -> InMemoryFeeRepository {
        let mut repo = InMemoryFeeRepository::new();
        repo.insert_fee_structure(FeeStructureRecord {
            cohort_id,
            total_program_fee: Some("118000".to_string()),
            admission_fee: Some("0".to_string()),
            number_of_semesters: Some(2),
            instalments_per_semester: Some(3),
            one_shot_discount_percentage: Some("5".to_string()),
            gst_percentage: Some("18".to_string()),
            program_fee_includes_gst: Some(true),
            equal_scholarship_distribution: Some(false),
            is_setup_complete: true,
            version: Some(2),
        });
        repo
    }

    #[test]
    fn test_one_shot_breakdown_through_service() {
        let cohort_id = Uuid::new_v4();
        let repo = repository(cohort_id);
        let time = time();
        let mut service = FeeScheduleService::new(&repo, &time);

        let request = BreakdownRequest::new(Uuid::new_v4(), cohort_id, PaymentPlan::OneShot);
        let breakdown = service.compute_breakdown(&request).unwrap();

        let one_shot = breakdown.one_shot_payment.as_ref().unwrap();
        assert_eq!(one_shot.discount_amount, Money::from_major(5_000));
        assert_eq!(one_shot.amount_payable, Money::from_major(112_100));
        assert_eq!(one_shot.due_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let events = service.take_events();
        assert!(matches!(events[0], Event::FeeStructureResolved { version: 2, .. }));
        assert!(matches!(events[1], Event::ScheduleGenerated { item_count: 1, .. }));
        assert!(matches!(events.last(), Some(Event::BreakdownComputed { .. })));
        assert!(service.events().is_empty());
    }

    #[test]
    fn test_not_selected_plan_rejected() {
        let cohort_id = Uuid::new_v4();
        let repo = repository(cohort_id);
        let time = time();
        let mut service = FeeScheduleService::new(&repo, &time);

        let request = BreakdownRequest::new(Uuid::new_v4(), cohort_id, PaymentPlan::NotSelected);
        assert_eq!(
            service.compute_breakdown(&request),
            Err(FeeError::InvalidPlan { plan: PaymentPlan::NotSelected })
        );
    }

    #[test]
    fn test_unknown_scholarship_id() {
        let cohort_id = Uuid::new_v4();
        let repo = repository(cohort_id);
        let time = time();
        let mut service = FeeScheduleService::new(&repo, &time);

        let missing = Uuid::new_v4();
        let request = BreakdownRequest::new(Uuid::new_v4(), cohort_id, PaymentPlan::SemWise)
            .with_scholarship(missing);
        assert_eq!(
            service.compute_breakdown(&request),
            Err(FeeError::ScholarshipNotFound { id: missing })
        );
    }

    #[test]
    fn test_assigned_scholarship_used_by_default() {
        let cohort_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let mut repo = repository(cohort_id);
        let scholarship = Scholarship::new(Uuid::new_v4(), cohort_id, "merit", dec!(10));
        repo.assign_scholarship(student_id, cohort_id, scholarship.id);
        repo.insert_scholarship(scholarship);
        let time = time();
        let mut service = FeeScheduleService::new(&repo, &time);

        let breakdown = service
            .compute_breakdown(&BreakdownRequest::new(student_id, cohort_id, PaymentPlan::SemWise))
            .unwrap();
        // 10% of the 118000 program fee
        assert_eq!(breakdown.overall_summary.total_scholarship, Money::from_major(11_800));
    }

    #[test]
    fn test_override_applied_and_reported() {
        let cohort_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let mut repo = repository(cohort_id);
        repo.save_schedule_override(
            student_id,
            cohort_id,
            PaymentPlan::SemWise,
            json!({ "semesters": { "semester_2": { "due_date": "2024-10-15" } } }),
        );
        let time = time();
        let mut service = FeeScheduleService::new(&repo, &time);

        let request = BreakdownRequest::new(student_id, cohort_id, PaymentPlan::SemWise)
            .with_start_date(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        let schedule = service.schedule(&request).unwrap();
        let second = schedule.item(&ItemKey::Semester { semester: 2 }).unwrap();
        assert_eq!(second.due_date, NaiveDate::from_ymd_opt(2024, 10, 15).unwrap());
        assert_eq!(second.default_due_date, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());

        assert!(service.events().iter().any(|e| matches!(
            e,
            Event::DueDateOverridden { item: ItemKey::Semester { semester: 2 }, .. }
        )));
    }

    #[test]
    fn test_transactions_read_fresh() {
        let cohort_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let mut repo = repository(cohort_id);
        let time = time();
        let request = BreakdownRequest::new(student_id, cohort_id, PaymentPlan::OneShot);

        let before = FeeScheduleService::new(&repo, &time).compute_breakdown(&request).unwrap();
        assert_eq!(before.one_shot_payment.as_ref().unwrap().status, PaymentStatus::Pending);

        repo.record_transaction(
            cohort_id,
            PaymentTransaction {
                id: Uuid::new_v4(),
                student_id,
                target: ItemKey::OneShot,
                amount: Money::from_major(112_100),
                payment_method: PaymentMethod::BankTransfer,
                reference_number: Some("NEFT-001".to_string()),
                status: TransactionStatus::Approved,
                payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            },
        );
        let after = FeeScheduleService::new(&repo, &time).compute_breakdown(&request).unwrap();
        assert!(after.is_fully_paid());
    }

    #[test]
    fn test_installment_counts_fall_back_to_plan_defaults() {
        let repo = InMemoryFeeRepository::new();
        let time = time();
        let mut service = FeeScheduleService::new(&repo, &time);

        let request = BreakdownRequest::new(Uuid::new_v4(), Uuid::new_v4(), PaymentPlan::InstalmentWise);
        let counts = service.installment_counts(&request);
        assert_eq!(counts, InstallmentCounts::plan_default(PaymentPlan::InstalmentWise));
        assert_eq!(counts.total, 12);
        assert!(matches!(
            service.events().last(),
            Some(Event::InstallmentCountFallback { plan: PaymentPlan::InstalmentWise, .. })
        ));
    }

    #[test]
    fn test_request_json() {
        let request: BreakdownRequest = serde_json::from_value(json!({
            "studentId": "00000000-0000-0000-0000-000000000001",
            "cohortId": "00000000-0000-0000-0000-000000000002",
            "paymentPlan": "instalment_wise",
            "additionalDiscountPercentage": "2.5"
        }))
        .unwrap();
        assert_eq!(request.payment_plan, PaymentPlan::InstalmentWise);
        assert_eq!(request.additional_discount_percentage, Some(dec!(2.5)));
        assert_eq!(request.scholarship_id, None);
    }
}
