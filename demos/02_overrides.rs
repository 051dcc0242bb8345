/// overrides - move due dates and convert between flat and persisted forms
use chrono::{NaiveDate, TimeZone, Utc};
use cohort_fees_rs::{
    from_plan_specific_json, to_plan_specific_json, BreakdownRequest, FeeScheduleService,
    FeeStructureRecord, FlatScheduleDates, InMemoryFeeRepository, ItemKey, PaymentPlan,
    SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== due date overrides ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    ));

    // admin edits in the flat UI form
    let mut dates = FlatScheduleDates::new();
    dates.insert(
        ItemKey::Installment { semester: 1, installment: 2 },
        NaiveDate::from_ymd_opt(2024, 8, 20).unwrap(),
    );
    dates.insert(
        ItemKey::Installment { semester: 2, installment: 1 },
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
    );

    let json = to_plan_specific_json(&dates, PaymentPlan::InstalmentWise)?;
    println!("persisted form:\n{}\n", serde_json::to_string_pretty(&json)?);
    assert_eq!(from_plan_specific_json(&json, PaymentPlan::InstalmentWise)?, dates);

    let cohort_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let mut repo = InMemoryFeeRepository::new();
    repo.insert_fee_structure(FeeStructureRecord {
        cohort_id,
        total_program_fee: Some("150000".to_string()),
        number_of_semesters: Some(2),
        instalments_per_semester: Some(3),
        is_setup_complete: true,
        ..Default::default()
    });
    repo.save_schedule_override(student_id, cohort_id, PaymentPlan::InstalmentWise, json);

    let mut service = FeeScheduleService::new(&repo, &time);
    let request = BreakdownRequest::new(student_id, cohort_id, PaymentPlan::InstalmentWise);
    let schedule = service.schedule(&request)?;

    for item in &schedule.items {
        let marker = if item.is_overridden() { " (moved)" } else { "" };
        println!("{:<28} {}{}", item.key.to_string(), item.due_date, marker);
    }

    Ok(())
}
