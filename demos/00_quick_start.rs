/// quick start - one-shot breakdown for a single student
use chrono::{TimeZone, Utc};
use cohort_fees_rs::{
    BreakdownRequest, FeeScheduleService, FeeStructureRecord, InMemoryFeeRepository, PaymentPlan,
    SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    ));

    // a cohort priced at 1,18,000 including 18% GST, 5% off for paying upfront
    let cohort_id = Uuid::new_v4();
    let mut repo = InMemoryFeeRepository::new();
    repo.insert_fee_structure(FeeStructureRecord {
        cohort_id,
        total_program_fee: Some("118000".to_string()),
        number_of_semesters: Some(4),
        instalments_per_semester: Some(3),
        one_shot_discount_percentage: Some("5".to_string()),
        is_setup_complete: true,
        ..Default::default()
    });

    let mut service = FeeScheduleService::new(&repo, &time);
    let request = BreakdownRequest::new(Uuid::new_v4(), cohort_id, PaymentPlan::OneShot);
    let breakdown = service.compute_breakdown(&request)?;

    let summary = &breakdown.overall_summary;
    println!("payable: {}", summary.total_amount_payable.format_inr(0));
    println!("discount: {}", summary.total_discount.format_inr(0));
    println!("gst: {}", summary.total_gst.format_inr(0));
    println!("\n{}", breakdown.to_json_pretty()?);

    Ok(())
}
