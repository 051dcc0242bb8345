/// plans - compare one-shot, semester-wise and installment-wise totals
use chrono::{NaiveDate, TimeZone, Utc};
use cohort_fees_rs::{
    BreakdownRequest, FeeScheduleService, FeeStructureRecord, InMemoryFeeRepository, ItemKey,
    Money, PaymentMethod, PaymentPlan, PaymentTransaction, SafeTimeProvider, Scholarship,
    TimeSource, TransactionStatus, Uuid,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== payment plans ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 9, 15, 0, 0, 0).unwrap()
    ));
    let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

    let cohort_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();
    let mut repo = InMemoryFeeRepository::new();
    repo.insert_fee_structure(FeeStructureRecord {
        cohort_id,
        total_program_fee: Some("120000".to_string()),
        admission_fee: Some("5000".to_string()),
        number_of_semesters: Some(2),
        instalments_per_semester: Some(3),
        one_shot_discount_percentage: Some("5".to_string()),
        program_fee_includes_gst: Some(false),
        equal_scholarship_distribution: Some(true),
        is_setup_complete: true,
        ..Default::default()
    });

    // 10% merit scholarship for scores between 80 and 100
    let merit = Scholarship::new(Uuid::new_v4(), cohort_id, "merit", dec!(10))
        .with_band(Some(dec!(80)), Some(dec!(100)));
    repo.assign_scholarship(student_id, cohort_id, merit.id);
    repo.insert_scholarship(merit);

    // admission fee paid, first installment partly paid
    for (target, amount) in [
        (ItemKey::Admission, Money::from_major(5_000)),
        (ItemKey::Installment { semester: 1, installment: 1 }, Money::from_major(10_000)),
    ] {
        repo.record_transaction(cohort_id, PaymentTransaction {
            id: Uuid::new_v4(),
            student_id,
            target,
            amount,
            payment_method: PaymentMethod::Upi,
            reference_number: None,
            status: TransactionStatus::Approved,
            payment_date: start,
        });
    }

    let mut service = FeeScheduleService::new(&repo, &time);
    for plan in [PaymentPlan::OneShot, PaymentPlan::SemWise, PaymentPlan::InstalmentWise] {
        let request = BreakdownRequest::new(student_id, cohort_id, plan).with_start_date(start);
        let breakdown = service.compute_breakdown(&request)?;
        let summary = &breakdown.overall_summary;

        println!("{}:", plan);
        println!("  payable:     {}", summary.total_amount_payable.format_inr(2));
        println!("  scholarship: {}", summary.total_scholarship.format_inr(2));
        println!("  pending:     {}", summary.total_amount_pending.format_inr(2));
        for item in breakdown.leaf_items() {
            println!(
                "    {:<28} due {}  {:>12}  {:?}",
                item.key.to_string(),
                item.due_date,
                item.amount_payable.format_inr(2),
                item.status
            );
        }

        let counts = service.installment_counts(&request);
        println!("  {} of {} complete\n", counts.completed, counts.total);
    }

    Ok(())
}
