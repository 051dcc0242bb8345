use serde::{Deserialize, Serialize};

use crate::types::PaymentPlan;

use super::{ItemBreakdown, PaymentBreakdown};

/// dashboard summary, e.g. "3 of 12 installments complete"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentCounts {
    pub total: u32,
    /// paid plus scholarship covered
    pub completed: u32,
    /// reduced to nothing by scholarship or discount
    pub scholarship_covered: u32,
    /// settled by payments
    pub paid: u32,
}

impl InstallmentCounts {
    /// counts shown when no breakdown is available
    pub fn plan_default(plan: PaymentPlan) -> Self {
        Self {
            total: plan.default_installment_count(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.completed)
    }
}

/// count plan items by completion; the admission fee is not an installment
pub fn count_installments(breakdown: &PaymentBreakdown) -> InstallmentCounts {
    let leaves = breakdown.leaf_items();

    let scholarship_covered = leaves.iter().filter(|i| is_covered(i)).count() as u32;
    let paid = leaves
        .iter()
        .filter(|i| !is_covered(i) && i.is_settled())
        .count() as u32;

    InstallmentCounts {
        total: leaves.len() as u32,
        completed: paid + scholarship_covered,
        scholarship_covered,
        paid,
    }
}

/// waived by a scholarship or discount, not merely a zero-sized share
fn is_covered(item: &ItemBreakdown) -> bool {
    item.is_fully_waived() && (item.scholarship_amount + item.discount_amount).is_positive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::{Adjustments, BreakdownCalculator};
    use crate::config::FeeStructure;
    use crate::decimal::{Money, Rate};
    use crate::schedule::ScheduleGenerator;
    use crate::transactions::{PaymentMethod, PaymentTransaction, TransactionStatus};
    use crate::types::ItemKey;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_counts_paid_and_covered() {
        let structure = FeeStructure::builder()
            .total_program_fee(Money::from_major(120_000))
            .semesters(4)
            .installments_per_semester(3)
            .program_fee_includes_gst(false)
            .gst_percentage(dec!(0))
            .equal_scholarship_distribution(true)
            .build()
            .unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let schedule = ScheduleGenerator::default()
            .generate(&structure, PaymentPlan::InstalmentWise, start, None)
            .unwrap();

        let transactions: Vec<PaymentTransaction> = (1..=3)
            .map(|installment| PaymentTransaction {
                id: Uuid::new_v4(),
                student_id: Uuid::nil(),
                target: ItemKey::Installment { semester: 1, installment },
                amount: Money::from_major(10_000),
                payment_method: PaymentMethod::Cash,
                reference_number: None,
                status: TransactionStatus::Approved,
                payment_date: start,
            })
            .collect();

        let breakdown = BreakdownCalculator::for_structure(&structure)
            .compute_breakdown(&schedule, &Adjustments::none(), &transactions, start)
            .unwrap();
        let counts = count_installments(&breakdown);
        assert_eq!(counts, InstallmentCounts { total: 12, completed: 3, scholarship_covered: 0, paid: 3 });
        assert_eq!(counts.remaining(), 9);

        let waived = BreakdownCalculator::for_structure(&structure)
            .compute_breakdown(
                &schedule,
                &Adjustments::none().with_scholarship(Rate::from_percentage(dec!(100))),
                &[],
                start,
            )
            .unwrap();
        let counts = count_installments(&waived);
        assert_eq!(counts.scholarship_covered, 12);
        assert_eq!(counts.completed, 12);
        assert_eq!(counts.paid, 0);
    }

    #[test]
    fn test_zero_base_items_are_not_scholarship_covered() {
        // 10 over 20 installments leaves most items with a zero base
        let structure = FeeStructure::builder()
            .total_program_fee(Money::from_major(10))
            .semesters(4)
            .installments_per_semester(5)
            .program_fee_includes_gst(false)
            .build()
            .unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let schedule = ScheduleGenerator::default()
            .generate(&structure, PaymentPlan::InstalmentWise, start, None)
            .unwrap();
        let breakdown = BreakdownCalculator::for_structure(&structure)
            .compute_breakdown(&schedule, &Adjustments::none(), &[], start)
            .unwrap();

        assert!(breakdown.leaf_items().iter().any(|i| i.amount_payable.is_zero()));
        let counts = count_installments(&breakdown);
        assert_eq!(counts.scholarship_covered, 0);
        assert_eq!(counts.total, 20);
    }

    #[test]
    fn test_plan_defaults() {
        assert_eq!(InstallmentCounts::plan_default(PaymentPlan::SemWise).total, 4);
        assert_eq!(InstallmentCounts::plan_default(PaymentPlan::InstalmentWise).completed, 0);
    }
}
