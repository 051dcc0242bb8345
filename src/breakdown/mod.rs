pub mod calculator;
pub mod installments;
pub mod reconciliation;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{ItemKey, PaymentPlan, PaymentStatus};

pub use calculator::{Adjustments, BreakdownCalculator};
pub use installments::{count_installments, InstallmentCounts};
pub use reconciliation::ReconciliationIssue;

/// fully adjusted and reconciled schedule item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBreakdown {
    pub key: ItemKey,
    pub due_date: NaiveDate,
    /// scheduled amount as configured, GST included when the fee includes it
    pub gross_amount: Money,
    /// amount before GST
    pub base_amount: Money,
    pub gst_amount: Money,
    pub discount_amount: Money,
    pub scholarship_amount: Money,
    pub amount_payable: Money,
    pub amount_paid: Money,
    pub amount_pending: Money,
    pub status: PaymentStatus,
}

impl ItemBreakdown {
    /// discount and scholarship cover the whole base
    pub fn is_fully_waived(&self) -> bool {
        self.amount_payable.is_zero()
    }

    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    /// base left after discount and scholarship, before GST
    pub fn net_base(&self) -> Money {
        self.base_amount.saturating_sub(self.discount_amount + self.scholarship_amount)
    }
}

/// items of one semester; a single item for semester-wise plans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterBreakdown {
    pub semester_number: u32,
    pub instalments: Vec<ItemBreakdown>,
    pub total_payable: Money,
    pub total_paid: Money,
}

impl SemesterBreakdown {
    pub(crate) fn new(semester_number: u32, instalments: Vec<ItemBreakdown>) -> Self {
        let total_payable = instalments.iter().map(|i| i.amount_payable).sum();
        let total_paid = instalments.iter().map(|i| i.amount_paid).sum();
        Self {
            semester_number,
            instalments,
            total_payable,
            total_paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub total_program_fee: Money,
    pub admission_fee: Money,
    pub total_base_amount: Money,
    #[serde(rename = "totalGST")]
    pub total_gst: Money,
    pub total_discount: Money,
    pub total_scholarship: Money,
    pub total_amount_payable: Money,
    pub total_amount_paid: Money,
    pub total_amount_pending: Money,
}

/// computed payment breakdown for one student and plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub payment_plan: PaymentPlan,
    pub admission_fee: ItemBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_shot_payment: Option<ItemBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub semesters: Vec<SemesterBreakdown>,
    pub overall_summary: OverallSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ReconciliationIssue>,
}

impl PaymentBreakdown {
    /// plan items in schedule order, admission excluded
    pub fn leaf_items(&self) -> Vec<&ItemBreakdown> {
        match &self.one_shot_payment {
            Some(item) => vec![item],
            None => self.semesters.iter().flat_map(|s| s.instalments.iter()).collect(),
        }
    }

    /// admission first, then plan items
    pub fn all_items(&self) -> Vec<&ItemBreakdown> {
        let mut items = vec![&self.admission_fee];
        items.extend(self.leaf_items());
        items
    }

    pub fn item(&self, key: &ItemKey) -> Option<&ItemBreakdown> {
        self.all_items().into_iter().find(|i| i.key == *key)
    }

    /// earliest item that still has money pending
    pub fn next_due(&self) -> Option<&ItemBreakdown> {
        self.all_items()
            .into_iter()
            .filter(|i| !i.is_settled())
            .min_by_key(|i| (i.due_date, i.key))
    }

    pub fn is_fully_paid(&self) -> bool {
        self.all_items().iter().all(|i| i.is_settled())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
