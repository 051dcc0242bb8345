use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::types::{ItemKey, StudentId, TransactionId};

/// how a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Upi,
    Cheque,
    Card,
    Razorpay,
    ScholarshipAdjustment,
}

/// verification state of a recorded payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// awaiting admin verification
    Pending,
    /// verified, counts toward the item
    Approved,
    Rejected,
}

/// immutable record of money received against one schedule item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: TransactionId,
    pub student_id: StudentId,
    pub target: ItemKey,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub status: TransactionStatus,
    pub payment_date: NaiveDate,
}

impl PaymentTransaction {
    pub fn counts_toward_balance(&self) -> bool {
        self.status == TransactionStatus::Approved && self.amount.is_positive()
    }
}

/// approved amounts summed per target item
pub fn paid_by_item(transactions: &[PaymentTransaction]) -> BTreeMap<ItemKey, Money> {
    let mut totals: BTreeMap<ItemKey, Money> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.counts_toward_balance()) {
        *totals.entry(tx.target).or_insert(Money::ZERO) += tx.amount;
    }
    totals
}
