use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::decimal::Money;
use crate::errors::FeeError;
use crate::transactions::{paid_by_item, PaymentTransaction};
use crate::types::{ItemKey, PaymentStatus, TransactionId};

use super::ItemBreakdown;

/// mismatch found while matching payments to items. reported, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciliationIssue {
    /// approved payments exceed the payable amount; pending clamped to zero
    Overpaid {
        item: ItemKey,
        amount_payable: Money,
        amount_paid: Money,
    },
    /// approved payment targets an item the plan does not have
    Unmatched {
        transaction_id: TransactionId,
        target: ItemKey,
        amount: Money,
    },
}

/// fill paid, pending and status on every item from approved transactions
pub fn reconcile(
    items: &mut [ItemBreakdown],
    transactions: &[PaymentTransaction],
    today: NaiveDate,
) -> Vec<ReconciliationIssue> {
    let paid = paid_by_item(transactions);
    let mut issues = Vec::new();

    for item in items.iter_mut() {
        let amount_paid = paid.get(&item.key).copied().unwrap_or(Money::ZERO);
        item.amount_paid = amount_paid;
        item.amount_pending = item.amount_payable.saturating_sub(amount_paid);
        item.status = derive_status(item.amount_payable, amount_paid, item.due_date, today);

        if amount_paid > item.amount_payable {
            let error = FeeError::InconsistentState {
                item: item.key,
                payable: item.amount_payable,
                paid: amount_paid,
            };
            warn!(item = %item.key, "{}; pending clamped to zero", error);
            issues.push(ReconciliationIssue::Overpaid {
                item: item.key,
                amount_payable: item.amount_payable,
                amount_paid,
            });
        }
    }

    let known: BTreeSet<ItemKey> = items.iter().map(|i| i.key).collect();
    for tx in transactions
        .iter()
        .filter(|tx| tx.counts_toward_balance() && !known.contains(&tx.target))
    {
        warn!(
            transaction_id = %tx.id,
            target = %tx.target,
            amount = %tx.amount,
            "payment targets an item outside the schedule; ignored"
        );
        issues.push(ReconciliationIssue::Unmatched {
            transaction_id: tx.id,
            target: tx.target,
            amount: tx.amount,
        });
    }

    issues
}

/// paid wins over partial, partial wins over overdue
pub fn derive_status(
    amount_payable: Money,
    amount_paid: Money,
    due_date: NaiveDate,
    today: NaiveDate,
) -> PaymentStatus {
    if amount_paid >= amount_payable {
        PaymentStatus::Paid
    } else if amount_paid.is_positive() {
        PaymentStatus::PartiallyPaid
    } else if due_date < today {
        PaymentStatus::Overdue
    } else {
        PaymentStatus::Pending
    }
}
