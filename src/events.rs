use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{CohortId, ItemKey, PaymentPlan, StudentId, TransactionId};

/// all events that can be emitted while resolving, scheduling and reconciling fees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // configuration events
    FeeStructureResolved {
        cohort_id: CohortId,
        total_program_fee: Money,
        admission_fee: Money,
        version: u32,
    },

    // schedule events
    ScheduleGenerated {
        plan: PaymentPlan,
        item_count: usize,
        schedulable_amount: Money,
        timestamp: DateTime<Utc>,
    },
    DueDateOverridden {
        item: ItemKey,
        default_date: NaiveDate,
        override_date: NaiveDate,
    },

    // breakdown events
    BreakdownComputed {
        student_id: StudentId,
        cohort_id: CohortId,
        plan: PaymentPlan,
        scholarship: Rate,
        total_payable: Money,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
    OverpaymentClamped {
        item: ItemKey,
        amount_payable: Money,
        amount_paid: Money,
    },
    UnmatchedTransaction {
        transaction_id: TransactionId,
        target: ItemKey,
        amount: Money,
    },

    // dashboard events
    InstallmentCountFallback {
        student_id: StudentId,
        plan: PaymentPlan,
        reason: String,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
