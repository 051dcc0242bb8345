pub mod generator;
pub mod overrides;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{ItemKey, PaymentPlan};

pub use generator::ScheduleGenerator;
pub use overrides::{
    from_plan_specific_json, to_plan_specific_json, FlatScheduleDates, InstallmentOverride,
    OneShotOverride, ScheduleDateOverride, SemesterOverride,
};

/// one payable item before GST, discount and scholarship adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub key: ItemKey,
    pub due_date: NaiveDate,
    /// computed from the start date and cadence, before any override
    pub default_due_date: NaiveDate,
    pub base_amount: Money,
}

impl ScheduleItem {
    pub fn new(key: ItemKey, due_date: NaiveDate, base_amount: Money) -> Self {
        Self {
            key,
            due_date,
            default_due_date: due_date,
            base_amount,
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.due_date != self.default_due_date
    }
}

/// ordered schedule for one plan, leaf items only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub plan: PaymentPlan,
    pub start_date: NaiveDate,
    /// always-due admission fee, outside the plan's items
    pub admission: ScheduleItem,
    pub items: Vec<ScheduleItem>,
}

impl PaymentSchedule {
    /// sum of leaf base amounts, admission excluded
    pub fn total_base(&self) -> Money {
        self.items.iter().map(|i| i.base_amount).sum()
    }

    pub fn item(&self, key: &ItemKey) -> Option<&ScheduleItem> {
        if *key == ItemKey::Admission {
            return Some(&self.admission);
        }
        self.items.iter().find(|i| i.key == *key)
    }

    /// items of one semester, in order
    pub fn semester_items(&self, semester: u32) -> impl Iterator<Item = &ScheduleItem> {
        self.items
            .iter()
            .filter(move |i| i.key.semester() == Some(semester))
    }
}
