use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::FeeError;

/// unique identifier for a cohort
pub type CohortId = Uuid;

/// unique identifier for a student
pub type StudentId = Uuid;

/// unique identifier for a scholarship
pub type ScholarshipId = Uuid;

/// unique identifier for a recorded payment
pub type TransactionId = Uuid;

/// payment plan chosen by a student for a cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPlan {
    /// whole program fee in a single payment
    OneShot,
    /// one payment per semester
    SemWise,
    /// several monthly installments per semester
    InstalmentWise,
    /// student has not picked a plan yet
    #[default]
    NotSelected,
}

impl PaymentPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPlan::OneShot => "one_shot",
            PaymentPlan::SemWise => "sem_wise",
            PaymentPlan::InstalmentWise => "instalment_wise",
            PaymentPlan::NotSelected => "not_selected",
        }
    }

    pub fn is_selected(&self) -> bool {
        !matches!(self, PaymentPlan::NotSelected)
    }

    /// installment count shown when a breakdown cannot be computed
    pub fn default_installment_count(&self) -> u32 {
        match self {
            PaymentPlan::OneShot => 1,
            PaymentPlan::SemWise => 4,
            PaymentPlan::InstalmentWise => 12,
            PaymentPlan::NotSelected => 0,
        }
    }
}

impl fmt::Display for PaymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentPlan {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_shot" => Ok(PaymentPlan::OneShot),
            "sem_wise" => Ok(PaymentPlan::SemWise),
            "instalment_wise" => Ok(PaymentPlan::InstalmentWise),
            "not_selected" | "" => Ok(PaymentPlan::NotSelected),
            other => Err(FeeError::Configuration {
                message: format!("unknown payment plan '{}'", other),
            }),
        }
    }
}

/// payment status of a scheduled item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    PartiallyPaid,
    Overdue,
}

/// identifies one payable item in a schedule.
///
/// the string form doubles as the flat UI key for due-date overrides:
/// `admission-fee`, `one-shot`, `semester-<N>` and `semester-<N>-instalment-<M>`.
/// semester and installment numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ItemKey {
    Admission,
    OneShot,
    Semester { semester: u32 },
    Installment { semester: u32, installment: u32 },
}

impl ItemKey {
    pub fn semester(&self) -> Option<u32> {
        match self {
            ItemKey::Semester { semester } | ItemKey::Installment { semester, .. } => {
                Some(*semester)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Admission => f.write_str("admission-fee"),
            ItemKey::OneShot => f.write_str("one-shot"),
            ItemKey::Semester { semester } => write!(f, "semester-{}", semester),
            ItemKey::Installment { semester, installment } => {
                write!(f, "semester-{}-instalment-{}", semester, installment)
            }
        }
    }
}

impl FromStr for ItemKey {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FeeError::InvalidOverrideKey { key: s.to_string() };

        match s {
            "admission-fee" => return Ok(ItemKey::Admission),
            "one-shot" => return Ok(ItemKey::OneShot),
            _ => {}
        }

        let rest = s.strip_prefix("semester-").ok_or_else(invalid)?;
        let (semester, installment) = match rest.split_once("-instalment-") {
            Some((sem, inst)) => (sem, Some(inst)),
            None => (rest, None),
        };

        let semester = parse_index(semester).ok_or_else(invalid)?;
        match installment {
            None => Ok(ItemKey::Semester { semester }),
            Some(inst) => {
                let installment = parse_index(inst).ok_or_else(invalid)?;
                Ok(ItemKey::Installment { semester, installment })
            }
        }
    }
}

/// 1-based index with no sign or padding
pub(crate) fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

impl TryFrom<String> for ItemKey {
    type Error = FeeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.to_string()
    }
}
