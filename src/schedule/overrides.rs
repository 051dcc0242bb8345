//! admin-editable due dates.
//!
//! persisted json is plan-specific:
//!
//! - one-shot: `{ "program_fee_due_date": "YYYY-MM-DD" }`
//! - semester-wise: `{ "semesters": { "semester_<N>": { "due_date": "YYYY-MM-DD" } } }`
//! - installment-wise:
//!   `{ "semesters": { "semester_<N>": { "installments": { "installment_<M>": "YYYY-MM-DD" } } } }`
//!
//! the UI works with a flat map keyed by `ItemKey` strings (`one-shot`,
//! `semester-<N>`, `semester-<N>-instalment-<M>`). both forms convert through
//! `ScheduleDateOverride` without loss.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::{FeeError, Result};
use crate::types::{parse_index, ItemKey, PaymentPlan};

/// flat UI form of a due-date override
pub type FlatScheduleDates = BTreeMap<ItemKey, NaiveDate>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneShotOverride {
    pub program_fee_due_date: Option<NaiveDate>,
}

/// due date per semester number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemesterOverride {
    pub semesters: BTreeMap<u32, NaiveDate>,
}

/// due date per semester number, then installment number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallmentOverride {
    pub semesters: BTreeMap<u32, BTreeMap<u32, NaiveDate>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDateOverride {
    OneShot(OneShotOverride),
    Semester(SemesterOverride),
    Installment(InstallmentOverride),
}

impl ScheduleDateOverride {
    /// empty override for a plan
    pub fn empty(plan: PaymentPlan) -> Result<Self> {
        match plan {
            PaymentPlan::OneShot => Ok(ScheduleDateOverride::OneShot(OneShotOverride::default())),
            PaymentPlan::SemWise => Ok(ScheduleDateOverride::Semester(SemesterOverride::default())),
            PaymentPlan::InstalmentWise => {
                Ok(ScheduleDateOverride::Installment(InstallmentOverride::default()))
            }
            PaymentPlan::NotSelected => Err(FeeError::InvalidPlan { plan }),
        }
    }

    pub fn plan(&self) -> PaymentPlan {
        match self {
            ScheduleDateOverride::OneShot(_) => PaymentPlan::OneShot,
            ScheduleDateOverride::Semester(_) => PaymentPlan::SemWise,
            ScheduleDateOverride::Installment(_) => PaymentPlan::InstalmentWise,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ScheduleDateOverride::OneShot(o) => o.program_fee_due_date.is_none(),
            ScheduleDateOverride::Semester(o) => o.semesters.is_empty(),
            ScheduleDateOverride::Installment(o) => o.semesters.values().all(|m| m.is_empty()),
        }
    }

    /// overridden due date for an item, if any
    pub fn due_date_for(&self, key: &ItemKey) -> Option<NaiveDate> {
        match (self, key) {
            (ScheduleDateOverride::OneShot(o), ItemKey::OneShot) => o.program_fee_due_date,
            (ScheduleDateOverride::Semester(o), ItemKey::Semester { semester }) => {
                o.semesters.get(semester).copied()
            }
            (ScheduleDateOverride::Installment(o), ItemKey::Installment { semester, installment }) => o
                .semesters
                .get(semester)
                .and_then(|m| m.get(installment))
                .copied(),
            _ => None,
        }
    }

    /// set the due date of one item; the key must belong to this override's plan
    pub fn set(&mut self, key: ItemKey, date: NaiveDate) -> Result<()> {
        match (self, key) {
            (ScheduleDateOverride::OneShot(o), ItemKey::OneShot) => {
                o.program_fee_due_date = Some(date);
            }
            (ScheduleDateOverride::Semester(o), ItemKey::Semester { semester }) => {
                o.semesters.insert(semester, date);
            }
            (ScheduleDateOverride::Installment(o), ItemKey::Installment { semester, installment }) => {
                o.semesters.entry(semester).or_default().insert(installment, date);
            }
            (_, key) => {
                return Err(FeeError::InvalidOverrideKey { key: key.to_string() });
            }
        }
        Ok(())
    }

    /// build from the flat UI map
    pub fn from_flat(plan: PaymentPlan, dates: &FlatScheduleDates) -> Result<Self> {
        let mut result = Self::empty(plan)?;
        for (key, date) in dates {
            result.set(*key, *date)?;
        }
        Ok(result)
    }

    /// flatten to the UI map
    pub fn to_flat(&self) -> FlatScheduleDates {
        let mut flat = FlatScheduleDates::new();
        match self {
            ScheduleDateOverride::OneShot(o) => {
                if let Some(date) = o.program_fee_due_date {
                    flat.insert(ItemKey::OneShot, date);
                }
            }
            ScheduleDateOverride::Semester(o) => {
                for (semester, date) in &o.semesters {
                    flat.insert(ItemKey::Semester { semester: *semester }, *date);
                }
            }
            ScheduleDateOverride::Installment(o) => {
                for (semester, installments) in &o.semesters {
                    for (installment, date) in installments {
                        flat.insert(
                            ItemKey::Installment {
                                semester: *semester,
                                installment: *installment,
                            },
                            *date,
                        );
                    }
                }
            }
        }
        flat
    }

    /// parse the persisted plan-specific json. `null` yields an empty override.
    pub fn from_plan_json(plan: PaymentPlan, json: &Value) -> Result<Self> {
        let mut result = Self::empty(plan)?;
        if json.is_null() {
            return Ok(result);
        }

        match &mut result {
            ScheduleDateOverride::OneShot(o) => {
                o.program_fee_due_date = parse_view::<OneShotView>(json)?.program_fee_due_date;
            }
            ScheduleDateOverride::Semester(o) => {
                for (semester, entry) in parse_view::<SemestersView>(json)?.entries()? {
                    if let Some(date) = entry.due_date {
                        o.semesters.insert(semester, date);
                    }
                }
            }
            ScheduleDateOverride::Installment(o) => {
                for (semester, entry) in parse_view::<SemestersView>(json)?.entries()? {
                    for (key, date) in entry.installments.unwrap_or_default() {
                        let installment = prefixed_index(&key, "installment_")?;
                        if let Some(date) = date {
                            o.semesters.entry(semester).or_default().insert(installment, date);
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    /// serialize to the persisted plan-specific json
    pub fn to_plan_json(&self) -> Result<Value> {
        let value = match self {
            ScheduleDateOverride::OneShot(o) => serde_json::to_value(OneShotView {
                program_fee_due_date: o.program_fee_due_date,
            }),
            ScheduleDateOverride::Semester(o) => serde_json::to_value(SemestersView {
                semesters: Some(
                    o.semesters
                        .iter()
                        .map(|(semester, date)| {
                            let entry = SemesterEntryView {
                                due_date: Some(*date),
                                ..Default::default()
                            };
                            (format!("semester_{}", semester), Some(entry))
                        })
                        .collect(),
                ),
            }),
            ScheduleDateOverride::Installment(o) => serde_json::to_value(SemestersView {
                semesters: Some(
                    o.semesters
                        .iter()
                        .filter(|(_, m)| !m.is_empty())
                        .map(|(semester, installments)| {
                            let dates = installments
                                .iter()
                                .map(|(i, date)| (format!("installment_{}", i), Some(*date)))
                                .collect();
                            let entry = SemesterEntryView {
                                installments: Some(dates),
                                ..Default::default()
                            };
                            (format!("semester_{}", semester), Some(entry))
                        })
                        .collect(),
                ),
            }),
        };
        value.map_err(|e| FeeError::invalid_override(format!("cannot serialize override: {}", e)))
    }
}

/// flat UI dates to persisted json
pub fn to_plan_specific_json(dates: &FlatScheduleDates, plan: PaymentPlan) -> Result<Value> {
    ScheduleDateOverride::from_flat(plan, dates)?.to_plan_json()
}

/// persisted json to flat UI dates
pub fn from_plan_specific_json(json: &Value, plan: PaymentPlan) -> Result<FlatScheduleDates> {
    Ok(ScheduleDateOverride::from_plan_json(plan, json)?.to_flat())
}

/// persisted one-shot shape
#[derive(Debug, Default, Serialize, Deserialize)]
struct OneShotView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    program_fee_due_date: Option<NaiveDate>,
}

/// persisted shape shared by semester-wise and installment-wise overrides
#[derive(Debug, Default, Serialize, Deserialize)]
struct SemestersView {
    #[serde(default)]
    semesters: Option<BTreeMap<String, Option<SemesterEntryView>>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SemesterEntryView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    installments: Option<BTreeMap<String, Option<NaiveDate>>>,
}

impl SemestersView {
    /// non-null entries keyed by semester number
    fn entries(self) -> Result<Vec<(u32, SemesterEntryView)>> {
        let mut entries = Vec::new();
        for (key, entry) in self.semesters.unwrap_or_default() {
            let semester = prefixed_index(&key, "semester_")?;
            if let Some(entry) = entry {
                entries.push((semester, entry));
            }
        }
        Ok(entries)
    }
}

fn parse_view<'a, T: Deserialize<'a>>(json: &'a Value) -> Result<T> {
    T::deserialize(json).map_err(|e| FeeError::invalid_override(e.to_string()))
}

fn prefixed_index(key: &str, prefix: &str) -> Result<u32> {
    key.strip_prefix(prefix)
        .and_then(parse_index)
        .ok_or_else(|| FeeError::InvalidOverrideKey { key: key.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_one_shot_json_shape() {
        let flat = FlatScheduleDates::from([(ItemKey::OneShot, date(2024, 8, 1))]);
        let json = to_plan_specific_json(&flat, PaymentPlan::OneShot).unwrap();
        assert_eq!(json, json!({ "program_fee_due_date": "2024-08-01" }));
        assert_eq!(from_plan_specific_json(&json, PaymentPlan::OneShot).unwrap(), flat);
    }

    #[test]
    fn test_semester_json_shape() {
        let flat = FlatScheduleDates::from([
            (ItemKey::Semester { semester: 1 }, date(2024, 8, 1)),
            (ItemKey::Semester { semester: 3 }, date(2025, 8, 1)),
        ]);
        let json = to_plan_specific_json(&flat, PaymentPlan::SemWise).unwrap();
        assert_eq!(
            json,
            json!({ "semesters": {
                "semester_1": { "due_date": "2024-08-01" },
                "semester_3": { "due_date": "2025-08-01" }
            }})
        );
        assert_eq!(from_plan_specific_json(&json, PaymentPlan::SemWise).unwrap(), flat);
    }

    #[test]
    fn test_installment_round_trip_large_indices() {
        let flat = FlatScheduleDates::from([
            (ItemKey::Installment { semester: 1, installment: 1 }, date(2024, 1, 5)),
            (ItemKey::Installment { semester: 1, installment: 12 }, date(2024, 12, 5)),
            (ItemKey::Installment { semester: 10, installment: 3 }, date(2029, 3, 5)),
        ]);
        let json = to_plan_specific_json(&flat, PaymentPlan::InstalmentWise).unwrap();
        assert_eq!(json["semesters"]["semester_1"]["installments"]["installment_12"], "2024-12-05");
        assert_eq!(json["semesters"]["semester_10"]["installments"]["installment_3"], "2029-03-05");
        assert_eq!(from_plan_specific_json(&json, PaymentPlan::InstalmentWise).unwrap(), flat);
    }

    #[test]
    fn test_empty_round_trip() {
        for plan in [PaymentPlan::OneShot, PaymentPlan::SemWise, PaymentPlan::InstalmentWise] {
            let flat = FlatScheduleDates::new();
            let json = to_plan_specific_json(&flat, plan).unwrap();
            assert_eq!(from_plan_specific_json(&json, plan).unwrap(), flat);
        }
    }

    #[test]
    fn test_flat_map_serializes_with_ui_keys() {
        let flat = FlatScheduleDates::from([(
            ItemKey::Installment { semester: 2, installment: 3 },
            date(2024, 9, 1),
        )]);
        let json = serde_json::to_value(&flat).unwrap();
        assert_eq!(json, json!({ "semester-2-instalment-3": "2024-09-01" }));
        let back: FlatScheduleDates = serde_json::from_value(json).unwrap();
        assert_eq!(back, flat);
    }

    #[test]
    fn test_key_from_wrong_plan_rejected() {
        let flat = FlatScheduleDates::from([(ItemKey::Semester { semester: 1 }, date(2024, 1, 1))]);
        let result = to_plan_specific_json(&flat, PaymentPlan::OneShot);
        assert!(matches!(result, Err(FeeError::InvalidOverrideKey { .. })));
    }

    #[test]
    fn test_nulls_and_missing_entries_skipped() {
        let json = json!({ "semesters": {
            "semester_1": { "due_date": null },
            "semester_2": { "due_date": "2024-09-01" }
        }});
        let parsed = ScheduleDateOverride::from_plan_json(PaymentPlan::SemWise, &json).unwrap();
        assert_eq!(parsed.due_date_for(&ItemKey::Semester { semester: 1 }), None);
        assert_eq!(parsed.due_date_for(&ItemKey::Semester { semester: 2 }), Some(date(2024, 9, 1)));

        let parsed = ScheduleDateOverride::from_plan_json(PaymentPlan::InstalmentWise, &Value::Null).unwrap();
        assert!(parsed.is_empty());

        let json = json!({ "semesters": {
            "semester_1": null,
            "semester_2": { "installments": { "installment_1": null, "installment_2": "2024-10-01" } },
            "semester_3": { "installments": null }
        }});
        let parsed = ScheduleDateOverride::from_plan_json(PaymentPlan::InstalmentWise, &json).unwrap();
        assert_eq!(
            parsed.to_flat(),
            FlatScheduleDates::from([(
                ItemKey::Installment { semester: 2, installment: 2 },
                date(2024, 10, 1)
            )])
        );
    }

    #[test]
    fn test_empty_override_json_shape() {
        let one_shot = ScheduleDateOverride::empty(PaymentPlan::OneShot).unwrap();
        assert_eq!(one_shot.to_plan_json().unwrap(), json!({}));

        let mut installment = ScheduleDateOverride::empty(PaymentPlan::InstalmentWise).unwrap();
        if let ScheduleDateOverride::Installment(o) = &mut installment {
            o.semesters.insert(1, BTreeMap::new());
        }
        assert_eq!(installment.to_plan_json().unwrap(), json!({ "semesters": {} }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let bad_key = json!({ "semesters": { "sem_1": { "due_date": "2024-01-01" } } });
        assert!(matches!(
            ScheduleDateOverride::from_plan_json(PaymentPlan::SemWise, &bad_key),
            Err(FeeError::InvalidOverrideKey { .. })
        ));

        let bad_date = json!({ "program_fee_due_date": "01/08/2024" });
        assert!(matches!(
            ScheduleDateOverride::from_plan_json(PaymentPlan::OneShot, &bad_date),
            Err(FeeError::InvalidOverride { .. })
        ));

        let bad_installment = json!({ "semesters": { "semester_1": {
            "installments": { "inst_1": "2024-01-01" }
        }}});
        assert!(matches!(
            ScheduleDateOverride::from_plan_json(PaymentPlan::InstalmentWise, &bad_installment),
            Err(FeeError::InvalidOverrideKey { .. })
        ));

        let not_an_object = json!({ "semesters": ["2024-01-01"] });
        assert!(matches!(
            ScheduleDateOverride::from_plan_json(PaymentPlan::SemWise, &not_an_object),
            Err(FeeError::InvalidOverride { .. })
        ));

        assert!(matches!(
            ScheduleDateOverride::from_plan_json(PaymentPlan::NotSelected, &json!({})),
            Err(FeeError::InvalidPlan { .. })
        ));
    }
}
