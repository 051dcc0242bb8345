use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{FeeError, Result};
use crate::types::{CohortId, ScholarshipId};

/// named percentage waiver on the program fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: ScholarshipId,
    pub cohort_id: CohortId,
    pub name: String,
    pub amount: Rate,
    /// lowest qualifying score, inclusive
    pub start_percentage: Option<Decimal>,
    /// highest qualifying score, inclusive
    pub end_percentage: Option<Decimal>,
}

impl Scholarship {
    pub fn new(id: ScholarshipId, cohort_id: CohortId, name: impl Into<String>, percentage: Decimal) -> Self {
        Self {
            id,
            cohort_id,
            name: name.into(),
            amount: Rate::from_percentage(percentage),
            start_percentage: None,
            end_percentage: None,
        }
    }

    /// restrict eligibility to a score band
    pub fn with_band(mut self, start: Option<Decimal>, end: Option<Decimal>) -> Self {
        self.start_percentage = start;
        self.end_percentage = end;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_valid_percentage() {
            return Err(FeeError::calculation(format!(
                "scholarship '{}' percentage out of range: {}",
                self.name, self.amount
            )));
        }
        if let (Some(start), Some(end)) = (self.start_percentage, self.end_percentage) {
            if start > end {
                return Err(FeeError::configuration(format!(
                    "scholarship '{}' band is inverted: {} > {}",
                    self.name, start, end
                )));
            }
        }
        Ok(())
    }

    /// whether a score falls inside the band; missing bounds are open
    pub fn is_eligible(&self, score: Decimal) -> bool {
        let above_start = self.start_percentage.map_or(true, |start| score >= start);
        let below_end = self.end_percentage.map_or(true, |end| score <= end);
        above_start && below_end
    }

    /// the most generous scholarship whose band contains the score
    pub fn select_for_score(scholarships: &[Scholarship], score: Decimal) -> Option<&Scholarship> {
        scholarships
            .iter()
            .filter(|s| s.is_eligible(score))
            .max_by(|a, b| a.amount.cmp(&b.amount))
    }
}
