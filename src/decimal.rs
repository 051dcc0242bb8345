use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// Money type for INR amounts, stored with paise (2 decimal places) precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(2))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s.trim())?.round_dp(2)))
    }

    /// create from whole rupees
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from paise
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, 2))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round to the nearest whole currency unit, halves away from zero
    pub fn round_units(&self) -> Self {
        Money(self.0.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }

    /// truncate toward negative infinity to a whole currency unit
    pub fn floor_units(&self) -> Self {
        Money(self.0.floor())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// subtraction floored at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        (self - other).max(Money::ZERO)
    }

    /// apply a rate (e.g., 5% of 100000), kept at paise precision
    pub fn percentage(&self, rate: Rate) -> Self {
        Money::from_decimal(self.0 * rate.as_decimal())
    }

    /// rate applied and rounded straight to whole units
    pub fn percentage_units(&self, rate: Rate) -> Self {
        Money(self.0 * rate.as_decimal()).round_units()
    }

    /// strip an included rate (e.g. 118000 incl. 18% -> 100000), whole units
    pub fn exclusive_of(&self, rate: Rate) -> Self {
        Money(self.0 / (Decimal::ONE + rate.as_decimal())).round_units()
    }

    /// split into `parts` whole-unit shares; the last share absorbs the residual
    pub fn split_evenly(self, parts: usize) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }
        let exact = self.0 / Decimal::from(parts as u64);
        allocate_shares(self, &vec![exact; parts])
    }

    /// split proportionally to `weights`; the last share absorbs the residual.
    /// zero total weight puts everything on the last share.
    pub fn allocate(self, weights: &[Money]) -> Vec<Money> {
        if weights.is_empty() {
            return Vec::new();
        }
        let total_weight: Decimal = weights.iter().map(|w| w.0).sum();
        if total_weight.is_zero() {
            let mut shares = vec![Money::ZERO; weights.len()];
            if let Some(last) = shares.last_mut() {
                *last = self;
            }
            return shares;
        }
        let exact: Vec<Decimal> = weights
            .iter()
            .map(|w| self.0 * w.0 / total_weight)
            .collect();
        allocate_shares(self, &exact)
    }

    /// en-IN display string, e.g. `₹1,12,100` or `₹1,12,100.50`
    pub fn format_inr(&self, fraction_digits: u32) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(fraction_digits, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded < Decimal::ZERO;
        let text = format!("{:.*}", fraction_digits as usize, rounded.abs());
        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w.to_string(), Some(f.to_string())),
            None => (text.clone(), None),
        };

        let grouped = group_indian(&whole);
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push('₹');
        out.push_str(&grouped);
        if let Some(f) = fraction {
            out.push('.');
            out.push_str(&f);
        }
        out
    }
}

/// rounds every share but the last to whole units, then hands the residual to
/// the last share. falls back to floored shares when nearest rounding would
/// overshoot the total.
fn allocate_shares(total: Money, exact: &[Decimal]) -> Vec<Money> {
    let head = &exact[..exact.len() - 1];
    let mut shares: Vec<Money> = head
        .iter()
        .map(|d| Money(*d).round_units())
        .collect();
    let mut allocated: Money = shares.iter().copied().sum();

    if allocated.abs() > total.abs() {
        shares = head.iter().map(|d| Money(*d).floor_units()).collect();
        allocated = shares.iter().copied().sum();
    }

    shares.push(total - allocated);
    shares
}

/// lakh/crore grouping: last three digits, then pairs
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(2))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(2);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(2))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(2);
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(2))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(2))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// rate type for percentages (GST, discounts, scholarships), stored as a fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 18 for 18%)
    pub fn from_percentage(p: Decimal) -> Self {
        Rate(p / Decimal::ONE_HUNDRED)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// within 0%..=100%
    pub fn is_valid_percentage(&self) -> bool {
        self.0 >= Decimal::ZERO && self.0 <= Decimal::ONE
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.126").unwrap();
        assert_eq!(m.to_string(), "100.13");

        let paise = Money::from_minor(150);
        assert_eq!(paise, Money::from_decimal(dec!(1.50)));
    }

    #[test]
    fn test_round_units_midpoint() {
        assert_eq!(Money::from_decimal(dec!(2.5)).round_units(), Money::from_major(3));
        assert_eq!(Money::from_decimal(dec!(2.49)).round_units(), Money::from_major(2));
        assert_eq!(Money::from_decimal(dec!(-2.5)).round_units(), Money::from_major(-3));
    }

    #[test]
    fn test_split_evenly_last_absorbs() {
        let shares = Money::from_major(100_000).split_evenly(3);
        assert_eq!(
            shares,
            vec![Money::from_major(33_333), Money::from_major(33_333), Money::from_major(33_334)]
        );

        let shares = Money::from_major(90_000).split_evenly(3);
        assert!(shares.iter().all(|s| *s == Money::from_major(30_000)));

        // 7 / 4 rounds to 2 each, last takes 1
        let shares = Money::from_major(7).split_evenly(4);
        assert_eq!(shares.iter().copied().sum::<Money>(), Money::from_major(7));
        assert_eq!(shares[3], Money::from_major(1));
    }

    #[test]
    fn test_split_never_negative() {
        let shares = Money::from_major(10).split_evenly(20);
        assert!(shares.iter().all(|s| !s.is_negative()));
        assert_eq!(shares.iter().copied().sum::<Money>(), Money::from_major(10));
    }

    #[test]
    fn test_allocate_proportional() {
        let weights = vec![Money::from_major(1), Money::from_major(1), Money::from_major(2)];
        let shares = Money::from_major(1_001).allocate(&weights);
        assert_eq!(shares[0], Money::from_major(250));
        assert_eq!(shares[1], Money::from_major(250));
        assert_eq!(shares[2], Money::from_major(501));

        let zero_weights = vec![Money::ZERO, Money::ZERO];
        let shares = Money::from_major(10).allocate(&zero_weights);
        assert_eq!(shares, vec![Money::ZERO, Money::from_major(10)]);
    }

    #[test]
    fn test_percentage() {
        let base = Money::from_major(100_000);
        assert_eq!(base.percentage(Rate::from_percentage(dec!(5))), Money::from_major(5_000));
        assert_eq!(
            Money::from_major(95_000).percentage(Rate::from_percentage(dec!(18))),
            Money::from_major(17_100)
        );
    }

    #[test]
    fn test_unit_rounding_helpers() {
        let gst = Rate::from_percentage(dec!(18));
        assert_eq!(Money::from_major(118_000).exclusive_of(gst), Money::from_major(100_000));
        assert_eq!(Money::from_major(1_000).exclusive_of(gst), Money::from_major(847));
        // 2.495 rounds once, not via 2.50
        assert_eq!(Money(dec!(49.9)).percentage_units(Rate::from_percentage(dec!(5))), Money::from_major(2));
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(Money::from_major(112_100).format_inr(0), "₹1,12,100");
        assert_eq!(Money::from_major(999).format_inr(0), "₹999");
        assert_eq!(Money::from_major(12_345_678).format_inr(0), "₹1,23,45,678");
        assert_eq!(Money::from_decimal(dec!(1500.5)).format_inr(2), "₹1,500.50");
        assert_eq!(Money::from_major(-2_000).format_inr(0), "-₹2,000");
    }

    #[test]
    fn test_rate_bounds() {
        assert!(Rate::from_percentage(dec!(100)).is_valid_percentage());
        assert!(!Rate::from_percentage(dec!(101)).is_valid_percentage());
        assert!(!Rate::from_percentage(dec!(-1)).is_valid_percentage());
        assert_eq!(Rate::from_percentage(dec!(18)).to_string(), "18%");
    }
}
