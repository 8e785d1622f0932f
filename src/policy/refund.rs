//! Time-based refund calculation
//!
//! The base schedule works on whole calendar days between "today" and the
//! visit date. A place's own refund policy can switch refunds off, cap the
//! before-visit percentage, or grant a same-day percentage.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tier table: (minimum days before visit, percent refunded), descending.
const REFUND_TIERS: [(i64, u8); 3] = [(7, 100), (3, 50), (1, 25)];

/// Refund rules attached to a place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefundPolicy {
    pub refundable: bool,
    /// Upper bound applied to the tier table for visits at least a day away
    pub before_visit_percent: u8,
    /// Percentage refunded when cancelling on the visit day
    pub same_day_percent: u8,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            refundable: true,
            before_visit_percent: 100,
            same_day_percent: 0,
        }
    }
}

/// Result of a refund calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RefundQuote {
    pub days_before_visit: i64,
    pub percent: u8,
    pub amount: Decimal,
}

/// Percent refunded by the base schedule for `days` calendar days before the visit
pub fn tier_percent(days: i64) -> u8 {
    REFUND_TIERS
        .iter()
        .find(|(min_days, _)| days >= *min_days)
        .map(|(_, percent)| *percent)
        .unwrap_or(0)
}

pub fn days_before_visit(today: NaiveDate, visit_date: NaiveDate) -> i64 {
    (visit_date - today).num_days()
}

impl RefundPolicy {
    /// Percent refunded under this policy
    pub fn percent_for(&self, days: i64) -> u8 {
        if !self.refundable || days < 0 {
            return 0;
        }
        if days == 0 {
            return self.same_day_percent.min(100);
        }
        tier_percent(days).min(self.before_visit_percent)
    }

    /// Quote the refund for a pass paid `amount_paid` and visiting on `visit_date`
    pub fn quote(&self, today: NaiveDate, visit_date: NaiveDate, amount_paid: Decimal) -> RefundQuote {
        let days = days_before_visit(today, visit_date);
        let percent = self.percent_for(days);
        RefundQuote {
            days_before_visit: days,
            percent,
            amount: refund_amount(amount_paid, percent),
        }
    }
}

/// `amount × percent / 100`, rounded to cents
pub fn refund_amount(amount_paid: Decimal, percent: u8) -> Decimal {
    if amount_paid <= Decimal::ZERO || percent == 0 {
        return Decimal::ZERO;
    }
    let raw = amount_paid * Decimal::from(percent.min(100)) / Decimal::ONE_HUNDRED;
    raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .min(amount_paid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_tier_table() {
        for days in 7..60 {
            assert_eq!(tier_percent(days), 100, "days = {}", days);
        }
        for days in 3..=6 {
            assert_eq!(tier_percent(days), 50, "days = {}", days);
        }
        assert_eq!(tier_percent(2), 25);
        assert_eq!(tier_percent(1), 25);
        assert_eq!(tier_percent(0), 0);
        assert_eq!(tier_percent(-3), 0);
    }

    #[test]
    fn test_days_before_visit_crosses_month() {
        assert_eq!(days_before_visit(date(2026, 1, 28), date(2026, 2, 4)), 7);
        assert_eq!(days_before_visit(date(2026, 2, 4), date(2026, 2, 4)), 0);
        assert_eq!(days_before_visit(date(2026, 2, 5), date(2026, 2, 4)), -1);
    }

    #[test]
    fn test_default_policy_follows_tiers() {
        let policy = RefundPolicy::default();
        let paid = Decimal::new(50000, 2);
        let today = date(2026, 3, 1);

        let quote = policy.quote(today, date(2026, 3, 10), paid);
        assert_eq!(quote.percent, 100);
        assert_eq!(quote.amount, paid);

        let quote = policy.quote(today, date(2026, 3, 5), paid);
        assert_eq!(quote.days_before_visit, 4);
        assert_eq!(quote.percent, 50);
        assert_eq!(quote.amount, Decimal::new(25000, 2));

        let quote = policy.quote(today, date(2026, 3, 2), paid);
        assert_eq!(quote.percent, 25);
        assert_eq!(quote.amount, Decimal::new(12500, 2));

        let quote = policy.quote(today, today, paid);
        assert_eq!(quote.percent, 0);
        assert_eq!(quote.amount, Decimal::ZERO);
    }

    #[test]
    fn test_non_refundable_place() {
        let policy = RefundPolicy {
            refundable: false,
            ..RefundPolicy::default()
        };
        assert_eq!(policy.percent_for(30), 0);
        assert_eq!(policy.percent_for(0), 0);
    }

    #[test]
    fn test_before_visit_cap_and_same_day() {
        let policy = RefundPolicy {
            refundable: true,
            before_visit_percent: 80,
            same_day_percent: 10,
        };
        assert_eq!(policy.percent_for(10), 80);
        assert_eq!(policy.percent_for(4), 50);
        assert_eq!(policy.percent_for(1), 25);
        assert_eq!(policy.percent_for(0), 10);
        assert_eq!(policy.percent_for(-1), 0);
    }

    #[test]
    fn test_refund_amount_rounding() {
        // 33.33 * 25% = 8.3325
        assert_eq!(refund_amount(Decimal::new(3333, 2), 25), Decimal::new(833, 2));
        // 0.10 * 25% = 0.025
        assert_eq!(refund_amount(Decimal::new(10, 2), 25), Decimal::new(3, 2));
        assert_eq!(refund_amount(Decimal::ZERO, 100), Decimal::ZERO);
    }

    #[test]
    fn test_refund_never_exceeds_paid() {
        let paid = Decimal::new(1999, 2);
        for percent in 0..=100u8 {
            assert!(refund_amount(paid, percent) <= paid);
        }
    }
}
