//! 金额计算，全部以分为单位的整数进行

use crate::config::FinanceConfig;
use crate::errors::{Result, SchoolError};

const PERCENT_SCALE: i128 = 1_000_000;

/// 单笔金额上限：10 亿元
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// 逾期附加费用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LateCharges {
    pub days_late: i64,
    pub late_fee_cents: i64,
    pub interest_cents: i64,
}

impl LateCharges {
    pub fn total(&self) -> i64 {
        self.late_fee_cents.saturating_add(self.interest_cents)
    }
}

/// 按百分比计算金额，四舍五入到分（half-up）
///
/// 百分比先换算为百万分之一的整数，避免浮点误差影响进位。
pub fn percent_of(amount_cents: i64, percent: f64, multiplier: i64) -> i64 {
    if amount_cents <= 0 || percent <= 0.0 || multiplier <= 0 {
        return 0;
    }
    let scaled = (percent * PERCENT_SCALE as f64).round() as i128;
    let numerator = i128::from(amount_cents)
        .saturating_mul(scaled)
        .saturating_mul(i128::from(multiplier));
    let denominator = 100 * PERCENT_SCALE;
    let cents = numerator.saturating_add(denominator / 2) / denominator;
    i64::try_from(cents).unwrap_or(i64::MAX)
}

/// 两个金额相加，超出 i64 时返回校验错误
pub fn add_cents(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b)
        .ok_or_else(|| SchoolError::validation(format!("Amount overflow: {a} + {b}")))
}

/// 以 i128 累加金额，结果超出 i64 时返回校验错误
pub fn sum_cents<I>(amounts: I) -> Result<i64>
where
    I: IntoIterator<Item = i64>,
{
    let total: i128 = amounts.into_iter().map(i128::from).sum();
    i64::try_from(total)
        .map_err(|_| SchoolError::validation(format!("Amount total out of range: {total}")))
}

/// 根据逾期天数计算罚金与利息
///
/// `days_after_due` 为实际付款日减去到期日的天数；
/// 未超过宽限期时不收取任何费用，超过后罚金一次性收取、利息按全部逾期天数计算。
pub fn compute_late_charges(
    amount_cents: i64,
    days_after_due: i64,
    rules: &FinanceConfig,
) -> LateCharges {
    if days_after_due <= rules.grace_days.max(0) {
        return LateCharges::default();
    }
    LateCharges {
        days_late: days_after_due,
        late_fee_cents: percent_of(amount_cents, rules.late_fee_percent, 1),
        interest_cents: percent_of(amount_cents, rules.daily_interest_percent, days_after_due),
    }
}

/// 分转为 "1234.56" 形式，用于导出
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(grace_days: i64) -> FinanceConfig {
        FinanceConfig {
            currency: "BRL".into(),
            late_fee_percent: 2.0,
            daily_interest_percent: 0.033,
            grace_days,
        }
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        assert_eq!(percent_of(10_000, 2.0, 1), 200);
        // 10000 * 0.033% * 5 = 16.5 -> 17
        assert_eq!(percent_of(10_000, 0.033, 5), 17);
        // 10000 * 0.033% * 1 = 3.3 -> 3
        assert_eq!(percent_of(10_000, 0.033, 1), 3);
        assert_eq!(percent_of(0, 2.0, 1), 0);
        assert_eq!(percent_of(10_000, 0.0, 3), 0);
    }

    #[test]
    fn test_no_charges_within_grace() {
        assert_eq!(compute_late_charges(50_000, 0, &rules(0)), LateCharges::default());
        assert_eq!(compute_late_charges(50_000, -3, &rules(0)), LateCharges::default());
        assert_eq!(compute_late_charges(50_000, 3, &rules(5)), LateCharges::default());
    }

    #[test]
    fn test_charges_after_due() {
        let charges = compute_late_charges(50_000, 10, &rules(0));
        assert_eq!(charges.days_late, 10);
        assert_eq!(charges.late_fee_cents, 1_000);
        // 50000 * 0.033% * 10 = 165
        assert_eq!(charges.interest_cents, 165);
        assert_eq!(charges.total(), 1_165);
    }

    #[test]
    fn test_grace_days_do_not_reduce_interest_days() {
        let charges = compute_late_charges(50_000, 6, &rules(5));
        assert_eq!(charges.days_late, 6);
        assert_eq!(charges.interest_cents, 99);
    }

    #[test]
    fn test_percent_of_saturates() {
        assert_eq!(percent_of(i64::MAX, 100.0, i64::MAX), i64::MAX);
    }

    #[test]
    fn test_add_and_sum_detect_overflow() {
        assert_eq!(add_cents(1_000, 250).unwrap(), 1_250);
        assert!(add_cents(i64::MAX - 10, 11).is_err());

        assert_eq!(sum_cents([MAX_AMOUNT_CENTS, MAX_AMOUNT_CENTS]).unwrap(), 2 * MAX_AMOUNT_CENTS);
        assert_eq!(sum_cents(Vec::new()).unwrap(), 0);
        assert!(sum_cents([i64::MAX / 2 + 1, i64::MAX / 2 + 1]).is_err());
        // 中间值溢出但最终结果在范围内
        assert_eq!(sum_cents([i64::MAX, 10, -20]).unwrap(), i64::MAX - 10);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(123_456), "1234.56");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-250), "-2.50");
    }
}
