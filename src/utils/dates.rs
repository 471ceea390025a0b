//! 日历日期工具：日期以 `YYYY-MM-DD`、月份以 `YYYY-MM` 字符串存储

use chrono::{Datelike, NaiveDate, Utc};

use crate::errors::{Result, SchoolError};

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SchoolError::date_parse(format!("日期格式应为 YYYY-MM-DD: '{value}'")))
}

/// 解析 `YYYY-MM`，返回 (年, 月)
pub fn parse_month(value: &str) -> Result<(i32, u32)> {
    let value = value.trim();
    let invalid = || SchoolError::date_parse(format!("月份格式应为 YYYY-MM: '{value}'"));
    let (year, month) = value.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 当月第一天与最后一天
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| SchoolError::date_parse(format!("无效月份: {year}-{month:02}")))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| SchoolError::date_parse(format!("无效月份: {year}-{month:02}")))?;
    let last = next_first.pred_opt().unwrap_or(first);
    Ok((first, last))
}

/// 指定月份的到期日，due_day 超出当月天数时取月末
pub fn due_date_in_month(year: i32, month: u32, due_day: u32) -> Result<NaiveDate> {
    let (first, last) = month_bounds(year, month)?;
    let day = due_day.clamp(1, last.day());
    Ok(first.with_day(day).unwrap_or(last))
}

/// 当前月份的起止日期
pub fn current_month_bounds() -> Result<(NaiveDate, NaiveDate)> {
    let now = today();
    month_bounds(now.year(), now.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2025-03-10").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 3, 10));
        assert!(parse_date("10/03/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-03").unwrap(), (2025, 3));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("2025-3").is_err());
        assert!(parse_month("202503").is_err());
    }

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(format_date(first), "2024-02-01");
        assert_eq!(format_date(last), "2024-02-29");
        let (_, dec_last) = month_bounds(2025, 12).unwrap();
        assert_eq!(format_date(dec_last), "2025-12-31");
    }

    #[test]
    fn test_due_date_clamped_to_month_end() {
        assert_eq!(
            format_date(due_date_in_month(2025, 2, 31).unwrap()),
            "2025-02-28"
        );
        assert_eq!(
            format_date(due_date_in_month(2025, 4, 10).unwrap()),
            "2025-04-10"
        );
        assert_eq!(
            format_date(due_date_in_month(2025, 4, 0).unwrap()),
            "2025-04-01"
        );
    }

    #[test]
    fn test_format_month() {
        let date = parse_date("2025-07-19").unwrap();
        assert_eq!(format_month(date), "2025-07");
    }
}
