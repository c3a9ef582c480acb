// src/common/dates.rs

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::common::error::AppError;

/// Contagem inclusiva de dias: 01/03..01/03 = 1 dia.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Ano de saldo: sempre o ano corrente no momento da ação.
pub fn current_year(now: DateTime<Utc>) -> i32 {
    now.year()
}

/// Intervalo semiaberto UTC `[from 00:00, to + 1 dia 00:00)`.
/// `to` no último dia representável não tem sucessor: vira 400, nunca pânico.
pub fn day_bounds(from: NaiveDate, to: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let next = to
        .succ_opt()
        .ok_or_else(|| AppError::BadRequest("Date is out of range.".into()))?;
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = next.and_time(NaiveTime::MIN).and_utc();
    Ok((start, end))
}

/// Rótulo de semana ISO (`2025-W01`). O ano é o ano ISO, não o civil:
/// a segunda-feira 2024-12-30 já pertence a 2025-W01.
pub fn iso_week_label(day: NaiveDate) -> String {
    let week = day.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Período padrão dos relatórios: últimos 30 dias até hoje.
pub fn default_report_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(30), today)
}

/// Aceita "HH:MM" ou "HH:MM:SS".
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_count_is_inclusive() {
        assert_eq!(inclusive_days(d(2026, 3, 1), d(2026, 3, 1)), 1);
        assert_eq!(inclusive_days(d(2026, 3, 1), d(2026, 3, 5)), 5);
        assert_eq!(inclusive_days(d(2026, 12, 30), d(2027, 1, 2)), 4);
        assert_eq!(inclusive_days(d(2026, 3, 5), d(2026, 3, 1)), -3);
    }

    #[test]
    fn bounds_cover_whole_last_day() {
        let (start, end) = day_bounds(d(2026, 1, 1), d(2026, 1, 31)).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn last_representable_day_is_rejected_not_panicking() {
        let far: NaiveDate = serde_json::from_str("\"+262142-12-31\"").unwrap();
        let err = day_bounds(d(2026, 1, 1), far).unwrap_err();
        assert_eq!(err.public_message(), "Date is out of range.");
        assert!(day_bounds(NaiveDate::MAX, NaiveDate::MAX).is_err());

        let (_, end) = day_bounds(d(2026, 12, 31), d(2026, 12, 31)).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn week_label_uses_the_iso_year() {
        assert_eq!(iso_week_label(d(2024, 12, 30)), "2025-W01");
        assert_eq!(iso_week_label(d(2021, 1, 3)), "2020-W53");
        assert_eq!(iso_week_label(d(2026, 3, 9)), "2026-W11");
    }

    #[test]
    fn balance_year_follows_the_clock() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(current_year(now), 2026);
    }

    #[test]
    fn parses_both_clock_formats() {
        assert_eq!(parse_clock("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_clock("18:30:15"), NaiveTime::from_hms_opt(18, 30, 15));
        assert_eq!(parse_clock("25:00"), None);
        assert_eq!(parse_clock("nine"), None);
    }

    #[test]
    fn default_range_is_thirty_days_back() {
        let (from, to) = default_report_range(d(2026, 3, 31));
        assert_eq!(from, d(2026, 3, 1));
        assert_eq!(to, d(2026, 3, 31));
    }
}
