//! Utilidades de calendario: límites de mes y nombres de periodo

use chrono::{Datelike, Duration, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Primer día del mes y primer día del mes siguiente (rango semiabierto)
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next))
}

/// Último día del mes
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    month_bounds(year, month).map(|(_, next)| next - Duration::days(1))
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("Unknown")
}

/// "March 2024"
pub fn period_label(month: u32, year: i32) -> String {
    format!("{} {}", month_name(month), year)
}

/// `(year, month)` de los últimos `count` meses, del más antiguo al actual
pub fn trailing_months(today: NaiveDate, count: u32) -> Vec<(i32, u32)> {
    let mut months = Vec::with_capacity(count as usize);
    let (mut year, mut month) = (today.year(), today.month());
    for _ in 0..count {
        months.push((year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds_wraps_december() {
        let (start, next) = month_bounds(2024, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(next, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(month_bounds(2024, 13).is_none());
    }

    #[test]
    fn test_month_end_leap_year() {
        assert_eq!(month_end(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(month_end(2023, 2), NaiveDate::from_ymd_opt(2023, 2, 28));
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period_label(3, 2024), "March 2024");
        assert_eq!(month_name(0), "Unknown");
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(13), "Unknown");
    }

    #[test]
    fn test_trailing_months_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(
            trailing_months(today, 4),
            vec![(2023, 11), (2023, 12), (2024, 1), (2024, 2)]
        );
    }
}
