use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::services::calendar::{days_in_month, first_of_month, first_of_next_month, same_month};

/// One calendar month's share of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthSegment {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub days_billed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayQuote {
    pub staying_days: i64,
    pub amount: i64,
    pub segments: Vec<MonthSegment>,
}

impl StayQuote {
    fn empty() -> Self {
        Self {
            staying_days: 0,
            amount: 0,
            segments: Vec::new(),
        }
    }
}

/// Rent due for a stay, counting both the joining and the move-out day.
pub fn compute_stay_due(
    joining_date: Option<NaiveDate>,
    move_out_date: Option<NaiveDate>,
    monthly_rent: i64,
) -> i64 {
    quote_stay(joining_date, move_out_date, monthly_rent).amount
}

pub fn quote_stay(
    joining_date: Option<NaiveDate>,
    move_out_date: Option<NaiveDate>,
    monthly_rent: i64,
) -> StayQuote {
    let (Some(joining), Some(move_out)) = (joining_date, move_out_date) else {
        return StayQuote::empty();
    };
    if monthly_rent <= 0 || move_out <= joining {
        return StayQuote::empty();
    }

    let segments = month_segments(joining, move_out);
    let rent = monthly_rent as f64;
    // Per-month shares stay unrounded; only the total is rounded.
    let total: f64 = segments
        .iter()
        .map(|segment| rent / f64::from(segment.days_in_month) * f64::from(segment.days_billed))
        .sum();

    StayQuote {
        staying_days: (move_out - joining).num_days() + 1,
        amount: total.round() as i64,
        segments,
    }
}

fn month_segments(joining: NaiveDate, move_out: NaiveDate) -> Vec<MonthSegment> {
    let last_month = first_of_month(move_out);
    let mut cursor = first_of_month(joining);
    let mut segments = Vec::new();

    while cursor <= last_month {
        let month_days = days_in_month(cursor);
        let start_day = if same_month(cursor, joining) {
            joining.day()
        } else {
            1
        };
        let end_day = if same_month(cursor, move_out) {
            move_out.day()
        } else {
            month_days
        };
        segments.push(MonthSegment {
            year: cursor.year(),
            month: cursor.month(),
            days_in_month: month_days,
            days_billed: end_day + 1 - start_day,
        });
        cursor = first_of_next_month(cursor);
    }

    segments
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{compute_stay_due, quote_stay};

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn prorates_within_a_single_month() {
        assert_eq!(compute_stay_due(date(2024, 1, 15), date(2024, 1, 20), 3100), 600);
    }

    #[test]
    fn prorates_across_leap_february() {
        // 3000/31*4 + 3000/29*3 = 697.44
        assert_eq!(compute_stay_due(date(2024, 1, 28), date(2024, 2, 3), 3000), 697);
    }

    #[test]
    fn rounds_the_total_not_each_segment() {
        // 1000/31*1 + 1000/29*1 = 32.26 + 34.48 = 66.74; per-segment rounding gives 66.
        assert_eq!(compute_stay_due(date(2024, 1, 31), date(2024, 2, 1), 1000), 67);
    }

    #[test]
    fn bills_full_middle_months() {
        let quote = quote_stay(date(2024, 1, 20), date(2024, 3, 10), 2900);
        let billed: Vec<u32> = quote.segments.iter().map(|s| s.days_billed).collect();
        assert_eq!(billed, vec![12, 29, 10]);
        assert_eq!(quote.staying_days, 51);
        // 2900/31*12 + 2900 + 2900/31*10 = 1122.58 + 2900 + 935.48
        assert_eq!(quote.amount, 4958);
    }

    #[test]
    fn spans_a_year_boundary() {
        let quote = quote_stay(date(2024, 12, 30), date(2025, 1, 2), 3100);
        assert_eq!(quote.segments.len(), 2);
        assert_eq!(quote.staying_days, 4);
        assert_eq!(quote.amount, 400);
    }

    #[test]
    fn returns_zero_for_degenerate_inputs() {
        assert_eq!(compute_stay_due(None, date(2024, 1, 20), 3100), 0);
        assert_eq!(compute_stay_due(date(2024, 1, 15), None, 3100), 0);
        assert_eq!(compute_stay_due(date(2024, 1, 15), date(2024, 1, 20), 0), 0);
        assert_eq!(compute_stay_due(date(2024, 1, 15), date(2024, 1, 20), -50), 0);
        assert_eq!(compute_stay_due(date(2024, 1, 20), date(2024, 1, 20), 3100), 0);
        assert_eq!(compute_stay_due(date(2024, 1, 21), date(2024, 1, 20), 3100), 0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let first = quote_stay(date(2024, 1, 28), date(2024, 2, 3), 3000);
        let second = quote_stay(date(2024, 1, 28), date(2024, 2, 3), 3000);
        assert_eq!(first, second);
    }
}
