use chrono::NaiveDate;

use crate::domain::DueType;
use crate::services::calendar::{add_months, first_of_next_month};

/// Next due date for a tenancy starting at `joining_date`.
///
/// Monthly needs a joining date and returns `None` without one. FirstMonth
/// falls back to `today`. Custom keeps the chosen date unless it has slipped
/// into the past, in which case it moves up to `today`.
pub fn resolve_due_date(
    due_type: DueType,
    joining_date: Option<NaiveDate>,
    custom_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    match due_type {
        DueType::Monthly => joining_date.map(|joining| add_months(joining, 1)),
        DueType::FirstMonth => Some(first_of_next_month(joining_date.unwrap_or(today))),
        DueType::Custom => custom_date.map(|chosen| clamp_to_today(chosen, today)),
    }
}

pub fn clamp_to_today(date: NaiveDate, today: NaiveDate) -> NaiveDate {
    date.max(today)
}

/// Whether the due date follows the joining date automatically.
pub fn auto_recomputes(due_type: DueType) -> bool {
    !matches!(due_type, DueType::Custom)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{auto_recomputes, resolve_due_date};
    use crate::domain::DueType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn monthly_clamps_to_end_of_short_month() {
        let today = date(2024, 1, 10);
        assert_eq!(
            resolve_due_date(DueType::Monthly, Some(date(2024, 1, 31)), None, today),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            resolve_due_date(DueType::Monthly, Some(date(2023, 1, 31)), None, today),
            Some(date(2023, 2, 28))
        );
        assert_eq!(
            resolve_due_date(DueType::Monthly, Some(date(2024, 3, 15)), None, today),
            Some(date(2024, 4, 15))
        );
    }

    #[test]
    fn monthly_without_joining_date_is_unresolved() {
        assert_eq!(resolve_due_date(DueType::Monthly, None, None, date(2024, 1, 10)), None);
    }

    #[test]
    fn first_month_uses_first_of_following_month() {
        let today = date(2024, 5, 20);
        assert_eq!(
            resolve_due_date(DueType::FirstMonth, Some(date(2024, 12, 15)), None, today),
            Some(date(2025, 1, 1))
        );
        assert_eq!(
            resolve_due_date(DueType::FirstMonth, None, None, today),
            Some(date(2024, 6, 1))
        );
    }

    #[test]
    fn custom_keeps_future_dates_and_clamps_past_ones() {
        let today = date(2024, 5, 20);
        assert_eq!(
            resolve_due_date(
                DueType::Custom,
                Some(date(2024, 1, 1)),
                Some(date(2024, 6, 7)),
                today
            ),
            Some(date(2024, 6, 7))
        );
        assert_eq!(
            resolve_due_date(DueType::Custom, None, Some(date(2024, 5, 1)), today),
            Some(today)
        );
        assert_eq!(resolve_due_date(DueType::Custom, None, None, today), None);
    }

    #[test]
    fn only_custom_is_left_alone_on_recompute() {
        assert!(auto_recomputes(DueType::Monthly));
        assert!(auto_recomputes(DueType::FirstMonth));
        assert!(!auto_recomputes(DueType::Custom));
    }
}
