//! Pure aggregation helpers over query results

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::db::DifficultyCount;

pub const ACCEPTED: &str = "ACCEPTED";

/// Difficulties in display order
pub const DIFFICULTIES: [&str; 5] = ["BEGINNER", "EASY", "MEDIUM", "HARD", "VERYHARD"];

/// Window the progress report covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    Month,
    #[default]
    All,
}

/// Earliest submission time included for `range`, or `None` for everything
pub fn date_filter(range: TimeRange, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match range {
        TimeRange::Week => Some(now - Duration::days(7)),
        // clamps to the month's last day, e.g. Mar 31 -> Feb 28
        TimeRange::Month => now.checked_sub_months(Months::new(1)),
        TimeRange::All => None,
    }
}

/// Sum of accepted submission counts
pub fn total_solved(rows: &[DifficultyCount]) -> i64 {
    rows.iter()
        .filter(|row| row.status == ACCEPTED)
        .map(|row| row.count)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStat {
    pub difficulty: String,
    pub solved: i64,
    pub attempted: i64,
    pub success_rate: i64,
}

/// Per-difficulty solved/attempted counts in fixed order
///
/// `attempted` counts submissions of every status, accepted ones included,
/// so `success_rate` is accepted over all submissions. Difficulties with no
/// attempts are left out; unknown difficulty labels are ignored.
pub fn difficulty_breakdown(rows: &[DifficultyCount]) -> Vec<DifficultyStat> {
    DIFFICULTIES
        .iter()
        .map(|difficulty| {
            let (solved, attempted) = rows
                .iter()
                .filter(|row| row.difficulty == *difficulty)
                .fold((0, 0), |(solved, attempted), row| {
                    let accepted = if row.status == ACCEPTED { row.count } else { 0 };
                    (solved + accepted, attempted + row.count)
                });
            DifficultyStat {
                difficulty: difficulty.to_string(),
                solved,
                attempted,
                success_rate: success_rate(solved, attempted),
            }
        })
        .filter(|stat| stat.attempted > 0)
        .collect()
}

fn success_rate(solved: i64, attempted: i64) -> i64 {
    if attempted == 0 {
        return 0;
    }
    (solved as f64 / attempted as f64 * 100.0).round() as i64
}

/// `solved / total * 100`, 0 when there is nothing to solve
pub fn completion_rate(solved: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    solved as f64 / total as f64 * 100.0
}

/// Consecutive days with an accepted submission
///
/// `days` must be distinct and newest first. The streak survives until the
/// end of the day after the last solve.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&newest) = days.first() else {
        return 0;
    };
    if (today - newest).num_days() > 1 {
        return 0;
    }

    let mut expected = newest;
    let mut streak = 0;
    for day in days {
        if *day != expected {
            break;
        }
        streak += 1;
        match expected.pred_opt() {
            Some(previous) => expected = previous,
            None => break,
        }
    }
    streak
}

/// Same Sunday-to-Saturday week as `today`
pub fn is_this_week(day: NaiveDate, today: NaiveDate) -> bool {
    week_start(day) == week_start(today)
}

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_sunday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(12, 0, 0).unwrap()
    }

    fn count(difficulty: &str, status: &str, count: i64) -> DifficultyCount {
        DifficultyCount {
            difficulty: difficulty.to_string(),
            status: status.to_string(),
            count,
        }
    }

    #[test]
    fn test_date_filter() {
        let now = at(2024, 3, 31);
        assert_eq!(date_filter(TimeRange::Week, now), Some(at(2024, 3, 24)));
        assert_eq!(date_filter(TimeRange::Month, now), Some(at(2024, 2, 29)));
        assert_eq!(date_filter(TimeRange::All, now), None);
    }

    #[test]
    fn test_time_range_wire_format() {
        assert_eq!(serde_json::to_string(&TimeRange::Week).unwrap(), "\"week\"");
        let parsed: TimeRange = serde_json::from_str("\"month\"").unwrap();
        assert_eq!(parsed, TimeRange::Month);
        assert!(serde_json::from_str::<TimeRange>("\"year\"").is_err());
        assert_eq!(TimeRange::default(), TimeRange::All);
    }

    #[test]
    fn test_total_solved_counts_only_accepted() {
        let rows = vec![
            count("EASY", "ACCEPTED", 4),
            count("EASY", "WRONG_ANSWER", 3),
            count("HARD", "ACCEPTED", 1),
        ];
        assert_eq!(total_solved(&rows), 5);
        assert_eq!(total_solved(&[]), 0);
    }

    #[test]
    fn test_difficulty_breakdown_order_and_rates() {
        let rows = vec![
            count("HARD", "ACCEPTED", 1),
            count("HARD", "WRONG_ANSWER", 2),
            count("EASY", "ACCEPTED", 3),
            count("UNKNOWN", "ACCEPTED", 9),
        ];

        let breakdown = difficulty_breakdown(&rows);
        assert_eq!(
            breakdown,
            vec![
                DifficultyStat {
                    difficulty: "EASY".to_string(),
                    solved: 3,
                    attempted: 3,
                    success_rate: 100,
                },
                DifficultyStat {
                    difficulty: "HARD".to_string(),
                    solved: 1,
                    attempted: 3,
                    success_rate: 33,
                },
            ]
        );
    }

    #[test]
    fn test_success_rate_rounds_half_up() {
        let rows = vec![count("MEDIUM", "ACCEPTED", 1), count("MEDIUM", "TLE", 7)];
        // 12.5 -> 13
        assert_eq!(difficulty_breakdown(&rows)[0].success_rate, 13);
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(1, 4), 25.0);
        assert_eq!(completion_rate(3, 0), 0.0);
        assert!((completion_rate(1, 3) - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_streak_empty() {
        assert_eq!(current_streak(&[], date(2024, 5, 10)), 0);
    }

    #[test]
    fn test_streak_broken_when_newest_is_two_days_old() {
        let days = vec![date(2024, 5, 8), date(2024, 5, 7)];
        assert_eq!(current_streak(&days, date(2024, 5, 10)), 0);
    }

    #[test]
    fn test_streak_counts_from_yesterday() {
        let days = vec![date(2024, 5, 9), date(2024, 5, 8), date(2024, 5, 7)];
        assert_eq!(current_streak(&days, date(2024, 5, 10)), 3);
    }

    #[test]
    fn test_streak_stops_at_first_gap() {
        let days = vec![
            date(2024, 5, 10),
            date(2024, 5, 9),
            date(2024, 5, 7),
            date(2024, 5, 6),
        ];
        assert_eq!(current_streak(&days, date(2024, 5, 10)), 2);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let days = vec![date(2024, 3, 1), date(2024, 2, 29), date(2024, 2, 28)];
        assert_eq!(current_streak(&days, date(2024, 3, 1)), 3);
    }

    #[test]
    fn test_this_week_starts_on_sunday() {
        // 2024-05-12 is a Sunday
        let wednesday = date(2024, 5, 15);
        assert!(is_this_week(date(2024, 5, 12), wednesday));
        assert!(is_this_week(date(2024, 5, 18), wednesday));
        assert!(!is_this_week(date(2024, 5, 11), wednesday));
        assert!(!is_this_week(date(2024, 5, 19), wednesday));
    }
}
