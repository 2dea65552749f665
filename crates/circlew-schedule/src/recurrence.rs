// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure computation of upcoming occurrence dates from a recurrence rule.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use circlew_core::types::{Cadence, RecurrenceRule};

/// "1st & 3rd" scans at most this many months before giving up and returning
/// fewer dates than requested.
const MONTH_SAFETY_BOUND: usize = 6;

/// Compute up to `count` occurrence dates for `rule`, all strictly after
/// `from`, in strictly increasing order.
///
/// A rule without a weekday ("Flexible" circles) produces nothing. When
/// `from` itself falls on the rule's weekday the first date is still the
/// following week's occurrence -- the rule never returns "today".
pub fn compute_dates(rule: &RecurrenceRule, count: usize, from: NaiveDate) -> Vec<NaiveDate> {
    let Some(weekday) = rule.weekday else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }

    match rule.cadence {
        Cadence::FirstAndThird => first_and_third(weekday, count, from),
        _ => fixed_step(weekday, step_days(&rule.cadence), count, from),
    }
}

/// Step size in days for the fixed-interval cadences. Unrecognized cadences
/// behave like weekly.
fn step_days(cadence: &Cadence) -> u64 {
    match cadence {
        Cadence::Biweekly => 14,
        Cadence::Monthly => 28,
        Cadence::Weekly | Cadence::FirstAndThird | Cadence::Other(_) => 7,
    }
}

/// The first date strictly after `from` that falls on `weekday`.
fn next_weekday_after(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let target = weekday.num_days_from_sunday();
    let current = from.weekday().num_days_from_sunday();
    let mut offset = (target + 7 - current) % 7;
    if offset == 0 {
        offset = 7;
    }
    from + Days::new(u64::from(offset))
}

fn fixed_step(weekday: Weekday, step: u64, count: usize, from: NaiveDate) -> Vec<NaiveDate> {
    let first = next_weekday_after(from, weekday);
    (0..count)
        .map(|i| first + Days::new(step * i as u64))
        .collect()
}

/// First and third occurrence of `weekday` in each calendar month, starting
/// with `from`'s month. Uses month/year arithmetic (not fixed-day steps) so
/// short months like February cannot drift onto the wrong weekday.
fn first_and_third(weekday: Weekday, count: usize, from: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut month_start = from
        .with_day(1)
        .expect("day 1 exists in every month");

    for _ in 0..MONTH_SAFETY_BOUND {
        let target = weekday.num_days_from_sunday();
        let first_of_month = month_start.weekday().num_days_from_sunday();
        let first = month_start + Days::new(u64::from((target + 7 - first_of_month) % 7));
        let third = first + Days::new(14);

        for date in [first, third] {
            if date > from && dates.len() < count {
                dates.push(date);
            }
        }
        if dates.len() >= count {
            break;
        }
        month_start = month_start + Months::new(1);
    }

    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(weekday: Option<Weekday>, cadence: Cadence) -> RecurrenceRule {
        RecurrenceRule { weekday, cadence }
    }

    #[test]
    fn weekly_from_monday_finds_next_wednesday() {
        // 2025-06-02 is a Monday.
        let dates = compute_dates(
            &rule(Some(Weekday::Wed), Cadence::Weekly),
            4,
            date(2025, 6, 2),
        );
        assert_eq!(
            dates,
            vec![
                date(2025, 6, 4),
                date(2025, 6, 11),
                date(2025, 6, 18),
                date(2025, 6, 25),
            ]
        );
    }

    #[test]
    fn from_on_the_rule_weekday_advances_a_full_week() {
        // 2025-06-04 is itself a Wednesday; the rule never returns "today".
        let dates = compute_dates(
            &rule(Some(Weekday::Wed), Cadence::Weekly),
            1,
            date(2025, 6, 4),
        );
        assert_eq!(dates, vec![date(2025, 6, 11)]);
    }

    #[test]
    fn biweekly_steps_fourteen_days() {
        let dates = compute_dates(
            &rule(Some(Weekday::Fri), Cadence::Biweekly),
            3,
            date(2025, 6, 2),
        );
        assert_eq!(
            dates,
            vec![date(2025, 6, 6), date(2025, 6, 20), date(2025, 7, 4)]
        );
    }

    #[test]
    fn monthly_steps_twenty_eight_days() {
        let dates = compute_dates(
            &rule(Some(Weekday::Mon), Cadence::Monthly),
            2,
            date(2025, 6, 2),
        );
        assert_eq!(dates, vec![date(2025, 6, 9), date(2025, 7, 7)]);
    }

    #[test]
    fn first_and_third_tuesdays_across_months() {
        // 2025-03-01 is a Saturday. First/third Tuesdays of March are the
        // 4th and 18th, of April the 1st and 15th.
        let dates = compute_dates(
            &rule(Some(Weekday::Tue), Cadence::FirstAndThird),
            4,
            date(2025, 3, 1),
        );
        assert_eq!(
            dates,
            vec![
                date(2025, 3, 4),
                date(2025, 3, 18),
                date(2025, 4, 1),
                date(2025, 4, 15),
            ]
        );
    }

    #[test]
    fn first_and_third_skips_occurrences_not_after_from() {
        // From the 10th, March's first Tuesday (the 4th) is already past.
        let dates = compute_dates(
            &rule(Some(Weekday::Tue), Cadence::FirstAndThird),
            2,
            date(2025, 3, 10),
        );
        assert_eq!(dates, vec![date(2025, 3, 18), date(2025, 4, 1)]);
    }

    #[test]
    fn first_and_third_handles_february_month_boundaries() {
        // 2025-01-31 -> February 2025 starts on a Saturday; first Monday is
        // Feb 3, third is Feb 17, then March 3 / March 17. Month arithmetic
        // must not drift off the weekday across the short month.
        let dates = compute_dates(
            &rule(Some(Weekday::Mon), Cadence::FirstAndThird),
            4,
            date(2025, 1, 31),
        );
        assert_eq!(
            dates,
            vec![
                date(2025, 2, 3),
                date(2025, 2, 17),
                date(2025, 3, 3),
                date(2025, 3, 17),
            ]
        );
    }

    #[test]
    fn first_and_third_safety_bound_returns_fewer_dates() {
        // Six months yield at most twelve dates; asking for more must return
        // what the bound allows rather than loop.
        let dates = compute_dates(
            &rule(Some(Weekday::Tue), Cadence::FirstAndThird),
            50,
            date(2025, 3, 1),
        );
        assert_eq!(dates.len(), 12);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn flexible_rule_yields_nothing() {
        let dates = compute_dates(&rule(None, Cadence::Weekly), 10, date(2025, 6, 2));
        assert!(dates.is_empty());
    }

    #[test]
    fn unrecognized_cadence_defaults_to_weekly() {
        let dates = compute_dates(
            &rule(Some(Weekday::Wed), Cadence::Other("As needed".into())),
            2,
            date(2025, 6, 2),
        );
        assert_eq!(dates, vec![date(2025, 6, 4), date(2025, 6, 11)]);
    }

    #[test]
    fn zero_count_yields_nothing() {
        let dates = compute_dates(
            &rule(Some(Weekday::Wed), Cadence::Weekly),
            0,
            date(2025, 6, 2),
        );
        assert!(dates.is_empty());
    }

    #[test]
    fn dates_are_strictly_increasing_and_after_from() {
        let from = date(2025, 6, 2);
        for cadence in [
            Cadence::Weekly,
            Cadence::Biweekly,
            Cadence::Monthly,
            Cadence::FirstAndThird,
        ] {
            let dates = compute_dates(&rule(Some(Weekday::Sun), cadence), 6, from);
            assert!(dates.iter().all(|d| *d > from));
            assert!(dates.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
