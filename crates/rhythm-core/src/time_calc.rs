//! Next-occurrence math for fixed-time reminders and the midnight rollover.
//!
//! Pure functions over an explicit `now` -- no hidden clock, so every
//! edge (day wrap, weekday restriction, DST gaps) is testable.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};

/// Parse a `"HH:MM"` wall-clock time.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Resolve a local date+time, tolerating DST transitions.
///
/// Ambiguous local times pick the earlier instant; nonexistent local
/// times (spring-forward gap) yield `None` and the caller moves on.
fn local_at(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

/// Next instant a fixed-time reminder should fire.
///
/// Candidate is today at `time_of_day`; if that already passed, the scan
/// advances one day at a time. A non-empty `workdays` set (0 = Sunday,
/// matching the persisted schema) restricts which weekdays qualify. The
/// scan is bounded to a full week past today, so a workday set that
/// names no real weekday yields `None` -- "never fires".
///
/// Guarantees: the returned instant is strictly greater than `now`, and
/// its weekday is in `workdays` when the set is non-empty.
pub fn next_fixed_time(
    time_of_day: NaiveTime,
    workdays: &BTreeSet<u8>,
    now: DateTime<Local>,
) -> Option<DateTime<Local>> {
    let mut date = now.date_naive();
    for _ in 0..8 {
        if let Some(candidate) = local_at(date, time_of_day) {
            let weekday_ok = workdays.is_empty()
                || workdays.contains(&(candidate.weekday().num_days_from_sunday() as u8));
            if candidate > now && weekday_ok {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }
    None
}

/// Start of the next local calendar day.
pub fn next_midnight(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .succ_opt()
        .and_then(|d| local_at(d, NaiveTime::MIN))
        .unwrap_or_else(|| now + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_time_of_day() {
        assert_eq!(parse_time_of_day("09:30"), Some(at(9, 30)));
        assert_eq!(parse_time_of_day("00:00"), Some(at(0, 0)));
        assert!(parse_time_of_day("24:00").is_none());
        assert!(parse_time_of_day("9h30").is_none());
        assert!(parse_time_of_day("").is_none());
    }

    #[test]
    fn next_fixed_time_is_strictly_future() {
        let now = Local::now();
        let empty = BTreeSet::new();
        // A time earlier today must roll to tomorrow.
        let earlier = now - Duration::hours(1);
        let next = next_fixed_time(earlier.time().with_nanosecond(0).unwrap(), &empty, now).unwrap();
        assert!(next > now);

        // A time later today stays today.
        let later = now + Duration::hours(1);
        let next = next_fixed_time(later.time().with_nanosecond(0).unwrap(), &empty, now).unwrap();
        assert!(next > now);
        assert!(next - now <= Duration::hours(1) + Duration::seconds(1));
    }

    #[test]
    fn next_fixed_time_honors_workdays() {
        let now = Local::now();
        for day in 0u8..7 {
            let workdays: BTreeSet<u8> = [day].into();
            let next = next_fixed_time(at(9, 0), &workdays, now).unwrap();
            assert!(next > now);
            assert_eq!(next.weekday().num_days_from_sunday() as u8, day);
        }
    }

    #[test]
    fn impossible_workdays_never_fire() {
        let now = Local::now();
        let workdays: BTreeSet<u8> = [9].into();
        assert_eq!(next_fixed_time(at(9, 0), &workdays, now), None);
    }

    #[test]
    fn next_midnight_is_start_of_tomorrow() {
        let now = Local::now();
        let midnight = next_midnight(now);
        assert!(midnight > now);
        assert_eq!(midnight.time(), NaiveTime::MIN);
        assert_eq!(midnight.date_naive(), now.date_naive().succ_opt().unwrap());
    }
}
