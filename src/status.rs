//! Real-time status classification for timetable slots.
//!
//! Slot text on the portal comes in two conventions: a single meridiem suffix
//! covering only the end time (`2.45-3.35PM`) or one per time
//! (`2.45PM-3.35PM`). The single-meridiem form leaves the start ambiguous, so
//! the parser ranks candidate interpretations by class-duration plausibility.

use crate::types::ClassStatus;
use chrono::{Datelike, Local, Timelike, Weekday};
use regex::Regex;
use std::sync::LazyLock;

/// Longest plausible single class, in minutes.
const MAX_CLASS_MINUTES: i32 = 180;

static SINGLE_MERIDIEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})[.:]([0-9]{1,2})-([0-9]{1,2})[.:]([0-9]{1,2})(AM|PM)").unwrap()
});

static DUAL_MERIDIEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})[.:]([0-9]{1,2})(AM|PM)-([0-9]{1,2})[.:]([0-9]{1,2})(AM|PM)").unwrap()
});

static PRETTY_SLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]{1,2})[.:]([0-9]{1,2})\s*-\s*([0-9]{1,2})[.:]([0-9]{1,2})\s*(AM|PM)")
        .unwrap()
});

/// Computes a slot's status against the local clock.
pub fn compute_status(day: &str, slot: &str) -> ClassStatus {
    let now = Local::now();
    let now_minutes = (now.hour() * 60 + now.minute()) as i32;
    compute_status_at(day, slot, now.weekday(), now_minutes)
}

/// Computes a slot's status against an explicit clock.
///
/// A day other than `today` is always `Upcoming`: status is only ever
/// meaningful relative to "now". Unparseable slots are `Upcoming` too.
pub fn compute_status_at(day: &str, slot: &str, today: Weekday, now_minutes: i32) -> ClassStatus {
    let normalized = normalize_day_name(day);
    if !normalized.eq_ignore_ascii_case(weekday_full_name(today)) {
        return ClassStatus::Upcoming;
    }

    let Some((start, end)) = parse_slot_minutes(slot) else {
        return ClassStatus::Upcoming;
    };

    if now_minutes < start {
        ClassStatus::Upcoming
    } else if now_minutes <= end {
        ClassStatus::OnGoing
    } else {
        ClassStatus::Completed
    }
}

/// Parses a slot into (start, end) minutes-since-midnight, trying the
/// single-meridiem convention first.
pub fn parse_slot_minutes(slot: &str) -> Option<(i32, i32)> {
    let s: String = slot
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    if let Some(caps) = SINGLE_MERIDIEM_RE.captures(&s) {
        let end_meridiem = &caps[5];
        let end = hm_to_minutes(&caps[3], &caps[4], end_meridiem);
        let start = infer_start_minutes(&caps[1], &caps[2], end, end_meridiem)?;
        return Some((start, end));
    }

    if let Some(caps) = DUAL_MERIDIEM_RE.captures(&s) {
        let start = hm_to_minutes(&caps[1], &caps[2], &caps[3]);
        let mut end = hm_to_minutes(&caps[4], &caps[5], &caps[6]);
        if end < start {
            // range crosses the am/pm boundary
            end += 12 * 60;
        }
        return Some((start, end));
    }

    None
}

/// Re-renders slot text as `H:MM - H:MM AM/PM` for display. Inputs that do
/// not match the pattern get a best-effort dot-to-colon substitution.
pub fn prettify_slot(slot: &str) -> String {
    if let Some(caps) = PRETTY_SLOT_RE.captures(slot) {
        let sh: u32 = caps[1].parse().unwrap_or(0);
        let sm: u32 = caps[2].parse().unwrap_or(0);
        let eh: u32 = caps[3].parse().unwrap_or(0);
        let em: u32 = caps[4].parse().unwrap_or(0);
        let meridiem = caps[5].to_uppercase();
        return format!("{sh}:{sm:02} - {eh}:{em:02} {meridiem}");
    }
    slot.trim().replace('.', ":")
}

fn hm_to_minutes(h: &str, m: &str, meridiem: &str) -> i32 {
    let mut hour: i32 = h.parse().unwrap_or(0);
    let mut min: i32 = m.parse().unwrap_or(0);
    if min > 59 {
        min /= 10;
    }

    if meridiem == "AM" {
        if hour == 12 {
            hour = 0;
        }
    } else if hour != 12 {
        hour += 12;
    }
    hour * 60 + min
}

/// Resolves the ambiguous start meridiem of a single-meridiem slot.
///
/// AM end: the start is AM too, wrapping back 12 hours only if the plain
/// reading lands after the end. PM end: both readings of the start are
/// scored; the first one giving a plausible class duration wins, un-wrapped
/// readings before 12-hour-wrapped ones.
fn infer_start_minutes(h: &str, m: &str, end: i32, end_meridiem: &str) -> Option<i32> {
    if end_meridiem == "AM" {
        let start = hm_to_minutes(h, m, "AM");
        if start <= end {
            return Some(start);
        }
        return Some((start - 12 * 60).max(0));
    }

    let start_am = hm_to_minutes(h, m, "AM");
    let start_pm = hm_to_minutes(h, m, "PM");
    let dur_am = end - start_am;
    let dur_pm = end - start_pm;

    if is_plausible_duration(dur_am) && start_am <= end {
        return Some(start_am);
    }
    if is_plausible_duration(dur_pm) && start_pm <= end {
        return Some(start_pm);
    }
    if is_plausible_duration(dur_am + 12 * 60) {
        return Some(start_am);
    }
    if is_plausible_duration(dur_pm + 12 * 60) {
        return Some(start_pm);
    }
    None
}

fn is_plausible_duration(minutes: i32) -> bool {
    minutes > 0 && minutes <= MAX_CLASS_MINUTES
}

/// Canonicalizes abbreviated weekday names to full English names. Unknown
/// forms pass through trimmed.
pub fn normalize_day_name(raw: &str) -> String {
    let d = raw.trim();
    let full = match d.to_lowercase().as_str() {
        "mon" => "Monday",
        "tue" => "Tuesday",
        "wed" => "Wednesday",
        "thu" => "Thursday",
        "fri" => "Friday",
        "sat" => "Saturday",
        "sun" => "Sunday",
        _ => return d.to_string(),
    };
    full.to_string()
}

/// Full English name for a `chrono` weekday.
pub fn weekday_full_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Today's full weekday name per the local clock.
pub fn today_weekday_name() -> &'static str {
    weekday_full_name(Local::now().weekday())
}
