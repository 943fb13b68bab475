//! Weekly timetable grid and the enrolled-course roster that resolves
//! subject names to course codes.

use super::tables::{self, TableSpec};
use crate::status::{compute_status_at, normalize_day_name};
use crate::types::TimetableItem;
use chrono::Weekday;
use scraper::Html;
use std::collections::HashMap;
use tracing::debug;

const ROSTER_GRID_ID: &str = "MainContent_GridView3";
const TIMETABLE_GRID_ID: &str = "MainContent_GridTimetable";

/// Enrolled-course roster rows: code at 2, name at 3.
const ROSTER_GRID: TableSpec = TableSpec {
    anchor_id: ROSTER_GRID_ID,
    header_rows: 1,
    min_columns: 4,
};

/// Cells the timetable grid uses for non-classes.
const EMPTY_CELL_MARKERS: [&str; 2] = ["-", "Break"];

/// Builds the normalized-name → course-code map from the roster grid.
///
/// The timetable grid names subjects without codes, with punctuation and
/// spacing that drifts from the roster's, so matching runs on a normalized
/// key.
pub fn scrape_course_roster(document: &Html) -> HashMap<String, String> {
    let Some(rows) = ROSTER_GRID.rows(document) else {
        debug!(grid = ROSTER_GRID_ID, "course roster grid absent");
        return HashMap::new();
    };

    let mut name_to_code = HashMap::new();
    for cols in rows {
        let code = cols[2].clone();
        let name = &cols[3];
        if !code.is_empty() && !name.is_empty() {
            name_to_code.insert(match_key(name), code);
        }
    }
    name_to_code
}

/// Lowercased, ampersand spelled out, non-alphanumerics stripped. Both sides
/// of a roster lookup go through this.
pub fn match_key(s: &str) -> String {
    s.replace('&', "and")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Scrapes the weekly grid into per-day items, statuses computed against the
/// given clock.
///
/// The header row's `th` cells (after the day-name column) carry the slot
/// texts; each following row is one day. Unresolvable subject names fall
/// back to using the name as the code.
pub fn scrape_week_timetable(
    document: &Html,
    roster: &HashMap<String, String>,
    today: Weekday,
    now_minutes: i32,
) -> HashMap<String, Vec<TimetableItem>> {
    let mut by_day = HashMap::new();

    let Some(table) = tables::find_by_id(document, TIMETABLE_GRID_ID) else {
        debug!(grid = TIMETABLE_GRID_ID, "timetable grid absent");
        return by_day;
    };

    let headers = tables::header_texts(&table);
    if headers.len() < 2 {
        return by_day;
    }
    let slots = &headers[1..];

    for cols in tables::raw_rows(&table) {
        if cols.len() < 2 {
            continue;
        }
        let day = normalize_day_name(&cols[0]);
        let mut day_items = Vec::new();

        for (slot_idx, subject) in cols[1..].iter().enumerate() {
            if slot_idx >= slots.len() {
                break;
            }
            let subject = subject.trim();
            if subject.is_empty()
                || EMPTY_CELL_MARKERS
                    .iter()
                    .any(|m| subject.eq_ignore_ascii_case(m))
            {
                continue;
            }

            let time = slots[slot_idx].clone();
            let code = roster
                .get(&match_key(subject))
                .filter(|c| !c.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| subject.to_string());
            let status = compute_status_at(&day, &time, today, now_minutes);

            day_items.push(TimetableItem {
                code,
                subject: subject.to_string(),
                time,
                status,
            });
        }

        by_day.insert(day, day_items);
    }

    by_day
}
