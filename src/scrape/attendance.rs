//! Scrapers for the attendance page: profile labels, the summary grid, the
//! overall percentage, and the coursewise (per-session) fragment.

use super::tables::{self, TableSpec};
use crate::page::lenient_int;
use crate::types::{PeriodAttendanceItem, StudentProfile, SubjectAttendanceItem};
use scraper::Html;
use tracing::debug;

const NAME_LABEL_ID: &str = "MainContent_lblName";
const BRANCH_LABEL_ID: &str = "MainContent_lblBranch";
const SUMMARY_GRID_ID: &str = "MainContent_GridView4";
const PERIOD_GRID_ID: &str = "MainContent_GridView1";

/// The attendance summary grid: one row per enrolled subject.
const SUMMARY_GRID: TableSpec = TableSpec {
    anchor_id: SUMMARY_GRID_ID,
    header_rows: 1,
    min_columns: 13,
};

/// The coursewise attendance grid inside the update-panel fragment.
const PERIOD_GRID: TableSpec = TableSpec {
    anchor_id: PERIOD_GRID_ID,
    header_rows: 1,
    min_columns: 7,
};

/// Student name and branch from the attendance page labels.
pub fn scrape_profile(document: &Html) -> StudentProfile {
    StudentProfile {
        student_name: tables::text_by_id(document, NAME_LABEL_ID),
        branch: tables::text_by_id(document, BRANCH_LABEL_ID),
    }
}

/// All rows of the attendance summary grid. Missing grid means no rows.
pub fn scrape_attendance_summary(document: &Html) -> Vec<SubjectAttendanceItem> {
    let Some(rows) = SUMMARY_GRID.rows(document) else {
        debug!(grid = SUMMARY_GRID_ID, "attendance summary grid absent");
        return Vec::new();
    };

    rows.iter()
        .map(|cols| SubjectAttendanceItem {
            subject_code: cols[1].clone(),
            subject_name: cols[2].clone(),
            total_sessions: lenient_int(&cols[4]),
            conducted_sessions: lenient_int(&cols[5]),
            attended_sessions: lenient_int(&cols[6]),
            absent: lenient_int(&cols[7]),
            present_percentage: lenient_int(&cols[8]),
            overall_percentage: lenient_int(&cols[9]),
            faculty_name: cols[12].clone(),
        })
        .collect()
}

/// Aggregate attendance percentage over the summary grid.
///
/// Per row, the denominator is the best available of: the "faculty sessions
/// held" column, present + absent, the "total sessions" column. Rows with no
/// usable denominator contribute nothing. `-1.0` means no row contributed.
pub fn scrape_overall_attendance(document: &Html) -> f64 {
    let Some(table) = tables::find_by_id(document, SUMMARY_GRID_ID) else {
        return -1.0;
    };

    let header = tables::header_texts(&table);
    let total_idx = header_position(&header, |h| h.contains("total sessions"), 4);
    let faculty_idx = header_position(&header, |h| h.contains("faculty sessions"), 5);
    let present_idx = header_position(&header, |h| h == "present", 6);
    let absent_idx = header_position(&header, |h| h == "absent", 7);

    let mut sum_present = 0u64;
    let mut sum_denom = 0u64;

    for cols in tables::raw_rows(&table).iter().skip(1) {
        let needed = total_idx.max(faculty_idx).max(present_idx);
        if cols.len() <= needed {
            continue;
        }

        let present = lenient_int(&cols[present_idx]) as u64;
        let faculty = lenient_int(&cols[faculty_idx]) as u64;
        let absent = cols
            .get(absent_idx)
            .map(|c| lenient_int(c) as u64)
            .unwrap_or(0);
        let total = lenient_int(&cols[total_idx]) as u64;

        let mut denom = faculty;
        if denom == 0 && present + absent > 0 {
            denom = present + absent;
        }
        if denom == 0 {
            denom = total;
        }

        if denom > 0 {
            sum_present += present;
            sum_denom += denom;
        }
    }

    if sum_denom == 0 {
        return -1.0;
    }
    (sum_present as f64) * 100.0 / (sum_denom as f64)
}

/// Per-session rows out of a coursewise-attendance fragment.
///
/// The fragment comes from a partial postback; an empty or panel-less delta
/// legitimately means "no rows".
pub fn scrape_period_attendance(fragment_html: &str, course_name: &str) -> Vec<PeriodAttendanceItem> {
    let document = Html::parse_document(fragment_html);
    let Some(rows) = PERIOD_GRID.rows(&document) else {
        debug!(grid = PERIOD_GRID_ID, "period attendance grid absent");
        return Vec::new();
    };

    rows.iter()
        .map(|cols| PeriodAttendanceItem {
            course_name: course_name.to_string(),
            date: truncate_at_space(&cols[4]),
            time_slot: cols[5].clone(),
            present: cols[6].eq_ignore_ascii_case("P"),
        })
        .collect()
}

/// The portal renders dates as `dd/mm/yyyy 12:00:00 AM`; keep the date part.
fn truncate_at_space(date: &str) -> String {
    date.split_whitespace().next().unwrap_or_default().to_string()
}

/// Index of the first header cell matching the predicate (case-folded), with
/// the portal's historical column position as the fallback.
fn header_position(header: &[String], pred: impl Fn(&str) -> bool, fallback: usize) -> usize {
    header
        .iter()
        .position(|h| pred(&h.trim().to_lowercase()))
        .unwrap_or(fallback)
}
