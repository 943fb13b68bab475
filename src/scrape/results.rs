//! Scrapers for the semester results page.

use super::tables::{self, TableSpec};
use crate::results::compute_tgpa;
use crate::types::{SemesterResult, SubjectGrade};
use scraper::Html;
use std::collections::BTreeMap;
use tracing::debug;

const PERIOD_SELECT_ID: &str = "MainContent_YoPList";
const RESULTS_GRID_ID: &str = "MainContent_GridView1";

/// Placeholder option label on the period dropdown.
const PERIOD_PLACEHOLDER: &str = "Select YoR";

/// Results grid rows: semester at 2, course at 4, grade at 6.
const RESULTS_GRID: TableSpec = TableSpec {
    anchor_id: RESULTS_GRID_ID,
    header_rows: 1,
    min_columns: 7,
};

/// Period tokens (e.g. `Nov.2025`) from the dropdown, placeholders excluded.
pub fn scrape_result_periods(document: &Html) -> Vec<String> {
    tables::option_values(document, PERIOD_SELECT_ID)
        .into_iter()
        .filter(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case(PERIOD_PLACEHOLDER))
        .collect()
}

/// Parses the results grid into per-semester results with TGPA computed.
///
/// Rows are grouped by semester number; an absent grid or one with only a
/// header yields no results (the portal renders the page that way before any
/// results are published).
pub fn scrape_semester_results(document: &Html) -> Vec<SemesterResult> {
    let Some(rows) = RESULTS_GRID.rows(document) else {
        debug!(grid = RESULTS_GRID_ID, "results grid absent");
        return Vec::new();
    };

    let mut by_semester: BTreeMap<u32, Vec<SubjectGrade>> = BTreeMap::new();
    for cols in rows {
        let semester_no = crate::page::lenient_int(&cols[2]);
        if semester_no == 0 {
            continue;
        }
        by_semester.entry(semester_no).or_default().push(SubjectGrade {
            subject_name: cols[4].clone(),
            grade: cols[6].clone(),
        });
    }

    by_semester
        .into_iter()
        .map(|(no, subjects)| {
            let tgpa = compute_tgpa(&subjects);
            SemesterResult {
                semester_name: format!("Semester {no}"),
                tgpa,
                subjects,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_result_periods_filters_placeholders() {
        let html = r#"
            <select id="MainContent_YoPList">
                <option value="0">Select YoR</option>
                <option value="Select YoR">Select YoR</option>
                <option value="">-</option>
                <option value="Apr.2025">Apr.2025</option>
                <option value="Nov.2025">Nov.2025</option>
            </select>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(scrape_result_periods(&doc), vec!["Apr.2025", "Nov.2025"]);
    }

    #[test]
    fn test_scrape_result_periods_missing_dropdown() {
        let doc = Html::parse_document("<p></p>");
        assert!(scrape_result_periods(&doc).is_empty());
    }

    #[test]
    fn test_scrape_semester_results_groups_and_sorts() {
        let html = r#"
            <table id="MainContent_GridView1">
                <tr><th>S.No</th><th>Reg</th><th>Sem</th><th>Code</th>
                    <th>Course</th><th>Credits</th><th>Grade</th></tr>
                <tr><td>1</td><td>R1</td><td>2</td><td>CS201</td>
                    <td>Algorithms</td><td>-</td><td>A</td></tr>
                <tr><td>2</td><td>R1</td><td>1</td><td>CS101</td>
                    <td>Programming</td><td>-</td><td>O</td></tr>
                <tr><td>3</td><td>R1</td><td>1</td><td>MA101</td>
                    <td>Calculus</td><td>-</td><td>B+</td></tr>
                <tr><td>4</td><td>R1</td><td>0</td><td>XX</td>
                    <td>Skipped</td><td>-</td><td>F</td></tr>
            </table>
        "#;
        let doc = Html::parse_document(html);
        let results = scrape_semester_results(&doc);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].semester_name, "Semester 1");
        assert_eq!(results[0].subjects.len(), 2);
        // O=10, B+=7 → 8.5
        assert!((results[0].tgpa - 8.5).abs() < 1e-9);
        assert_eq!(results[1].semester_name, "Semester 2");
        assert_eq!(results[1].subjects[0].grade, "A");
    }

    #[test]
    fn test_scrape_semester_results_empty_page() {
        let doc = Html::parse_document("<html><body>No results yet</body></html>");
        assert!(scrape_semester_results(&doc).is_empty());
    }
}
