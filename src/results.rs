//! Grade-point arithmetic and multi-period result aggregation.
//!
//! The results page carries no per-subject credit weights, so TGPA is an
//! unweighted mean of grade points and CGPA weights each semester by its
//! subject count. Both are approximations and documented as such.

use crate::types::{SemesterResult, SubjectGrade};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SEMESTER_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());

/// Grade letter to grade points. Fail/withheld variants and anything
/// unrecognized score 0.
pub fn grade_points(grade: &str) -> f64 {
    let g = grade.trim().to_uppercase();
    match g.as_str() {
        "O" => 10.0,
        "S" | "A+" => 9.0,
        "A" => 8.0,
        "B+" => 7.0,
        "B" => 6.0,
        "C" => 5.0,
        "D" => 4.0,
        _ => 0.0,
    }
}

/// Equal-weight TGPA over a semester's subjects, rounded to 2 decimals.
/// Subjects with a blank grade are excluded; fails count as 0 in the mean.
/// No valid-grade subjects means 0.0.
pub fn compute_tgpa(subjects: &[SubjectGrade]) -> f64 {
    let graded: Vec<f64> = subjects
        .iter()
        .filter(|s| !s.grade.trim().is_empty())
        .map(|s| grade_points(&s.grade))
        .collect();

    if graded.is_empty() {
        return 0.0;
    }
    round2(graded.iter().sum::<f64>() / graded.len() as f64)
}

/// Subject-count-weighted CGPA over all semesters, rounded to 2 decimals.
pub fn compute_cgpa(results: &[SemesterResult]) -> f64 {
    let mut total_points = 0.0;
    let mut total_subjects = 0usize;

    for sr in results {
        if sr.subjects.is_empty() {
            continue;
        }
        total_points += sr.tgpa * sr.subjects.len() as f64;
        total_subjects += sr.subjects.len();
    }

    if total_subjects == 0 {
        return 0.0;
    }
    round2(total_points / total_subjects as f64)
}

/// First integer found in a semester label ("Semester 3" → 3), 0 when none.
pub fn extract_semester_number(semester_name: &str) -> u32 {
    SEMESTER_NUMBER_RE
        .captures(semester_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Merges per-period result batches into one list keyed by semester number.
///
/// The same semester can show up under differently-labelled fetch periods;
/// the instance with more subjects wins as a proxy for completeness. Output
/// is sorted ascending by semester number.
pub fn merge_semester_results(
    batches: impl IntoIterator<Item = Vec<SemesterResult>>,
) -> Vec<SemesterResult> {
    let mut by_number: BTreeMap<u32, SemesterResult> = BTreeMap::new();

    for batch in batches {
        for sr in batch {
            let number = extract_semester_number(&sr.semester_name);
            if number == 0 {
                continue;
            }
            match by_number.get(&number) {
                Some(existing) if existing.subjects.len() >= sr.subjects.len() => {}
                _ => {
                    by_number.insert(number, sr);
                }
            }
        }
    }

    by_number.into_values().collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semester(name: &str, tgpa: f64, subject_count: usize) -> SemesterResult {
        SemesterResult {
            semester_name: name.to_string(),
            tgpa,
            subjects: (0..subject_count)
                .map(|i| SubjectGrade {
                    subject_name: format!("Subject {i}"),
                    grade: "A".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_grade_points_table() {
        assert_eq!(grade_points("O"), 10.0);
        assert_eq!(grade_points("S"), 9.0);
        assert_eq!(grade_points("A+"), 9.0);
        assert_eq!(grade_points("a"), 8.0);
        assert_eq!(grade_points("B+"), 7.0);
        assert_eq!(grade_points("D"), 4.0);
        assert_eq!(grade_points("RA"), 0.0);
        assert_eq!(grade_points("WH1"), 0.0);
        assert_eq!(grade_points("??"), 0.0);
    }

    #[test]
    fn test_tgpa_includes_fails_as_zero() {
        let subjects = vec![
            SubjectGrade { subject_name: "x".into(), grade: "O".into() },
            SubjectGrade { subject_name: "y".into(), grade: "F".into() },
        ];
        assert_eq!(compute_tgpa(&subjects), 5.0);
    }

    #[test]
    fn test_tgpa_skips_blank_grades() {
        let subjects = vec![
            SubjectGrade { subject_name: "x".into(), grade: "A".into() },
            SubjectGrade { subject_name: "y".into(), grade: "  ".into() },
        ];
        assert_eq!(compute_tgpa(&subjects), 8.0);
    }

    #[test]
    fn test_tgpa_empty_is_zero() {
        assert_eq!(compute_tgpa(&[]), 0.0);
    }

    #[test]
    fn test_cgpa_is_subject_count_weighted() {
        let results = vec![semester("Semester 1", 8.0, 5), semester("Semester 2", 6.0, 3)];
        // (8.0*5 + 6.0*3) / 8 = 7.25
        assert_eq!(compute_cgpa(&results), 7.25);
    }

    #[test]
    fn test_cgpa_empty_is_zero() {
        assert_eq!(compute_cgpa(&[]), 0.0);
        assert_eq!(compute_cgpa(&[semester("Semester 1", 8.0, 0)]), 0.0);
    }

    #[test]
    fn test_extract_semester_number() {
        assert_eq!(extract_semester_number("Semester 3"), 3);
        assert_eq!(extract_semester_number("SEM-12"), 12);
        assert_eq!(extract_semester_number("no digits"), 0);
    }

    #[test]
    fn test_merge_keeps_larger_subject_list() {
        let merged = merge_semester_results(vec![
            vec![semester("Semester 3", 7.0, 4)],
            vec![semester("Semester 3", 7.5, 6), semester("Semester 1", 8.0, 5)],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].semester_name, "Semester 1");
        assert_eq!(merged[1].subjects.len(), 6);
        assert_eq!(merged[1].tgpa, 7.5);
    }

    #[test]
    fn test_merge_first_wins_on_tie() {
        let merged = merge_semester_results(vec![
            vec![semester("Semester 2", 7.0, 4)],
            vec![semester("Semester 2", 9.0, 4)],
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].tgpa, 7.0);
    }
}
