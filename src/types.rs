//! Domain records scraped from the portal.
//!
//! All records are created fresh on each successful scrape and never mutated
//! afterwards; staleness is the caller's concern.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Student login credentials. Opaque beyond being non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The only client-side validation the portal contract allows.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Real-time state of a timetable slot relative to "now".
///
/// Recomputed on every scrape (and periodically while a view is active);
/// never cached as ground truth since it depends on wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassStatus {
    Upcoming,
    OnGoing,
    Completed,
}

impl ClassStatus {
    /// Canonicalizes the portal's free-text status strings.
    pub fn from_portal_text(text: &str) -> Self {
        let t = text.trim().to_lowercase();
        if t == "on going" || t == "ongoing" || t == "live" {
            ClassStatus::OnGoing
        } else if t == "completed" || t == "done" {
            ClassStatus::Completed
        } else {
            ClassStatus::Upcoming
        }
    }
}

impl std::fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassStatus::Upcoming => write!(f, "Upcoming"),
            ClassStatus::OnGoing => write!(f, "On Going"),
            ClassStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// One cell of the weekly timetable grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableItem {
    pub code: String,
    pub subject: String,
    pub time: String,
    pub status: ClassStatus,
}

/// Identity scraped once per session refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_name: String,
    pub branch: String,
}

/// One row of the attendance summary grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectAttendanceItem {
    pub subject_name: String,
    pub subject_code: String,
    pub faculty_name: String,
    pub total_sessions: u32,
    pub attended_sessions: u32,
    pub conducted_sessions: u32,
    pub absent: u32,
    pub present_percentage: u32,
    pub overall_percentage: u32,
}

impl SubjectAttendanceItem {
    /// Classes that can still be skipped while staying at or above 75%.
    /// Returns `None` when the subject is already below the threshold or no
    /// classes were held yet.
    pub fn classes_to_spare(&self) -> Option<i32> {
        if self.conducted_sessions == 0 {
            return None;
        }
        let attended = self.attended_sessions as f64;
        let conducted = self.conducted_sessions as f64;
        if attended / conducted * 100.0 < 75.0 {
            return None;
        }
        Some(((4.0 * attended - 3.0 * conducted) / 3.0).floor() as i32)
    }

    /// Consecutive classes that must be attended to climb back to 75%.
    /// Returns `None` when already at or above the threshold.
    pub fn classes_needed(&self) -> Option<i32> {
        if self.conducted_sessions == 0 {
            return None;
        }
        let attended = self.attended_sessions as f64;
        let conducted = self.conducted_sessions as f64;
        if attended / conducted * 100.0 >= 75.0 {
            return None;
        }
        Some((3.0 * conducted - 4.0 * attended).ceil() as i32)
    }
}

/// One delivered session of one subject, from the coursewise attendance view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodAttendanceItem {
    pub course_name: String,
    pub date: String,
    pub time_slot: String,
    pub present: bool,
}

/// A single subject's letter grade within a semester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectGrade {
    pub subject_name: String,
    pub grade: String,
}

/// Grades for one semester, with the equal-weight TGPA approximation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterResult {
    pub semester_name: String,
    pub tgpa: f64,
    pub subjects: Vec<SubjectGrade>,
}

/// Result category selected via the radio group on the results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultType {
    Regular,
    Arrear,
    Revaluation,
}

impl ResultType {
    /// Value posted for the `group1` radio group.
    pub fn group_value(&self) -> &'static str {
        match self {
            ResultType::Regular => "RadioButton1",
            ResultType::Arrear => "RadioButton2",
            ResultType::Revaluation => "RadioButton3",
        }
    }

    /// `__EVENTTARGET` naming the radio control.
    pub fn event_target(&self) -> &'static str {
        match self {
            ResultType::Regular => "ctl00$MainContent$RadioButton1",
            ResultType::Arrear => "ctl00$MainContent$RadioButton2",
            ResultType::Revaluation => "ctl00$MainContent$RadioButton3",
        }
    }
}

/// Aggregate handed to the dashboard view.
///
/// `overall_attendance_percent` is `-1.0` when no attendance row contributed
/// a usable denominator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentDashboardData {
    pub student_name: String,
    pub branch: String,
    pub overall_attendance_percent: f64,
    pub overall_gpa: f64,
    /// Keyed by full English weekday name.
    pub week_timetable: HashMap<String, Vec<TimetableItem>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_canonicalization() {
        assert_eq!(ClassStatus::from_portal_text("On Going"), ClassStatus::OnGoing);
        assert_eq!(ClassStatus::from_portal_text("ON GOING"), ClassStatus::OnGoing);
        assert_eq!(ClassStatus::from_portal_text("Completed"), ClassStatus::Completed);
        assert_eq!(ClassStatus::from_portal_text("whatever"), ClassStatus::Upcoming);
        assert_eq!(ClassStatus::from_portal_text(""), ClassStatus::Upcoming);
    }

    #[test]
    fn test_classes_to_spare_above_threshold() {
        // 30 of 36 attended = 83.3%; can skip floor((120 - 108) / 3) = 4
        let item = attendance(30, 36);
        assert_eq!(item.classes_to_spare(), Some(4));
        assert_eq!(item.classes_needed(), None);
    }

    #[test]
    fn test_classes_needed_below_threshold() {
        // 20 of 36 attended = 55.6%; needs ceil(108 - 80) = 28
        let item = attendance(20, 36);
        assert_eq!(item.classes_needed(), Some(28));
        assert_eq!(item.classes_to_spare(), None);
    }

    #[test]
    fn test_no_classes_held() {
        let item = attendance(0, 0);
        assert_eq!(item.classes_to_spare(), None);
        assert_eq!(item.classes_needed(), None);
    }

    fn attendance(attended: u32, conducted: u32) -> SubjectAttendanceItem {
        SubjectAttendanceItem {
            subject_name: "Test".to_string(),
            subject_code: "T101".to_string(),
            faculty_name: String::new(),
            total_sessions: conducted,
            attended_sessions: attended,
            conducted_sessions: conducted,
            absent: conducted - attended,
            present_percentage: 0,
            overall_percentage: 0,
        }
    }
}
