//! Scraper client for Vel Tech's AMS student portal.
//!
//! The portal is a legacy server-rendered multi-page application with no API:
//! session cookies, server-side view-state, and partial-page AJAX updates.
//! This crate logs in against it (challenge image included), replays
//! postbacks with the carried view-state, and converts its positional HTML
//! tables into stable typed records: profile, weekly timetable with live
//! statuses, attendance summaries, per-session attendance, and semester
//! results with TGPA/CGPA approximations.
//!
//! All operations are blocking and meant to run off any UI thread. Nothing
//! here persists state; caching and credential storage belong to the caller.

pub mod client;
pub mod config;
pub mod error;
pub mod page;
pub mod postback;
pub mod results;
pub mod scrape;
pub mod status;
pub mod types;

pub use client::{AmsClient, LoginPage};
pub use config::PortalConfig;
pub use error::AmsError;
pub use page::PageState;
pub use types::{
    ClassStatus, Credentials, PeriodAttendanceItem, ResultType, SemesterResult,
    StudentDashboardData, StudentProfile, SubjectAttendanceItem, SubjectGrade, TimetableItem,
};
