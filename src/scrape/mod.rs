//! Per-page extraction of the portal's server-rendered HTML into domain
//! records. Every scraper resolves an absent table or row to an empty result,
//! never an error: the portal legitimately renders pages without them.

pub mod attendance;
pub mod results;
pub mod tables;
pub mod timetable;

pub use attendance::{
    scrape_attendance_summary, scrape_overall_attendance, scrape_period_attendance, scrape_profile,
};
pub use results::{scrape_result_periods, scrape_semester_results};
pub use tables::TableSpec;
pub use timetable::{match_key, scrape_course_roster, scrape_week_timetable};
