//! Blocking HTTP client for the AMS portal.
//!
//! Drives the server-rendered page flow:
//! 1. GET the login page, carry its hidden fields, show the challenge image
//! 2. POST credentials + challenge answer, probe an authenticated page
//! 3. Replay postbacks (full and partial) against the carried view-state
//! 4. Scrape each rendered page into domain records
//!
//! The client holds no credentials and no page state; callers pass both in.
//! Once the session dies the only way back is a fresh login with a fresh
//! challenge answer, surfaced as `AmsError::SessionExpired`.

use crate::config::PortalConfig;
use crate::error::AmsError;
use crate::page::PageState;
use crate::postback::{extract_update_panel, PostbackForm};
use crate::results::{compute_cgpa, merge_semester_results};
use crate::scrape;
use crate::types::{
    Credentials, PeriodAttendanceItem, ResultType, SemesterResult, StudentDashboardData,
    StudentProfile, SubjectAttendanceItem,
};
use chrono::{Datelike, Local, Timelike};
use reqwest::blocking::Client;
use reqwest::header::{ORIGIN, REFERER};
use tracing::{debug, info, warn};
use url::Url;

// Login form controls.
const USERNAME_FIELD: &str = "txtUserName";
const PASSWORD_FIELD: &str = "txtPassword";
const CHALLENGE_FIELD: &str = "txtCaptcha";
const LOGIN_BUTTON_FIELD: &str = "Button1";
const LOGIN_BUTTON_LABEL: &str = "LET'S GO";

// Coursewise attendance controls on Attendance.aspx.
const SCRIPT_MANAGER_FIELD: &str = "ctl00$MainContent$ScriptManager1";
const COURSE_LIST_ID: &str = "MainContent_Courselist";
const COURSE_LIST_FIELD: &str = "ctl00$MainContent$Courselist";
const YEAR_LIST_ID: &str = "MainContent_DropDownList2";
const YEAR_LIST_FIELD: &str = "ctl00$MainContent$DropDownList2";
const MONTH_LIST_ID: &str = "MainContent_DropDownList1";
const MONTH_LIST_FIELD: &str = "ctl00$MainContent$DropDownList1";
const DATE_BOX_ID: &str = "MainContent_TextBox1";
const DATE_BOX_FIELD: &str = "ctl00$MainContent$TextBox1";
const VIEW_MODE_FIELD: &str = "ctl00$MainContent$g1";
const VIEW_MODE_COURSEWISE: &str = "RadioButton3";
const COURSEWISE_BUTTON_FIELD: &str = "ctl00$MainContent$Button1";
const COURSEWISE_BUTTON_LABEL: &str = "Coursewise Attendance";
const COURSEWISE_PANEL_FIELD: &str = "ctl00$MainContent$UpdatePanel6";
const COURSEWISE_PANEL_ID: &str = "MainContent_UpdatePanel6";
const FALLBACK_YEAR: &str = "2025";

// Results page controls on SemesterMark.aspx.
const PERIOD_LIST_FIELD: &str = "ctl00$MainContent$YoPList";
const RESULT_GROUP_FIELD: &str = "ctl00$MainContent$group1";

/// Body markers on an authenticated-only page that betray the login form.
const LOGIN_MARKERS: [&str; 2] = ["STUDENT LOGIN", "txtUserName"];

/// The login page's hidden fields plus the challenge image for the caller to
/// display and have solved.
#[derive(Debug, Clone)]
pub struct LoginPage {
    pub state: PageState,
    pub challenge_image: Vec<u8>,
}

/// Session-aware scraper client for the portal.
pub struct AmsClient {
    http: Client,
    config: PortalConfig,
}

impl AmsClient {
    /// Creates a client against the production portal.
    pub fn new() -> Result<Self, AmsError> {
        Self::with_config(PortalConfig::default())
    }

    /// Creates a client with custom configuration.
    ///
    /// The cookie store keeps the portal's session cookies across calls;
    /// multiple clients sharing out-of-band flows should each own their own
    /// instance so their cookies never cross.
    pub fn with_config(config: PortalConfig) -> Result<Self, AmsError> {
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| AmsError::Network {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    // ---------- session ----------

    /// Fetches the login page and challenge image.
    ///
    /// Fails structurally when the mandatory view-state tokens are absent:
    /// either the server changed shape or it returned an error page instead
    /// of the form.
    pub fn fetch_login_page(&self) -> Result<LoginPage, AmsError> {
        let login_url = self.config.login_url()?;
        info!(url = %login_url, "Fetching login page");

        let state = self.get_page(&login_url)?;
        state.require_postback_tokens("login page")?;

        let challenge_image = self.get_bytes(&self.config.captcha_url()?)?;
        debug!(
            hidden_fields = state.hidden_fields.len(),
            image_bytes = challenge_image.len(),
            "Login page ready"
        );

        Ok(LoginPage {
            state,
            challenge_image,
        })
    }

    /// Submits credentials plus the human-solved challenge answer, carrying
    /// the login page's hidden fields.
    ///
    /// Returns `Ok(false)` for rejected credentials or a wrong challenge
    /// answer, confirmed by probing an authenticated page. A non-2xx POST is
    /// a transport failure, not a login failure.
    pub fn login(
        &self,
        credentials: &Credentials,
        challenge_answer: &str,
        login_page: &PageState,
    ) -> Result<bool, AmsError> {
        let login_url = self.config.login_url()?;
        info!(url = %login_url, username = %credentials.username, "Submitting login");

        let mut form = PostbackForm::default();
        form.set(USERNAME_FIELD, &credentials.username)
            .set(PASSWORD_FIELD, &credentials.password)
            .set(CHALLENGE_FIELD, challenge_answer)
            .set(LOGIN_BUTTON_FIELD, LOGIN_BUTTON_LABEL)
            .carry_hidden(&login_page.hidden_fields);

        self.post_raw(&login_url, &form)?;

        let authenticated = self.is_session_valid();
        if authenticated {
            info!("Login confirmed by authenticated-page probe");
        } else {
            warn!("Login POST accepted but probe still sees the login form");
        }
        Ok(authenticated)
    }

    /// Probes a known authenticated-only page. Any transport error means
    /// "not valid" (fail-closed).
    pub fn is_session_valid(&self) -> bool {
        let Ok(url) = self.config.attendance_url() else {
            return false;
        };
        match self.get_text(&url) {
            Ok(html) => !login_form_present(&html),
            Err(e) => {
                debug!(error = %e, "Session probe failed, treating as invalid");
                false
            }
        }
    }

    /// Raises the distinguished session-expired condition when the probe
    /// fails. There is no silent re-login: the challenge needs a human.
    fn ensure_session(&self) -> Result<(), AmsError> {
        if self.is_session_valid() {
            Ok(())
        } else {
            Err(AmsError::SessionExpired)
        }
    }

    // ---------- attendance page ----------

    /// Student name and branch from the attendance page.
    pub fn fetch_student_profile(&self) -> Result<StudentProfile, AmsError> {
        self.ensure_session()?;
        let page = self.get_page(&self.config.attendance_url()?)?;
        Ok(scrape::scrape_profile(&page.document()))
    }

    /// The per-subject attendance summary grid.
    pub fn fetch_attendance_summary(&self) -> Result<Vec<SubjectAttendanceItem>, AmsError> {
        self.ensure_session()?;
        let page = self.get_page(&self.config.attendance_url()?)?;
        let items = scrape::scrape_attendance_summary(&page.document());
        info!(subjects = items.len(), "Scraped attendance summary");
        Ok(items)
    }

    /// Per-session attendance for one subject, via the coursewise partial
    /// postback. An empty result means the portal has no rows for the
    /// selection, not a failure.
    pub fn fetch_subject_attendance(
        &self,
        subject_code: &str,
        subject_name: &str,
    ) -> Result<Vec<PeriodAttendanceItem>, AmsError> {
        self.ensure_session()?;

        let attendance_url = self.config.attendance_url()?;
        let page = self.get_page(&attendance_url)?;
        page.require_postback_tokens("attendance page")?;
        let document = page.document();

        // The dropdown values look like "CS101-Data Structures"; resolve the
        // exact one for this code.
        let prefix = format!("{subject_code}-");
        let Some(course_value) = scrape::tables::option_values(&document, COURSE_LIST_ID)
            .into_iter()
            .find(|v| v.starts_with(&prefix))
        else {
            debug!(subject_code, "Subject not present in course dropdown");
            return Ok(Vec::new());
        };

        let year = scrape::tables::option_values(&document, YEAR_LIST_ID)
            .into_iter()
            .find(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("Select Year"))
            .unwrap_or_else(|| FALLBACK_YEAR.to_string());
        let month = scrape::tables::selected_or_first_option(&document, MONTH_LIST_ID);

        let mut form = PostbackForm::new("");
        form.async_partial(SCRIPT_MANAGER_FIELD, COURSEWISE_PANEL_FIELD, COURSEWISE_BUTTON_FIELD);
        if let Some(date_value) = scrape::tables::value_by_id(&document, DATE_BOX_ID) {
            form.set(DATE_BOX_FIELD, &date_value);
        }
        form.set(COURSE_LIST_FIELD, &course_value)
            .set(YEAR_LIST_FIELD, &year);
        if let Some(month) = month.filter(|m| !m.trim().is_empty()) {
            form.set(MONTH_LIST_FIELD, &month);
        }
        form.set(VIEW_MODE_FIELD, VIEW_MODE_COURSEWISE)
            .set(COURSEWISE_BUTTON_FIELD, COURSEWISE_BUTTON_LABEL)
            .carry_hidden(&page.hidden_fields);

        info!(subject_code, course_value = %course_value, "Requesting coursewise attendance");
        let delta = self.post_partial(&attendance_url, &form)?;

        let Some(panel_html) = extract_update_panel(&delta, COURSEWISE_PANEL_ID) else {
            debug!(panel = COURSEWISE_PANEL_ID, "Delta carried no update for the panel");
            return Ok(Vec::new());
        };

        let items = scrape::scrape_period_attendance(&panel_html, subject_name);
        info!(subject_code, sessions = items.len(), "Scraped coursewise attendance");
        Ok(items)
    }

    /// Composes the dashboard aggregate: profile, overall attendance, weekly
    /// timetable with live statuses, and the CGPA over regular results.
    pub fn fetch_dashboard_data(&self) -> Result<StudentDashboardData, AmsError> {
        self.ensure_session()?;

        let page = self.get_page(&self.config.attendance_url()?)?;
        let document = page.document();

        let profile = scrape::scrape_profile(&document);
        let roster = scrape::scrape_course_roster(&document);

        let now = Local::now();
        let now_minutes = (now.hour() * 60 + now.minute()) as i32;
        let week_timetable =
            scrape::scrape_week_timetable(&document, &roster, now.weekday(), now_minutes);

        let overall_attendance_percent = scrape::scrape_overall_attendance(&document);

        let results = self.fetch_all_results(ResultType::Regular)?;
        let overall_gpa = compute_cgpa(&results);

        info!(
            student = %profile.student_name,
            days = week_timetable.len(),
            semesters = results.len(),
            "Dashboard data assembled"
        );

        Ok(StudentDashboardData {
            student_name: profile.student_name,
            branch: profile.branch,
            overall_attendance_percent,
            overall_gpa,
            week_timetable,
        })
    }

    // ---------- results page ----------

    /// Period tokens available in the results dropdown.
    pub fn fetch_available_result_periods(&self) -> Result<Vec<String>, AmsError> {
        self.ensure_session()?;
        let page = self.get_page(&self.config.semester_mark_url()?)?;
        Ok(scrape::scrape_result_periods(&page.document()))
    }

    /// Results for one period and one result type, via the fixed three-step
    /// sequence: load page, select period, select result-type radio.
    pub fn fetch_results_for_period(
        &self,
        period: &str,
        result_type: ResultType,
    ) -> Result<Vec<SemesterResult>, AmsError> {
        self.ensure_session()?;
        let url = self.config.semester_mark_url()?;

        let s0 = self.get_page(&url)?;
        s0.require_postback_tokens("results page")?;

        let mut select_period = PostbackForm::new(PERIOD_LIST_FIELD);
        select_period
            .set(PERIOD_LIST_FIELD, period)
            .carry_hidden(&s0.hidden_fields);
        let s1 = self.post_page(&url, &select_period)?;
        s1.require_postback_tokens("results page")?;

        let mut select_type = PostbackForm::new(result_type.event_target());
        select_type
            .set(PERIOD_LIST_FIELD, period)
            .set(RESULT_GROUP_FIELD, result_type.group_value())
            .carry_hidden(&s1.hidden_fields);
        let s2 = self.post_page(&url, &select_type)?;

        let results = scrape::scrape_semester_results(&s2.document());
        debug!(period, ?result_type, semesters = results.len(), "Scraped period results");
        Ok(results)
    }

    /// Results across every available period, merged per semester.
    ///
    /// Periods are processed strictly sequentially: each postback chain
    /// depends on the page state the previous one rendered.
    pub fn fetch_all_results(&self, result_type: ResultType) -> Result<Vec<SemesterResult>, AmsError> {
        self.ensure_session()?;

        let periods = self.fetch_available_result_periods()?;
        if periods.is_empty() {
            return Ok(Vec::new());
        }

        let mut batches = Vec::with_capacity(periods.len());
        for period in &periods {
            batches.push(self.fetch_results_for_period(period, result_type)?);
        }

        let merged = merge_semester_results(batches);
        info!(
            periods = periods.len(),
            semesters = merged.len(),
            ?result_type,
            "Merged semester results"
        );
        Ok(merged)
    }

    // ---------- transport ----------

    fn get_text(&self, url: &Url) -> Result<String, AmsError> {
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AmsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }

    fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, AmsError> {
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AmsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    fn get_page(&self, url: &Url) -> Result<PageState, AmsError> {
        Ok(PageState::from_html(self.get_text(url)?))
    }

    /// Full postback: the response is a complete document to re-extract
    /// hidden fields from.
    fn post_page(&self, url: &Url, form: &PostbackForm) -> Result<PageState, AmsError> {
        Ok(PageState::from_html(self.post_raw(url, form)?))
    }

    /// Partial postback: the response is a pipe-delimited delta stream.
    fn post_partial(&self, url: &Url, form: &PostbackForm) -> Result<String, AmsError> {
        let response = self
            .http
            .post(url.clone())
            .header(REFERER, url.as_str())
            .header(ORIGIN, self.config.base_url.trim_end_matches('/'))
            .header("X-Requested-With", "XMLHttpRequest")
            .header("X-MicrosoftAjax", "Delta=true")
            .form(form.fields())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AmsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }

    fn post_raw(&self, url: &Url, form: &PostbackForm) -> Result<String, AmsError> {
        let response = self
            .http
            .post(url.clone())
            .header(REFERER, url.as_str())
            .header(ORIGIN, self.config.base_url.trim_end_matches('/'))
            .form(form.fields())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AmsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }
}

/// True when an authenticated-only page body shows the login form instead.
pub(crate) fn login_form_present(html: &str) -> bool {
    LOGIN_MARKERS.iter().any(|marker| html.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_present() {
        assert!(login_form_present("<h1>STUDENT LOGIN</h1>"));
        assert!(login_form_present(r#"<input name="txtUserName" />"#));
        assert!(!login_form_present(
            r#"<span id="MainContent_lblName">A STUDENT</span>"#
        ));
    }

    #[test]
    fn test_session_expired_needs_reauth() {
        assert!(AmsError::SessionExpired.needs_reauth());
        assert!(!AmsError::Network {
            message: "timeout".into()
        }
        .needs_reauth());
    }
}
