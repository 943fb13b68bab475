//! Portal endpoint and transport configuration.

use crate::error::AmsError;
use std::time::Duration;
use url::Url;

/// Base URL of the AMS portal.
const AMS_BASE_URL: &str = "https://ams.veltech.edu.in/";

/// Page paths relative to the base URL.
const LOGIN_PATH: &str = "index.aspx";
const CAPTCHA_PATH: &str = "Captcha.aspx";
const ATTENDANCE_PATH: &str = "Attendance.aspx";
const SEMESTER_MARK_PATH: &str = "SemesterMark.aspx";

/// Configuration for the portal client.
///
/// All pages live under one base URL; the portal offers no API, so these are
/// the server-rendered pages the engine navigates.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the portal
    pub base_url: String,
    /// Connect timeout for every request
    pub connect_timeout: Duration,
    /// Read timeout for every request
    pub read_timeout: Duration,
    /// User agent string sent on every request
    pub user_agent: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: AMS_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(25),
            read_timeout: Duration::from_secs(25),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl PortalConfig {
    pub fn login_url(&self) -> Result<Url, AmsError> {
        self.join(LOGIN_PATH)
    }

    pub fn captcha_url(&self) -> Result<Url, AmsError> {
        self.join(CAPTCHA_PATH)
    }

    pub fn attendance_url(&self) -> Result<Url, AmsError> {
        self.join(ATTENDANCE_PATH)
    }

    pub fn semester_mark_url(&self) -> Result<Url, AmsError> {
        self.join(SEMESTER_MARK_PATH)
    }

    fn join(&self, path: &str) -> Result<Url, AmsError> {
        let base = Url::parse(&self.base_url)?;
        Ok(base.join(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let config = PortalConfig::default();
        assert_eq!(
            config.login_url().unwrap().as_str(),
            "https://ams.veltech.edu.in/index.aspx"
        );
        assert_eq!(
            config.semester_mark_url().unwrap().as_str(),
            "https://ams.veltech.edu.in/SemesterMark.aspx"
        );
    }

    #[test]
    fn test_custom_base_url() {
        let config = PortalConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..PortalConfig::default()
        };
        assert_eq!(
            config.attendance_url().unwrap().as_str(),
            "http://localhost:8080/Attendance.aspx"
        );
    }
}
