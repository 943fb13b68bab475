//! Postback construction and partial-update (delta) payload scanning.
//!
//! The server validates every postback against the view-state carried from
//! the previous render. Omitting any previously-seen hidden field gets the
//! request rejected, so forms always start from the full hidden-field set and
//! only override what the triggering control changes.

/// Marker field that turns a postback into a partial (async) one.
const ASYNC_POST_FIELD: &str = "__ASYNCPOST";

/// Delta stream section kind carrying a re-rendered region.
const UPDATE_PANEL_KIND: &str = "updatePanel";

/// An ordered name/value form body for one postback.
///
/// First-set-wins: fields set explicitly shadow same-named fields carried
/// over from the previous page's hidden set.
#[derive(Debug, Default)]
pub struct PostbackForm {
    fields: Vec<(String, String)>,
}

impl PostbackForm {
    /// Starts a form with the event-plumbing triple. `event_target` names the
    /// control that conceptually triggered the postback; empty when a button
    /// field carries the trigger instead.
    pub fn new(event_target: &str) -> Self {
        let mut form = Self::default();
        form.set("__EVENTTARGET", event_target);
        form.set("__EVENTARGUMENT", "");
        form.set("__LASTFOCUS", "");
        form
    }

    /// Sets a field unless it was already set.
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        if !self.contains(name) {
            self.fields.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Carries forward every hidden field from the previous page that the
    /// form has not already overridden.
    pub fn carry_hidden<'a>(
        &mut self,
        hidden: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> &mut Self {
        for (name, value) in hidden {
            self.set(name, value);
        }
        self
    }

    /// Marks this form as a partial postback scoped to `panel` and names the
    /// triggering `control` for the script manager.
    pub fn async_partial(&mut self, script_manager: &str, panel: &str, control: &str) -> &mut Self {
        self.set(script_manager, &format!("{panel}|{control}"));
        self.set(ASYNC_POST_FIELD, "true");
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// The form body as ordered pairs, ready for urlencoding.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Scans a pipe-delimited delta stream for the `updatePanel` section whose
/// region id matches, returning its HTML payload.
///
/// The stream is a sequence of `length|kind|id|payload|` records; the engine
/// only needs the one re-rendered region, so a linear scan over the
/// pipe-split parts suffices. `None` means the region was not re-rendered,
/// which the caller treats as "no rows", not a failure.
pub fn extract_update_panel(delta: &str, panel_id: &str) -> Option<String> {
    let parts: Vec<&str> = delta.split('|').collect();
    for i in 0..parts.len().saturating_sub(2) {
        if parts[i] == UPDATE_PANEL_KIND && parts[i + 1] == panel_id {
            return Some(parts[i + 2].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_event_fields_come_first() {
        let form = PostbackForm::new("ctl00$MainContent$YoPList");
        let fields = form.fields();
        assert_eq!(fields[0], ("__EVENTTARGET".into(), "ctl00$MainContent$YoPList".into()));
        assert_eq!(fields[1].0, "__EVENTARGUMENT");
        assert_eq!(fields[2].0, "__LASTFOCUS");
    }

    #[test]
    fn test_carried_hidden_does_not_clobber_event_fields() {
        let mut hidden = HashMap::new();
        hidden.insert("__EVENTTARGET".to_string(), "stale".to_string());
        hidden.insert("__VIEWSTATE".to_string(), "vs".to_string());

        let mut form = PostbackForm::new("fresh");
        form.carry_hidden(&hidden);

        let target = form
            .fields()
            .iter()
            .filter(|(n, _)| n == "__EVENTTARGET")
            .collect::<Vec<_>>();
        assert_eq!(target.len(), 1);
        assert_eq!(target[0].1, "fresh");
        assert!(form.contains("__VIEWSTATE"));
    }

    #[test]
    fn test_explicit_override_beats_hidden() {
        let mut hidden = HashMap::new();
        hidden.insert("ctl00$MainContent$YoPList".to_string(), "Nov.2024".to_string());

        let mut form = PostbackForm::new("");
        form.set("ctl00$MainContent$YoPList", "Nov.2025");
        form.carry_hidden(&hidden);

        let values: Vec<_> = form
            .fields()
            .iter()
            .filter(|(n, _)| n == "ctl00$MainContent$YoPList")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(values, vec!["Nov.2025"]);
    }

    #[test]
    fn test_async_partial_fields() {
        let mut form = PostbackForm::new("");
        form.async_partial(
            "ctl00$MainContent$ScriptManager1",
            "ctl00$MainContent$UpdatePanel6",
            "ctl00$MainContent$Button1",
        );
        assert!(form.fields().iter().any(|(n, v)| {
            n == "ctl00$MainContent$ScriptManager1"
                && v == "ctl00$MainContent$UpdatePanel6|ctl00$MainContent$Button1"
        }));
        assert!(form.fields().iter().any(|(n, v)| n == "__ASYNCPOST" && v == "true"));
    }

    #[test]
    fn test_extract_update_panel() {
        let delta = "123|updatePanel|MainContent_UpdatePanel6|<div><table id=\"t\"></table></div>|8|hiddenField|__VIEWSTATE|abc|";
        let panel = extract_update_panel(delta, "MainContent_UpdatePanel6");
        assert_eq!(panel.as_deref(), Some("<div><table id=\"t\"></table></div>"));
    }

    #[test]
    fn test_extract_update_panel_missing_region() {
        let delta = "8|hiddenField|__VIEWSTATE|abc|";
        assert!(extract_update_panel(delta, "MainContent_UpdatePanel6").is_none());
    }

    #[test]
    fn test_extract_update_panel_picks_matching_region() {
        let delta = "1|updatePanel|Other|<p>no</p>|1|updatePanel|Wanted|<p>yes</p>|";
        assert_eq!(
            extract_update_panel(delta, "Wanted").as_deref(),
            Some("<p>yes</p>")
        );
    }
}
