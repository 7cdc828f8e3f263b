use chrono::NaiveDateTime;

use crate::error::{Result, TippError};

/// Kickoff text on the site, e.g. `14.06.24 21:00`
pub const KICKOFF_FORMAT: &str = "%d.%m.%y %H:%M";

/// Parse the site's kickoff text (two-digit day, month and year, 24h time)
pub fn parse_kickoff(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), KICKOFF_FORMAT)
        .map_err(|e| TippError::extraction(format!("Unparseable kickoff '{}': {}", text.trim(), e)))
}

/// Everything known about one match before prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    pub home_team: String,
    pub guest_team: String,
    /// Group/table name, taken from the standings header
    pub group: String,
    /// Bookmaker odds exactly as shown on the page
    pub quota: String,
    /// Markdown tables
    pub home_recent_form: String,
    pub guest_recent_form: String,
    pub group_standings: String,
    pub kickoff_time: NaiveDateTime,
}

impl MatchSummary {
    /// Fails if any text field is blank
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("home_team", &self.home_team),
            ("guest_team", &self.guest_team),
            ("group", &self.group),
            ("quota", &self.quota),
            ("home_recent_form", &self.home_recent_form),
            ("guest_recent_form", &self.guest_recent_form),
            ("group_standings", &self.group_standings),
        ];

        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(TippError::extraction(format!("Match summary field '{}' is empty", name))),
            None => Ok(()),
        }
    }
}
