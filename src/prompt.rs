//! Prompt rendering
//!
//! Templates are plain text with `{{ field }}` placeholders for the match
//! summary fields. They are parsed once; rendering is a single pass, so text
//! inserted from a field is never expanded again.

use std::path::Path;

use crate::domain::MatchSummary;
use crate::error::{Result, TippError};

/// German default template
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/prompt.txt");

const KICKOFF_DISPLAY: &str = "%d.%m.%Y um %H:%M Uhr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    HomeTeam,
    GuestTeam,
    Group,
    Quota,
    HomeRecentForm,
    GuestRecentForm,
    GroupStandings,
    KickoffTime,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "home_team" => Field::HomeTeam,
            "guest_team" => Field::GuestTeam,
            "group" => Field::Group,
            "quota" => Field::Quota,
            "home_recent_form" => Field::HomeRecentForm,
            "guest_recent_form" => Field::GuestRecentForm,
            "group_standings" => Field::GroupStandings,
            "kickoff_time" => Field::KickoffTime,
            _ => return None,
        })
    }

    fn value(&self, summary: &MatchSummary) -> String {
        match self {
            Field::HomeTeam => summary.home_team.clone(),
            Field::GuestTeam => summary.guest_team.clone(),
            Field::Group => summary.group.clone(),
            Field::Quota => summary.quota.clone(),
            Field::HomeRecentForm => summary.home_recent_form.clone(),
            Field::GuestRecentForm => summary.guest_recent_form.clone(),
            Field::GroupStandings => summary.group_standings.clone(),
            Field::KickoffTime => summary.kickoff_time.format(KICKOFF_DISPLAY).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| TippError::Template("Unclosed '{{' in template".to_string()))?;
            let name = after[..end].trim();
            let field = Field::from_name(name)
                .ok_or_else(|| TippError::Template(format!("Unknown placeholder '{}'", name)))?;
            segments.push(Segment::Field(field));
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            TippError::Template(format!("Cannot read template {}: {}", path.display(), e))
        })?;
        Self::parse(&source)
    }

    /// Template from `path`, or the embedded default
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::parse(DEFAULT_TEMPLATE),
        }
    }

    pub fn render(&self, summary: &MatchSummary) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(&field.value(summary)),
            }
        }
        out
    }
}
