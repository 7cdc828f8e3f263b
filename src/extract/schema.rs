//! Page schemas: where the data lives on each page.
//!
//! The site's markup is matched by CSS selector and cell position only, so
//! every structural assumption is collected here.

/// One text field read from the prediction row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    Kickoff,
    HomeTeam,
    GuestTeam,
    Quota,
}

/// The "submit predictions" page of a match-day
#[derive(Debug, Clone, Copy)]
pub struct PredictionListSchema {
    /// Table whose body rows are the matches
    pub table: &'static str,
    /// Regex with an `id` group; rows without a match are not match rows
    pub match_id_pattern: &'static str,
}

/// The detail page of a single match.
///
/// Table selectors list the live site's class names and their descriptive
/// counterparts, the same way the match id pattern takes both input names.
#[derive(Debug, Clone, Copy)]
pub struct MatchDetailSchema {
    pub prediction_table: &'static str,
    /// Rows the prediction table body must have
    pub expected_rows: usize,
    /// Cells of the prediction row, read in `fields` order
    pub field_cell: &'static str,
    pub fields: &'static [SummaryField],
    pub home_history: &'static str,
    pub guest_history: &'static str,
    pub standings: &'static str,
    /// Column names forced onto both history tables
    pub history_header: &'static [&'static str],
    /// Competition codes in the first history column
    pub abbreviations: &'static [(&'static str, &'static str)],
}

pub const PREDICTION_LIST: PredictionListSchema = PredictionListSchema {
    table: "table#tippabgabeSpiele",
    match_id_pattern: r"(?:spieltippForms|formArray)\[(?P<id>\d+)\]",
};

pub const MATCH_DETAIL: MatchDetailSchema = MatchDetailSchema {
    prediction_table: "table#tippabgabeSpiele",
    expected_rows: 1,
    field_cell: "td.nw",
    fields: &[
        SummaryField::Kickoff,
        SummaryField::HomeTeam,
        SummaryField::GuestTeam,
        SummaryField::Quota,
    ],
    home_history: "table.spielinfoHeim, table.home-team-history",
    guest_history: "table.spielinfoGast, table.guest-team-history",
    standings: "table.sporttabelle.drei_punkte_regel, table.group-standings-with-three-point-rule",
    history_header: &["Type", "Home", "Away", "Result"],
    abbreviations: &[
        ("EMQ", "EM 2024 Qualifikation"),
        ("NL", "Nations League"),
        ("WM", "WM 2022"),
        ("WMQ", "WM 2022 Qualifikation"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_selectors_parse() {
        for css in [
            PREDICTION_LIST.table,
            MATCH_DETAIL.prediction_table,
            MATCH_DETAIL.field_cell,
            MATCH_DETAIL.home_history,
            MATCH_DETAIL.guest_history,
            MATCH_DETAIL.standings,
        ] {
            assert!(Selector::parse(css).is_ok(), "selector {css} should parse");
        }
    }

    #[test]
    fn test_pattern_compiles() {
        let re = regex::Regex::new(PREDICTION_LIST.match_id_pattern).unwrap();
        let caps = re.captures(r#"name="spieltippForms[1238193335].heimTipp""#).unwrap();
        assert_eq!(&caps["id"], "1238193335");
        assert!(re.is_match("formArray[111]"));
        assert!(!re.is_match("formArray[abc]"));
    }

    #[test]
    fn test_header_matches_field_count() {
        assert_eq!(MATCH_DETAIL.history_header.len(), 4);
        assert_eq!(MATCH_DETAIL.fields.len(), 4);
    }
}
