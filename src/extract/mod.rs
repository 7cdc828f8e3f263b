//! Match data extraction
//!
//! Turns the site's pages into match ids and [`MatchSummary`] values. The
//! parsing functions are pure and work on an already parsed document;
//! [`MatchExtractor`] pairs them with a logged-in session.

pub mod schema;
pub mod table;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::adapters::kicktipp::{match_detail_path, prediction_list_path, SiteSession};
use crate::domain::{parse_kickoff, MatchSummary};
use crate::error::{Result, TippError};
use schema::{MatchDetailSchema, PredictionListSchema, SummaryField};
use table::{child_elements, element_text, DataTable};

pub use schema::{MATCH_DETAIL, PREDICTION_LIST};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TippError::Internal(format!("Invalid selector '{}': {:?}", css, e)))
}

fn find<'a>(doc: &'a Html, css: &str) -> Result<ElementRef<'a>> {
    doc.select(&selector(css)?)
        .next()
        .ok_or_else(|| TippError::extraction(format!("No element matches '{}'", css)))
}

fn table_body(table: ElementRef<'_>) -> Result<ElementRef<'_>> {
    child_elements(table)
        .find(|e| e.value().name() == "tbody")
        .ok_or_else(|| TippError::extraction("Table has no body"))
}

fn body_rows(body: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    child_elements(body).filter(|e| e.value().name() == "tr").collect()
}

/// Match ids from the prediction list page, in page order
pub fn parse_match_ids(doc: &Html, schema: &PredictionListSchema) -> Result<Vec<String>> {
    let pattern = Regex::new(schema.match_id_pattern)
        .map_err(|e| TippError::Internal(format!("Invalid match id pattern: {}", e)))?;

    let table = find(doc, schema.table)?;
    let body = table_body(table)?;

    let ids = body_rows(body)
        .into_iter()
        .filter_map(|row| {
            let html = row.html();
            pattern.captures(&html).map(|caps| caps["id"].to_string())
        })
        .collect();

    Ok(ids)
}

fn history_table(doc: &Html, css: &str, schema: &MatchDetailSchema) -> Result<DataTable> {
    let mut table = DataTable::from_element(find(doc, css)?);
    table.substitute_labels(0, schema.abbreviations);
    table.rename_columns(schema.history_header)?;
    Ok(table)
}

/// Build the summary from a match detail page
pub fn parse_match_summary(doc: &Html, schema: &MatchDetailSchema) -> Result<MatchSummary> {
    let prediction_table = find(doc, schema.prediction_table)?;
    let rows = body_rows(table_body(prediction_table)?);
    if rows.len() != schema.expected_rows {
        return Err(TippError::extraction(format!(
            "Prediction table has {} rows, expected {}",
            rows.len(),
            schema.expected_rows
        )));
    }

    let cell_selector = selector(schema.field_cell)?;
    let cells: Vec<String> = rows
        .iter()
        .flat_map(|row| row.select(&cell_selector))
        .map(element_text)
        .collect();
    if cells.len() != schema.fields.len() {
        return Err(TippError::extraction(format!(
            "Prediction row has {} '{}' cells, expected {}",
            cells.len(),
            schema.field_cell,
            schema.fields.len()
        )));
    }

    let field = |wanted: SummaryField| -> String {
        schema
            .fields
            .iter()
            .position(|f| *f == wanted)
            .map(|i| cells[i].clone())
            .unwrap_or_default()
    };

    let standings = DataTable::from_element(find(doc, schema.standings)?);
    let group = standings.headers.first().cloned().unwrap_or_default();

    let summary = MatchSummary {
        home_team: field(SummaryField::HomeTeam),
        guest_team: field(SummaryField::GuestTeam),
        group,
        quota: field(SummaryField::Quota),
        home_recent_form: history_table(doc, schema.home_history, schema)?.to_markdown(),
        guest_recent_form: history_table(doc, schema.guest_history, schema)?.to_markdown(),
        group_standings: standings.to_markdown(),
        kickoff_time: parse_kickoff(&field(SummaryField::Kickoff))?,
    };
    summary.validate()?;

    Ok(summary)
}

/// Reads match-days and matches through a logged-in session
pub struct MatchExtractor {
    session: SiteSession,
    season_id: String,
    list_schema: PredictionListSchema,
    detail_schema: MatchDetailSchema,
}

impl MatchExtractor {
    pub fn new(session: SiteSession, season_id: impl Into<String>) -> Self {
        Self {
            session,
            season_id: season_id.into(),
            list_schema: PREDICTION_LIST,
            detail_schema: MATCH_DETAIL,
        }
    }

    pub async fn list_match_ids(&self, match_day: u32) -> Result<Vec<String>> {
        let body = self
            .session
            .fetch_text(&prediction_list_path(&self.season_id, match_day), None)
            .await?;
        let ids = parse_match_ids(&Html::parse_document(&body), &self.list_schema)?;
        debug!("Match-day {}: {} matches", match_day, ids.len());
        Ok(ids)
    }

    pub async fn extract(&self, match_id: &str) -> Result<MatchSummary> {
        let body = self
            .session
            .fetch_text(&match_detail_path(&self.season_id, match_id), None)
            .await?;
        parse_match_summary(&Html::parse_document(&body), &self.detail_schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LIST_PAGE: &str = include_str!("../../tests/fixtures/tippabgabe.html");
    const DETAIL_PAGE: &str = include_str!("../../tests/fixtures/spielinfo.html");

    fn detail_with_rows(rows: usize) -> String {
        let row = r#"<tr><td class="nw">14.06.24 21:00</td><td class="nw">Deutschland</td><td class="nw">Schottland</td><td class="nw">1,25 / 6,50 / 11,00</td></tr>"#;
        DETAIL_PAGE.replace(
            "<!-- prediction-rows -->",
            &row.repeat(rows.saturating_sub(1)),
        )
    }

    #[test]
    fn test_list_match_ids_in_page_order() {
        let doc = Html::parse_document(LIST_PAGE);
        let ids = parse_match_ids(&doc, &PREDICTION_LIST).unwrap();
        assert_eq!(ids, vec!["111", "222"]);
    }

    #[test]
    fn test_list_without_table_fails() {
        let doc = Html::parse_document("<html><body><p>Bitte einloggen</p></body></html>");
        assert!(matches!(
            parse_match_ids(&doc, &PREDICTION_LIST),
            Err(TippError::Extraction(_))
        ));
    }

    #[test]
    fn test_extract_summary() {
        let doc = Html::parse_document(&detail_with_rows(1));
        let summary = parse_match_summary(&doc, &MATCH_DETAIL).unwrap();

        assert_eq!(summary.home_team, "Deutschland");
        assert_eq!(summary.guest_team, "Schottland");
        assert_eq!(summary.quota, "1,25 / 6,50 / 11,00");
        assert_eq!(summary.group, "Gruppe A");
        assert_eq!(
            summary.kickoff_time,
            NaiveDate::from_ymd_opt(2024, 6, 14).unwrap().and_hms_opt(21, 0, 0).unwrap()
        );
        assert!(summary.home_recent_form.contains("Type"));
        assert!(summary.home_recent_form.contains("Result"));
        assert!(summary.group_standings.contains("Schweiz"));
        assert!(summary.guest_recent_form.contains("Norwegen"));
    }

    #[test]
    fn test_extract_requires_exactly_one_row() {
        for rows in [0usize, 2] {
            let page = if rows == 0 {
                let start = DETAIL_PAGE.find("<!-- row -->").unwrap();
                let end = DETAIL_PAGE.find("<!-- /row -->").unwrap();
                format!("{}{}", &DETAIL_PAGE[..start], &DETAIL_PAGE[end..])
            } else {
                detail_with_rows(rows)
            };
            let doc = Html::parse_document(&page);
            let err = parse_match_summary(&doc, &MATCH_DETAIL).unwrap_err();
            assert!(
                err.to_string().contains(&format!("has {} rows", rows)),
                "unexpected error for {rows} rows: {err}"
            );
        }
    }

    fn type_column(table: &DataTable) -> Vec<&str> {
        table.rows.iter().map(|row| row[0].as_str()).collect()
    }

    #[test]
    fn test_abbreviations_are_expanded() {
        let doc = Html::parse_document(&detail_with_rows(1));
        let home = history_table(&doc, MATCH_DETAIL.home_history, &MATCH_DETAIL).unwrap();
        let guest = history_table(&doc, MATCH_DETAIL.guest_history, &MATCH_DETAIL).unwrap();

        assert_eq!(home.headers, vec!["Type", "Home", "Away", "Result"]);
        assert_eq!(
            type_column(&home),
            vec!["EM 2024 Qualifikation", "Nations League", "WM 2022"]
        );
        assert_eq!(
            type_column(&guest),
            vec!["WM 2022 Qualifikation", "EM 2024 Qualifikation"]
        );
        assert_eq!(guest.rows[0][2], "Norwegen");
    }

    #[test]
    fn test_each_abbreviation_maps_to_its_long_form() {
        let page = |code: &str| {
            format!(
                r#"<html><body><table class="spielinfoHeim"><tbody>
                <tr><td>{code}</td><td>A</td><td>B</td><td>1:0</td></tr>
                </tbody></table></body></html>"#
            )
        };
        for (code, full) in MATCH_DETAIL.abbreviations {
            let doc = Html::parse_document(&page(code));
            let table = history_table(&doc, MATCH_DETAIL.home_history, &MATCH_DETAIL).unwrap();
            assert_eq!(table.rows[0][0], *full, "code {code}");
        }
        assert_eq!(MATCH_DETAIL.abbreviations.len(), 4);
    }

    #[test]
    fn test_descriptive_table_classes_are_accepted() {
        let page = detail_with_rows(1)
            .replace(r#"class="spielinfoHeim""#, r#"class="home-team-history""#)
            .replace(r#"class="spielinfoGast""#, r#"class="guest-team-history""#)
            .replace(
                r#"class="sporttabelle drei_punkte_regel""#,
                r#"class="group-standings-with-three-point-rule""#,
            );
        let doc = Html::parse_document(&page);
        let summary = parse_match_summary(&doc, &MATCH_DETAIL).unwrap();

        assert_eq!(summary.group, "Gruppe A");
        assert!(summary.home_recent_form.contains("Nations League"));
        assert!(summary.guest_recent_form.contains("Norwegen"));
    }

    #[test]
    fn test_missing_auxiliary_table_fails() {
        let page = detail_with_rows(1).replace("spielinfoGast", "somethingElse");
        let doc = Html::parse_document(&page);
        let err = parse_match_summary(&doc, &MATCH_DETAIL).unwrap_err();
        assert!(err.to_string().contains("spielinfoGast"));
    }

    #[test]
    fn test_unparseable_kickoff_fails() {
        let page = detail_with_rows(1).replacen("14.06.24 21:00", "morgen", 1);
        let doc = Html::parse_document(&page);
        let err = parse_match_summary(&doc, &MATCH_DETAIL).unwrap_err();
        assert!(err.to_string().contains("kickoff"));
    }
}
