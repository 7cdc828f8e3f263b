//! Command handlers

use anyhow::{Context, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{debug, info, warn};

use crate::adapters::SiteSession;
use crate::agent::{PredictionClient, PredictionConfig};
use crate::config::AppConfig;
use crate::extract::MatchExtractor;
use crate::prompt::PromptTemplate;
use crate::runner::{Orchestrator, RunReport};
use crate::secrets::{Credentials, SecretChain};

fn resolve_credentials(config: &AppConfig) -> Credentials {
    let chain = SecretChain::from_config(config);
    debug!("Secret providers: {}", chain.provider_names().join(", "));

    let credentials = Credentials::resolve(&chain);
    for id in credentials.missing() {
        debug!("No value for {}", id);
    }
    credentials
}

async fn open_extractor(config: &AppConfig, credentials: &Credentials) -> Result<MatchExtractor> {
    let session = SiteSession::login(
        &config.site,
        credentials.site_username.as_ref(),
        credentials.site_password.as_ref(),
    )
    .await
    .context("Login failed")?;

    Ok(MatchExtractor::new(session, config.site.season_id.clone()))
}

fn load_template(config: &AppConfig) -> Result<PromptTemplate> {
    let template = PromptTemplate::load_or_default(config.prompt.template_path.as_deref())?;
    match &config.prompt.template_path {
        Some(path) => info!("Using prompt template {}", path.display()),
        None => debug!("Using built-in prompt template"),
    }
    Ok(template)
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Match")]
    match_id: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn report_table(report: &RunReport) -> String {
    let mut rows: Vec<MatchRow> = report
        .result
        .match_ids()
        .map(|id| MatchRow {
            match_id: id.to_string(),
            status: "predicted".to_string(),
        })
        .collect();
    rows.extend(report.skipped.iter().map(|s| MatchRow {
        match_id: s.match_id.clone(),
        status: format!("skipped: {}", s.reason),
    }));

    Table::new(rows).with(Style::rounded()).to_string()
}

/// `tippgpt run`
pub async fn run_game_day(config: &AppConfig, game_day: u32) -> Result<()> {
    let credentials = resolve_credentials(config);
    let template = load_template(config)?;

    let prediction_config = PredictionConfig::new(&config.llm, &credentials);
    if !prediction_config.is_configured() {
        warn!("No API key resolved; requests to {} are sent without one", prediction_config.base_url);
    }
    let predictor = PredictionClient::new(prediction_config)?;

    let extractor = open_extractor(config, &credentials).await?;
    let orchestrator = Orchestrator::new(extractor, predictor, template);

    let (path, report) = orchestrator
        .run_to_file(game_day, &config.output.dir)
        .await
        .with_context(|| format!("Match-day {} failed", game_day))?;

    println!("{}", report_table(&report));
    println!(
        "{} of {} matches predicted, written to {}",
        report.result.len(),
        report.total(),
        path.display()
    );
    Ok(())
}

/// `tippgpt matches`
pub async fn list_matches(config: &AppConfig, game_day: u32) -> Result<()> {
    let credentials = resolve_credentials(config);
    let extractor = open_extractor(config, &credentials).await?;

    let ids = extractor
        .list_match_ids(game_day)
        .await
        .with_context(|| format!("Failed to list match-day {}", game_day))?;

    for id in &ids {
        println!("{}", id);
    }
    info!("{} matches on match-day {}", ids.len(), game_day);
    Ok(())
}

/// `tippgpt prompt`
pub async fn show_prompt(config: &AppConfig, match_id: &str) -> Result<()> {
    let credentials = resolve_credentials(config);
    let template = load_template(config)?;
    let extractor = open_extractor(config, &credentials).await?;

    let summary = extractor
        .extract(match_id)
        .await
        .with_context(|| format!("Failed to extract match {}", match_id))?;

    println!("{}", template.render(&summary));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchPrediction, RunResult};
    use crate::runner::SkippedMatch;

    #[test]
    fn test_report_table_lists_skipped_matches() {
        let mut result = RunResult::new();
        result.insert(
            "111",
            MatchPrediction {
                prompt: "p".to_string(),
                response: "Tipp: 2:1".to_string(),
            },
        );
        let report = RunReport {
            match_day: 1,
            result,
            skipped: vec![SkippedMatch {
                match_id: "222".to_string(),
                reason: "HTTP 500".to_string(),
            }],
        };

        let table = report_table(&report);
        assert!(table.contains("111"));
        assert!(table.contains("predicted"));
        assert!(table.contains("skipped: HTTP 500"));
    }
}
