//! Match-day run orchestration
//!
//! list ids → per id: extract → render → predict → record. A failure inside
//! one match is logged and the match skipped; failures while listing or
//! writing the result end the run.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::agent::Predictor;
use crate::domain::{MatchPrediction, MatchSummary, RunResult};
use crate::error::Result;
use crate::extract::MatchExtractor;
use crate::prompt::PromptTemplate;

/// Where match ids and summaries come from
#[async_trait]
pub trait MatchSource: Send + Sync {
    async fn list_match_ids(&self, match_day: u32) -> Result<Vec<String>>;
    async fn extract(&self, match_id: &str) -> Result<MatchSummary>;
}

#[async_trait]
impl MatchSource for MatchExtractor {
    async fn list_match_ids(&self, match_day: u32) -> Result<Vec<String>> {
        MatchExtractor::list_match_ids(self, match_day).await
    }

    async fn extract(&self, match_id: &str) -> Result<MatchSummary> {
        MatchExtractor::extract(self, match_id).await
    }
}

/// A match that was dropped from the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMatch {
    pub match_id: String,
    pub reason: String,
}

/// Outcome of one match-day
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub match_day: u32,
    pub result: RunResult,
    pub skipped: Vec<SkippedMatch>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.result.len() + self.skipped.len()
    }
}

/// Output file name for a match-day
pub fn output_file_name(match_day: u32) -> String {
    format!("game_day_{}.json", match_day)
}

/// Write the whole result as one JSON document.
///
/// The file is written next to its final name and renamed into place, so a
/// reader never sees a partial file.
pub fn write_run_result(dir: &Path, match_day: u32, result: &RunResult) -> Result<PathBuf> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }

    let target = dir.join(output_file_name(match_day));
    let staging = dir.join(format!(".{}.tmp", output_file_name(match_day)));

    let json = serde_json::to_vec_pretty(result)?;
    if let Err(e) = fs::write(&staging, json).and_then(|_| fs::rename(&staging, &target)) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }

    Ok(target)
}

/// Read a result file back
pub fn read_run_result(path: &Path) -> Result<RunResult> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Drives the pipeline for one match-day
pub struct Orchestrator<S, P> {
    source: S,
    predictor: P,
    template: PromptTemplate,
}

impl<S: MatchSource, P: Predictor> Orchestrator<S, P> {
    pub fn new(source: S, predictor: P, template: PromptTemplate) -> Self {
        Self {
            source,
            predictor,
            template,
        }
    }

    async fn predict_match(&self, match_id: &str) -> Result<MatchPrediction> {
        let summary = self.source.extract(match_id).await?;
        let prompt = self.template.render(&summary);
        let response = self.predictor.request(&prompt).await?;
        Ok(MatchPrediction { prompt, response })
    }

    /// Process every match of the day, in list order
    pub async fn run(&self, match_day: u32) -> Result<RunReport> {
        let match_ids = self.source.list_match_ids(match_day).await?;
        info!("Match-day {}: {} matches to predict", match_day, match_ids.len());

        let mut report = RunReport {
            match_day,
            ..RunReport::default()
        };

        for match_id in match_ids {
            match self.predict_match(&match_id).await {
                Ok(prediction) => {
                    info!(match_id = %match_id, "Prediction recorded");
                    report.result.insert(match_id, prediction);
                }
                Err(e) => {
                    warn!(match_id = %match_id, error = %e, "Skipping match");
                    report.skipped.push(SkippedMatch {
                        match_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Run the match-day and write `game_day_{n}.json` into `out_dir`
    pub async fn run_to_file(&self, match_day: u32, out_dir: &Path) -> Result<(PathBuf, RunReport)> {
        let report = self.run(match_day).await?;
        let path = write_run_result(out_dir, match_day, &report.result)?;
        info!(
            "Wrote {} predictions to {} ({} skipped)",
            report.result.len(),
            path.display(),
            report.skipped.len()
        );
        Ok((path, report))
    }
}
