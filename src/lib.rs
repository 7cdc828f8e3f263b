pub mod adapters;
pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod runner;
pub mod secrets;

pub use adapters::{SessionToken, SiteSession};
pub use agent::{PredictionClient, PredictionConfig, Predictor};
pub use config::AppConfig;
pub use domain::{MatchPrediction, MatchSummary, RunResult};
pub use error::{Result, TippError};
pub use extract::MatchExtractor;
pub use prompt::PromptTemplate;
pub use runner::{write_run_result, MatchSource, Orchestrator, RunReport};
pub use secrets::{Credentials, Secret, SecretChain, SecretId, SecretProvider};
