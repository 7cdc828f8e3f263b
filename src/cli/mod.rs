//! tippgpt CLI
//!
//! Commands:
//! - `tippgpt run --game-day <n>` - Predict every match of a match-day
//! - `tippgpt matches --game-day <n>` - List the match ids of a match-day
//! - `tippgpt prompt --match-id <id>` - Print the prompt for one match

pub mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;

/// Match predictions for a Kicktipp group
#[derive(Parser, Debug)]
#[command(name = "tippgpt")]
#[command(author, version, about = "Language-model match predictions for Kicktipp groups")]
pub struct Cli {
    /// Config directory (default.toml and the TIPPGPT_ENV file)
    #[arg(short, long, global = true, default_value = "config")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Values that replace their config counterparts
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Prediction group name
    #[arg(long, global = true, env = "KICKTIPP_GROUP_NAME")]
    pub group: Option<String>,

    /// Season id
    #[arg(long, global = true)]
    pub season: Option<String>,

    /// Directory for game_day_<n>.json
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Prompt template file
    #[arg(long, global = true)]
    pub template: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(group) = &self.group {
            config.site.group_name = group.clone();
        }
        if let Some(season) = &self.season {
            config.site.season_id = season.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(template) = &self.template {
            config.prompt.template_path = Some(template.clone());
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict all matches of a match-day and write the result file
    Run {
        /// Match-day index
        #[arg(short, long)]
        game_day: u32,
    },

    /// List the match ids of a match-day
    Matches {
        #[arg(short, long)]
        game_day: u32,
    },

    /// Extract one match and print its prompt without calling the model
    Prompt {
        #[arg(short, long)]
        match_id: String,
    },
}

impl Cli {
    /// Load the config directory and apply command-line overrides
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load_from(&self.config)
            .with_context(|| format!("Failed to load config from {}", self.config.display()))?;
        self.overrides.apply(&mut config);

        if let Err(errors) = config.validate() {
            anyhow::bail!("Invalid configuration:\n  {}", errors.join("\n  "));
        }
        Ok(config)
    }

    pub async fn run(self, config: AppConfig) -> Result<()> {
        match self.command {
            Commands::Run { game_day } => commands::run_game_day(&config, game_day).await,
            Commands::Matches { game_day } => commands::list_matches(&config, game_day).await,
            Commands::Prompt { match_id } => commands::show_prompt(&config, &match_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["tippgpt", "run", "--game-day", "3"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config"));
        assert!(matches!(cli.command, Commands::Run { game_day: 3 }));
    }

    #[test]
    fn test_parse_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tippgpt",
            "prompt",
            "--match-id",
            "1238193335",
            "--season",
            "42",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.overrides.season.as_deref(), Some("42"));
        assert!(matches!(cli.command, Commands::Prompt { ref match_id } if match_id == "1238193335"));
    }

    #[test]
    fn test_group_reads_kicktipp_group_name() {
        use clap::CommandFactory;

        let command = Cli::command();
        let group = command
            .get_arguments()
            .find(|arg| arg.get_id() == "group")
            .unwrap();
        assert_eq!(group.get_env(), Some(std::ffi::OsStr::new("KICKTIPP_GROUP_NAME")));
    }

    #[test]
    fn test_game_day_must_be_a_number() {
        assert!(Cli::try_parse_from(["tippgpt", "run", "--game-day", "drei"]).is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = AppConfig::default();
        let overrides = Overrides {
            group: Some("gaensheimer".to_string()),
            season: None,
            output_dir: Some(PathBuf::from("out")),
            template: Some(PathBuf::from("my_prompt.txt")),
        };
        overrides.apply(&mut config);

        assert_eq!(config.site.group_name, "gaensheimer");
        assert_eq!(config.site.season_id, "2813920");
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.prompt.template_path, Some(PathBuf::from("my_prompt.txt")));
    }
}
