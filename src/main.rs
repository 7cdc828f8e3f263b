use clap::Parser;
use tippgpt::cli::Cli;
use tippgpt::config::LoggingConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!("{:#}", e);
            std::process::exit(2);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = cli.run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,tippgpt={}", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
