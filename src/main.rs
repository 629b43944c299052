use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use house_sales_etl::{cli, config::Settings};
use owo_colors::OwoColorize;
use std::path::Path;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// House sales ETL: moves real-estate sales from PostgreSQL through a CSV snapshot into Elasticsearch
#[derive(Parser)]
#[command(name = "hsetl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings and credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the source table into a fresh snapshot
    Extract,

    /// Clean the current snapshot in place
    Clean,

    /// Index every row of the cleaned snapshot
    Load,

    /// Run extract, clean and load once, with retries
    Run,

    /// Show the pipeline and its next scheduled runs
    Plan {
        /// How many upcoming runs to list
        #[arg(short, long, default_value_t = 3)]
        count: usize,
    },

    /// Run the pipeline on its schedule until stopped
    Daemon,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if Path::new(&cli.env).exists() {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Plan { count } => cli::plan(count)?,
        command => {
            let settings = Settings::from_env()?;
            log::debug!("Settings:\n{}", settings);
            run_command(command, &settings).await?;
        }
    }

    Ok(())
}

async fn run_command(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Extract => {
            log::info!("Extracting to {}", settings.snapshot_path.display().bright_black());
            cli::extract(settings).await?;
        }
        Commands::Clean => {
            cli::clean(settings)?;
        }
        Commands::Load => {
            log::info!(
                "Loading {} into index {}",
                settings.snapshot_path.display().bright_black(),
                settings.elasticsearch.index.cyan()
            );
            cli::load(settings).await?;
        }
        Commands::Run => {
            let report = cli::run(settings).await?;
            log::info!("{}", report);
        }
        Commands::Daemon => {
            cli::daemon(settings).await?;
        }
        Commands::Plan { count } => cli::plan(count)?,
    }
    Ok(())
}
