use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use school_rankings::dataset::Dataset;
use school_rankings::error::RankingError;
use school_rankings::logging::{self, LogConfig, LogFormat};
use school_rankings::models::{RankRequest, Ranking};
use school_rankings::{ranking, report};

#[derive(Parser)]
#[command(name = "school-rankings")]
#[command(about = "Top school rankings from NFL draft records", long_about = None)]
struct Cli {
    /// Draft table (.csv or spreadsheet workbook)
    #[arg(long, env = "SCHOOL_RANKINGS_DATA", global = true)]
    data: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the top three schools for a year and goal
    Rank {
        #[arg(long)]
        year: i32,
        /// One of "Max Salary", "Best CAV", "Most Picks"
        #[arg(long)]
        goal: String,
        #[arg(long)]
        position: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write the output to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the draft years present in the table
    Years,
    /// List the positions present in the table
    Positions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

fn render(ranking: &Ranking, format: OutputFormat) -> Result<String, RankingError> {
    match format {
        OutputFormat::Text => Ok(report::render_text(ranking)),
        OutputFormat::Json => {
            report::render_json(ranking).map_err(|err| RankingError::Internal(err.to_string()))
        }
        OutputFormat::Markdown => Ok(report::build_report(ranking, chrono::Utc::now())),
    }
}

fn run_rank(
    data: Option<&std::path::Path>,
    request: &RankRequest,
    format: OutputFormat,
    out: Option<&std::path::Path>,
) -> Result<(), RankingError> {
    let goal = request.goal()?;
    let dataset = Dataset::load_configured(data)?;
    let position = request.position();
    let ranking = Ranking {
        year: request.year,
        goal,
        position: position.map(str::to_string),
        rankings: ranking::rank(&dataset, request.year, &request.goal, position)?,
    };
    let output = render(&ranking, format)?;

    match out {
        Some(path) => {
            std::fs::write(path, output).map_err(|err| {
                RankingError::Internal(format!("failed to write {}: {err}", path.display()))
            })?;
            println!("Ranking written to {}.", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&LogConfig::from_verbosity(cli.verbose, cli.log_format));

    let data = cli.data.as_deref();

    match cli.command {
        Commands::Rank {
            year,
            goal,
            position,
            format,
            out,
        } => {
            let request = RankRequest {
                year,
                goal,
                position,
            };
            if let Err(err) = run_rank(data, &request, format, out.as_deref()) {
                let response = err.response();
                if format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                anyhow::bail!(response.message);
            }
        }
        Commands::Years => {
            let dataset = Dataset::load_configured(data).context("failed to load the draft table")?;
            for year in dataset.years() {
                println!("{year}");
            }
        }
        Commands::Positions => {
            let dataset = Dataset::load_configured(data).context("failed to load the draft table")?;
            for position in dataset.positions() {
                println!("{position}");
            }
        }
    }

    Ok(())
}
