use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod board;
mod calendar;
mod error;
mod html;
mod parser;
mod server;
mod types;

use board::ScheduleBoard;
use types::Assignment;

#[derive(Parser, Debug)]
#[command(name = "escala")]
#[command(about = "Generate a month calendar and roster professionals on day and night shifts")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".", global = true)]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web form (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Render a month to a static index.html (no server)
    Build {
        #[arg(long)]
        year: i32,

        /// Month number, 1-12
        #[arg(long)]
        month: u32,

        /// JSON file with a list of assignments
        #[arg(long)]
        assignments: Option<PathBuf>,
    },

    /// Parse a day list the way the form does, e.g. "1, 2.3 4"
    Parse {
        text: String,
    },
}

fn init_tracing(log_level: &str) {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    for directive in ["hyper=warn", "tower_http=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

fn load_assignments(path: &Path) -> Result<Vec<Assignment>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut assignments: Vec<Assignment> =
        serde_json::from_str(&content).context("Failed to parse assignments JSON")?;

    // Day 0 never exists; assignments left without days are dropped like in the form
    for assignment in &mut assignments {
        assignment.days.retain(|&day| day > 0);
    }
    assignments.retain(|assignment| {
        let keep = !assignment.days.is_empty();
        if !keep {
            warn!(name = %assignment.name, "Skipping assignment without valid days");
        }
        keep
    });

    Ok(assignments)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    match args.command {
        None => server::serve(8080).await?,
        Some(Commands::Serve { port }) => server::serve(port).await?,
        Some(Commands::Build {
            year,
            month,
            assignments,
        }) => {
            let mut board = ScheduleBoard::new();
            board.generate(year, month)?;

            if let Some(path) = assignments {
                for assignment in load_assignments(&path)? {
                    board.add(assignment);
                }
                info!(count = board.assignments().len(), file = %path.display(), "Loaded assignments");
            }

            let html_path = args.output.join("index.html");
            html::generate_html(&board, &html_path)?;
            info!(path = %html_path.display(), "HTML saved");
        }
        Some(Commands::Parse { text }) => {
            let days = parser::parse_days(&text);
            if days.is_empty() {
                anyhow::bail!("{}", error::BoardError::NoValidDays);
            }
            info!(count = days.len(), ?days, "Parsed days");
        }
    }

    Ok(())
}
