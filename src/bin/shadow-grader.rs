//! Operator CLI for batch grade entry.
//!
//! Attaches to a running Chrome (the usual mode, since the grading page
//! sits behind the operator's institution login) or launches one, then
//! reads or writes grades through the shadow-aware index.

use anyhow::Context;
use clap::{Parser, Subcommand};
use shadow_grader::{BrowserSession, ConnectionOptions, Grader, GraderConfig, LaunchOptions};

#[derive(Parser)]
#[command(name = "shadow-grader", version, about = "Batch grade entry for the D2L consistent-evaluation quiz view")]
struct Cli {
    /// DevTools WebSocket URL of a running Chrome (start it with
    /// --remote-debugging-port and grade inside your own session)
    #[arg(long)]
    ws_url: Option<String>,

    /// Launch a visible browser instead of a headless one (only used
    /// without --ws-url)
    #[arg(long)]
    headed: bool,

    /// Navigate the active tab to this URL before grading
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count the logical problems on the page
    Problems,
    /// Read the grade of one step
    Get {
        /// 1-based problem number
        #[arg(short, long)]
        problem: usize,
        /// 1-based step number within the problem
        #[arg(short, long)]
        step: usize,
    },
    /// Write the grade of one step
    Set {
        /// 1-based problem number
        #[arg(short, long)]
        problem: usize,
        /// 1-based step number within the problem
        #[arg(short, long)]
        step: usize,
        /// Grade value to enter
        #[arg(short, long)]
        grade: f64,
    },
    /// Apply a whole grade matrix: rows separated by ';', values by ','.
    /// Negative values leave the step untouched, e.g. "3,-1,4;5"
    Batch {
        #[arg(short, long)]
        grades: String,
    },
}

fn parse_matrix(arg: &str) -> anyhow::Result<Vec<Vec<f64>>> {
    arg.split(';')
        .map(|row| {
            row.split(',')
                .map(|value| {
                    value
                        .trim()
                        .parse::<f64>()
                        .with_context(|| format!("bad grade value '{}'", value.trim()))
                })
                .collect()
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let session = match &cli.ws_url {
        Some(ws_url) => BrowserSession::connect(ConnectionOptions::new(ws_url))?,
        None => BrowserSession::launch(LaunchOptions::new().headless(!cli.headed))?,
    };

    if let Some(url) = &cli.url {
        session.navigate(url)?;
        session.wait_for_navigation()?;
    }

    let mut grader = Grader::new(session, GraderConfig::default())?;

    match cli.command {
        Command::Problems => {
            println!("{}", grader.problem_count());
        }
        Command::Get { problem, step } => {
            println!("{}", grader.get_grade(problem, step)?);
        }
        Command::Set { problem, step, grade } => {
            grader.set_grade(problem, step, grade)?;
            eprintln!("problem {} step {} <- {}", problem, step, grade);
        }
        Command::Batch { grades } => {
            let matrix = parse_matrix(&grades)?;
            let report = grader.set_grades(&matrix)?;
            eprintln!(
                "applied {}, skipped {}, missing input on {}",
                report.applied, report.skipped, report.failed
            );
        }
    }

    Ok(())
}
