//! `narrative-intel` command line.
//!
//! Usage:
//!   narrative-intel serve
//!   narrative-intel ask 2
//!   narrative-intel ask 3 --initiative copilot-rollout
//!   narrative-intel comprehensive --initiative copilot-rollout
//!   narrative-intel dashboard
//!   narrative-intel team engineering
//!   narrative-intel initiative copilot-rollout
//!
//! Reports print as pretty JSON on stdout; logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use narrative_intel::config::Config;
use narrative_intel::reporting::{DetailedReport, ExecutiveDashboard};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "narrative-intel")]
#[command(about = "AI adoption narrative analysis", long_about = None)]
struct Cli {
    /// Story corpus (JSON); overrides system.corpus_path
    #[arg(long, global = true)]
    corpus: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analysis API over HTTP
    Serve,
    /// Answer one of the five strategic questions
    Ask {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        question: u8,
        #[arg(long)]
        initiative: Option<String>,
    },
    /// Run all five questions with executive summary and action plan
    Comprehensive {
        #[arg(long)]
        initiative: Option<String>,
    },
    /// Executive dashboard
    Dashboard {
        #[arg(long)]
        initiative: Option<String>,
    },
    /// Deep dive into one teller group
    Team { group: String },
    /// Deep dive into one initiative
    Initiative { id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(corpus) = cli.corpus {
        config.system.corpus_path = corpus;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.system.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(corpus = %config.system.corpus_path, "loading story corpus");
    let engine = narrative_intel::build_engine(&config).await?;

    match cli.command {
        Commands::Serve => narrative_intel::http::start_http_server(engine, &config.http).await,
        Commands::Ask { question, initiative } => {
            let initiative = initiative.as_deref();
            match question {
                1 => print_json(&engine.answer_question_1(initiative).await?),
                2 => print_json(&engine.answer_question_2().await?),
                3 => {
                    let Some(id) = initiative else {
                        anyhow::bail!("question 3 needs --initiative");
                    };
                    print_json(&engine.answer_question_3(id).await?)
                }
                4 => print_json(&engine.answer_question_4().await?),
                _ => print_json(&engine.answer_question_5(initiative).await?),
            }
        }
        Commands::Comprehensive { initiative } => {
            print_json(&engine.run_comprehensive_analysis(initiative.as_deref()).await?)
        }
        Commands::Dashboard { initiative } => {
            let dashboard = ExecutiveDashboard::new(engine);
            print_json(&dashboard.generate_dashboard(initiative.as_deref()).await?)
        }
        Commands::Team { group } => {
            print_json(&DetailedReport::new(engine).generate_team_report(&group).await?)
        }
        Commands::Initiative { id } => {
            print_json(&DetailedReport::new(engine).generate_initiative_report(&id).await?)
        }
    }
}
