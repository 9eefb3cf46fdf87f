use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use profile_scout::ai::{create_provider, resolve_model};
use profile_scout::config::Config;
use profile_scout::enrich::Enricher;
use profile_scout::hiring::{ApplicantSubmission, HiringTransport, PromptHireClient};
use profile_scout::models::FinalRecord;
use profile_scout::pipeline::ProfileExtractor;
use profile_scout::session::{ScrapeSession, StaticPage, SystemClock};

#[derive(Parser)]
#[command(name = "profile-scout")]
#[command(about = "Extract and normalize LinkedIn profiles, optionally enriched by an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PageArgs {
    /// Saved profile page (HTML)
    file: PathBuf,

    /// URL the page was saved from
    #[arg(short, long)]
    url: String,

    /// Skip LLM enrichment and use locally extracted fields only
    #[arg(long)]
    no_enrich: bool,

    /// Model for enrichment (gemini-flash, gemini-pro, api-sonnet, api-haiku, gpt-4o, gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a profile and print the final record as JSON
    Scrape {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Print the applicant payload that would be sent for a job opening
    Payload {
        #[command(flatten)]
        page: PageArgs,

        /// Job opening ID
        #[arg(short, long)]
        job: String,
    },

    /// List job openings in the hiring system
    Openings,

    /// Send the extracted profile to the hiring system as an applicant
    Submit {
        #[command(flatten)]
        page: PageArgs,

        /// Job opening ID
        #[arg(short, long)]
        job: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_session(config: &Config, args: &PageArgs) -> Result<ScrapeSession> {
    let enricher = if config.enrich && !args.no_enrich {
        let spec = resolve_model(args.model.as_deref().unwrap_or(&config.model))?;
        match create_provider(&spec) {
            Ok(provider) => Some(Enricher::new(Arc::from(provider))),
            Err(e) => {
                tracing::warn!(model = %spec.short_name, error = %e, "enrichment disabled");
                None
            }
        }
    } else {
        None
    };

    // a saved page is already fully rendered
    let mut options = config.session_options();
    options.settle_delay = Duration::ZERO;

    Ok(ScrapeSession::new(
        ProfileExtractor::new(config.selectors.clone()),
        enricher,
        Arc::new(SystemClock),
        options,
    ))
}

fn scrape(runtime: &Runtime, config: &Config, args: &PageArgs) -> Result<FinalRecord> {
    let page = StaticPage::from_file(&args.file, args.url.clone())?;
    let session = build_session(config, args)?;
    let record = runtime
        .block_on(session.scrape(&page))
        .with_context(|| format!("Failed to scrape {}", args.file.display()))?;
    Ok(record)
}

fn hiring_client(config: &Config) -> Result<PromptHireClient> {
    Ok(PromptHireClient::new(
        config.hiring_api_base.clone(),
        config.hiring_token.clone(),
    )?)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command {
        Commands::Scrape { page } => {
            let record = scrape(&runtime, &config, &page)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Payload { page, job } => {
            let record = scrape(&runtime, &config, &page)?;
            let submission = ApplicantSubmission::from_final(&record, job);
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }

        Commands::Openings => {
            let openings = hiring_client(&config)?.fetch_job_openings()?;
            if openings.is_empty() {
                println!("No job openings found.");
            } else {
                println!("{:<26} {:<40} {}", "ID", "TITLE", "DEPARTMENT");
                println!("{}", "-".repeat(84));
                for opening in openings {
                    println!(
                        "{:<26} {:<40} {}",
                        truncate(&opening.id, 24),
                        truncate(&opening.title, 38),
                        opening.department.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Submit { page, job } => {
            let client = hiring_client(&config)?;
            let record = scrape(&runtime, &config, &page)?;
            let submission = ApplicantSubmission::from_final(&record, job);
            let reply = client.send_applicant(&submission)?;
            println!("Applicant sent for job {}", submission.job_opening_id);
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }

    // an enrichment call that lost its race may still be running
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
