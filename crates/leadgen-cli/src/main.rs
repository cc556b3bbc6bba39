use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use leadgen_core::app_config::AppConfig;
use leadgen_core::config;
use leadgen_core::keywords::{expand_terms, load_keywords};
use leadgen_directory::{DirectoryClient, PresenceFilter};
use leadgen_outreach::{
    AgencyIdentity, BridgeClient, GeneratorClient, JsonlRecorder, MailClient, Orchestrator,
    OrchestratorOptions, ProgressEvent, ProgressSink, Tone,
};

#[derive(Debug, Parser)]
#[command(name = "leadgen")]
#[command(about = "Finds local businesses without websites and reaches out")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full search-and-outreach pipeline.
    Run {
        /// Cap the number of search queries for this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Small smoke run: only the first two search queries.
        #[arg(long)]
        test: bool,

        /// Override business types from the keywords file.
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Override locations from the keywords file.
        #[arg(long, value_delimiter = ',')]
        locations: Vec<String>,

        /// Use the friendlier message register.
        #[arg(long)]
        friendly: bool,
    },
    /// Validate configuration and the keywords file, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_app_config().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone())),
        )
        .init();

    match cli.command {
        Commands::CheckConfig => check_config(&cfg),
        Commands::Run {
            limit,
            test,
            types,
            locations,
            friendly,
        } => {
            let tone = if friendly {
                Tone::Friendly
            } else {
                Tone::Professional
            };
            run(&cfg, limit, test, &types, &locations, tone).await
        }
    }
}

fn check_config(cfg: &AppConfig) -> anyhow::Result<()> {
    println!("{cfg:#?}");

    let keywords = load_keywords(&cfg.keywords_path).with_context(|| {
        format!("keywords file {} is not usable", cfg.keywords_path.display())
    })?;
    println!(
        "keywords: {} business types x {} locations = {} search queries",
        keywords.business_types.len(),
        keywords.locations.len(),
        keywords.search_terms().len()
    );

    let channel = |name: &str, configured: bool| {
        println!(
            "{name}: {}",
            if configured { "configured" } else { "not configured" }
        );
    };
    channel("directory search", cfg.directory_api_key.is_some());
    channel("whatsapp bridge", cfg.bridge_url.is_some());
    channel("email", cfg.mail_api_key.is_some());
    channel("message generation", cfg.generator_api_key.is_some());
    Ok(())
}

async fn run(
    cfg: &AppConfig,
    limit: Option<usize>,
    test: bool,
    types: &[String],
    locations: &[String],
    tone: Tone,
) -> anyhow::Result<()> {
    let api_key = cfg.directory_api_key.as_deref().context(
        "no directory API key configured; set LEADGEN_DIRECTORY_API_KEY before running",
    )?;

    let mut queries = build_queries(cfg, types, locations)?;
    if test {
        queries.truncate(2);
        info!("test mode: limiting to the first {} queries", queries.len());
    }
    if let Some(limit) = limit {
        queries.truncate(limit);
    }
    if queries.is_empty() {
        anyhow::bail!("no search queries to run; check the keywords file or overrides");
    }
    info!(queries = queries.len(), "starting lead generation run");

    if cfg.bridge_url.is_none() {
        warn!("no bridge URL configured, whatsapp channel will be unavailable");
    }
    if cfg.mail_api_key.is_none() {
        warn!("no mail API key configured, email channel will be unavailable");
    }

    let directory = DirectoryClient::with_base_url(
        api_key,
        cfg.request_timeout_secs,
        &cfg.user_agent,
        cfg.retry_attempts,
        cfg.retry_base_delay_ms,
        &cfg.directory_base_url,
    )?;
    let messenger = BridgeClient::new(cfg.bridge_url.clone())?;
    let mailer = MailClient::with_base_url(
        cfg.mail_api_key.clone(),
        cfg.mail_from.clone(),
        cfg.agency_name.clone(),
        cfg.mail_base_url.clone(),
    )?;
    let identity = AgencyIdentity {
        name: cfg.agency_name.clone(),
        phone: cfg.agency_phone.clone(),
        email: cfg.agency_email.clone(),
    };
    let generator = GeneratorClient::with_base_url(
        cfg.generator_api_key.clone(),
        identity,
        tone,
        cfg.generator_base_url.clone(),
    )?;
    let recorder = JsonlRecorder::new(&cfg.leads_path);
    info!(run_id = %recorder.run_id(), leads_path = %cfg.leads_path.display(), "lead log ready");
    let presence = PresenceFilter::new(cfg.probe_timeout_secs, &cfg.user_agent)?;

    let options = OrchestratorOptions {
        max_concurrent_searches: cfg.max_concurrent_requests,
        inter_batch_delay_ms: cfg.inter_batch_delay_ms,
        outreach_batch_size: cfg.outreach_batch_size,
        outreach_batch_delay_ms: cfg.outreach_batch_delay_ms,
    };
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            let done = matches!(event, ProgressEvent::RunCompleted { .. });
            print_progress(&event);
            if done {
                break;
            }
        }
    });

    let orchestrator = Arc::new(Orchestrator::new(
        directory,
        messenger,
        mailer,
        generator,
        recorder,
        presence,
        options,
        ProgressSink::new(progress_tx),
    ));

    let stop = orchestrator.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight work then stopping");
            stop.stop();
        }
    });

    let report = orchestrator.run(&queries).await?;
    printer.await.ok();

    let stats = report.stats;
    println!();
    println!("run finished in {}s", report.duration_secs);
    println!("  searches:        {}", stats.total_searches);
    println!("  found:           {}", stats.total_found);
    println!("  without website: {}", stats.without_website);
    println!(
        "  whatsapp sent:   {} ({:.1}%)",
        stats.whatsapp_sent, stats.whatsapp_success_rate
    );
    println!(
        "  email sent:      {} ({:.1}%)",
        stats.email_sent, stats.email_success_rate
    );
    println!("  skipped:         {}", stats.skipped);
    println!("  errors:          {}", stats.errors);
    Ok(())
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::SearchStarted { total_queries } => {
            println!("searching {total_queries} queries...");
        }
        ProgressEvent::SearchCompleted { businesses_found } => {
            println!("found {businesses_found} businesses");
        }
        ProgressEvent::FilterCompleted { without_website } => {
            println!("{without_website} businesses without a live website");
        }
        ProgressEvent::BusinessProcessed { name, index, total } => {
            println!("[{index}/{total}] processed {name}");
        }
        ProgressEvent::RunCompleted { .. } => {}
    }
}

/// Search queries for this run: CLI overrides take precedence over the
/// keywords file, and an override on one axis still reads the other axis
/// from the file.
fn build_queries(
    cfg: &AppConfig,
    types: &[String],
    locations: &[String],
) -> anyhow::Result<Vec<String>> {
    if types.is_empty() && locations.is_empty() {
        let keywords = load_keywords(&cfg.keywords_path).with_context(|| {
            format!("keywords file {} is not usable", cfg.keywords_path.display())
        })?;
        return Ok(keywords.search_terms());
    }

    let file = if types.is_empty() || locations.is_empty() {
        Some(load_keywords(&cfg.keywords_path).with_context(|| {
            format!("keywords file {} is not usable", cfg.keywords_path.display())
        })?)
    } else {
        None
    };
    let types = if types.is_empty() {
        file.as_ref().map(|f| f.business_types.clone()).unwrap_or_default()
    } else {
        types.to_vec()
    };
    let locations = if locations.is_empty() {
        file.as_ref().map(|f| f.locations.clone()).unwrap_or_default()
    } else {
        locations.to_vec()
    };
    Ok(expand_terms(&types, &locations))
}
