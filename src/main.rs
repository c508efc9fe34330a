//! # Lead Sleuth CLI
//!
//! Command-line interface for the Lead Sleuth library (`lead_sleuth_core`).
//! This binary parses arguments, sets up configuration, and runs one of the
//! lead-enrichment pipelines against an input file.

use lead_sleuth_core::{
    enrich_single_lead, export, initialize_sleuth, load_leads, process_leads,
    CandidateSearchEngine, Config, ConfigBuilder, FlatRecord, Lead, LeadOutcome, LinkedInPipeline,
    OutputFormat, PersonalizationPipeline, EXPORT_PRIORITY_COLUMNS,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

const DEFAULT_INPUT: &str = "input/leads.csv";

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Lead enrichment: work email discovery, LinkedIn touchpoints and personalized outreach.",
    long_about = "Lead Sleuth generates likely work email addresses and verifies them through Reacher, drives LinkedIn profile visits and connection requests through an OpenOutreach server, and enriches leads via Bright Data to write personalized messages with an LLM."
)]
struct AppArgs {
    /// Path to a configuration file (TOML format). CLI args and env vars override file settings.
    #[arg(long, global = true, env = "LEAD_SLEUTH_CONFIG")]
    config_file: Option<String>,

    /// Directory where timestamped result files are written (created if absent).
    #[arg(long, global = true, default_value = "output", env = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Result file format.
    #[arg(long, global = true, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,

    /// HTTP request timeout in seconds.
    #[arg(long, global = true, env = "REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// User agent sent to remote services.
    #[arg(long, global = true, env = "LEAD_SLEUTH_USER_AGENT")]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find and verify work emails for every lead in a CSV file.
    Emails(EmailsArgs),
    /// Find and verify the work email of a single person.
    Find(FindArgs),
    /// Print the candidate addresses for a person without verifying them.
    Patterns(PersonArgs),
    /// Visit LinkedIn profiles and send connection requests with a note.
    Linkedin(LinkedInArgs),
    /// Enrich leads with LinkedIn data and write personalized messages.
    Personalize(PersonalizeArgs),
}

#[derive(Args, Debug)]
struct PersonArgs {
    #[arg(long)]
    first: String,
    #[arg(long)]
    last: String,
    /// Company domain or website URL.
    #[arg(long)]
    domain: String,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Maximum address patterns generated per name variant.
    #[arg(long, env = "MAX_PATTERNS_PER_LEAD")]
    max_patterns: Option<usize>,

    /// Seconds to wait between verification calls.
    #[arg(long, env = "VALIDATION_DELAY_SECONDS")]
    delay: Option<f64>,

    /// Keep a risky (e.g. catch-all) address when no safe one is found.
    #[arg(long, env = "INCLUDE_RISKY")]
    include_risky: bool,

    /// Base URL of the Reacher API.
    #[arg(long, env = "REACHER_API_URL")]
    reacher_url: Option<String>,

    /// Reacher API key (managed Reacher only).
    #[arg(long, env = "REACHER_API_KEY", hide_env_values = true)]
    reacher_api_key: Option<String>,
}

#[derive(Args, Debug)]
struct EmailsArgs {
    /// Input CSV with first_name, last_name and company_domain columns.
    #[arg(short, long, default_value = DEFAULT_INPUT, env = "INPUT_LEADS_CSV")]
    input: PathBuf,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Args, Debug)]
struct FindArgs {
    #[command(flatten)]
    person: PersonArgs,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Args, Debug)]
struct LinkedInArgs {
    /// Input CSV with linkedin_url and note columns.
    #[arg(short, long, default_value = DEFAULT_INPUT, env = "INPUT_LEADS_CSV")]
    input: PathBuf,

    #[arg(long, env = "OPENOUTREACH_API_URL")]
    api_url: Option<String>,
    #[arg(long, env = "OPENOUTREACH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "ACCOUNT_HANDLE")]
    account_handle: Option<String>,
    /// LinkedIn email or username.
    #[arg(long, env = "ACCOUNT_USERNAME")]
    account_username: Option<String>,
    #[arg(long, env = "ACCOUNT_PASSWORD", hide_env_values = true)]
    account_password: Option<String>,
    #[arg(long, env = "ACCOUNT_PROXY")]
    account_proxy: Option<String>,
    #[arg(long, env = "ACCOUNT_DAILY_CONNECTIONS")]
    daily_connections: Option<u32>,
    #[arg(long, env = "ACCOUNT_DAILY_MESSAGES")]
    daily_messages: Option<u32>,

    #[arg(long, env = "PROFILE_VISIT_DURATION_S")]
    visit_duration: Option<f64>,
    #[arg(long, env = "PROFILE_VISIT_SCROLL_DEPTH")]
    scroll_depth: Option<u32>,
    #[arg(long, env = "RUN_POLL_INTERVAL_S")]
    poll_interval: Option<f64>,
    #[arg(long, env = "RUN_POLL_TIMEOUT_S")]
    poll_timeout: Option<f64>,
    /// Seconds to wait between leads.
    #[arg(long, env = "LEAD_DELAY_S")]
    lead_delay: Option<f64>,
}

#[derive(Args, Debug)]
struct PersonalizeArgs {
    /// Input CSV with email, first_name, last_name and profile_url columns.
    #[arg(short, long, default_value = DEFAULT_INPUT, env = "INPUT_LEADS_CSV")]
    input: PathBuf,

    #[arg(long, env = "BRIGHTDATA_API_KEY", hide_env_values = true)]
    brightdata_api_key: Option<String>,
    #[arg(long, env = "BRIGHTDATA_TRIGGER_URL")]
    brightdata_trigger_url: Option<String>,
    #[arg(long, env = "BRIGHTDATA_SNAPSHOT_URL")]
    brightdata_snapshot_url: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
    #[arg(long, env = "OPENAI_API_URL")]
    openai_api_url: Option<String>,
    #[arg(long, env = "LLM_MODEL")]
    llm_model: Option<String>,
    /// Product pitch inserted into every prompt.
    #[arg(long, env = "PRODUCT_DESCRIPTION")]
    product_description: Option<String>,

    /// Read profiles from this JSON file instead of scraping them.
    #[arg(long, env = "LOCAL_PROFILES_PATH")]
    local_profiles: Option<String>,
    #[arg(long, env = "POLL_INTERVAL_SECONDS")]
    poll_interval: Option<f64>,
    #[arg(long, env = "POLL_TIMEOUT_SECONDS")]
    poll_timeout: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_path = dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Lead Sleuth CLI v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let config = match build_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(anyhow::anyhow!("Failed to build configuration: {}", e));
        }
    };
    tracing::debug!("Effective configuration loaded: {:?}", config);

    let format = OutputFormat::from(args.format);
    let start_time = Instant::now();

    let execution_result = match args.command {
        Command::Emails(ref cmd) => process_file_mode(&config, cmd, &args.output_dir, format).await,
        Command::Find(ref cmd) => process_cli_mode(&config, &cmd.person).await,
        Command::Patterns(ref person) => {
            print_patterns(&config, person);
            Ok(())
        }
        Command::Linkedin(ref cmd) => {
            run_linkedin_mode(&config, &cmd.input, &args.output_dir, format).await
        }
        Command::Personalize(ref cmd) => {
            run_personalize_mode(&config, &cmd.input, &args.output_dir, format).await
        }
    };

    if let Err(e) = execution_result {
        tracing::error!("Execution failed: {}", e);
        return Err(e);
    }

    tracing::info!(
        "Finished successfully. Total duration: {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

fn apply_search_args(mut builder: ConfigBuilder, search: &SearchArgs) -> ConfigBuilder {
    if let Some(n) = search.max_patterns {
        builder = builder.max_patterns_per_lead(n);
    }
    if let Some(d) = search.delay {
        builder = builder.validation_delay_seconds(d);
    }
    if search.include_risky {
        builder = builder.include_risky(true);
    }
    if let Some(ref url) = search.reacher_url {
        builder = builder.reacher_api_url(url);
    }
    if let Some(ref key) = search.reacher_api_key {
        builder = builder.reacher_api_key(key);
    }
    builder
}

fn apply_linkedin_args(mut builder: ConfigBuilder, cmd: &LinkedInArgs) -> ConfigBuilder {
    if let Some(ref url) = cmd.api_url {
        builder = builder.openoutreach_api_url(url);
    }
    if let Some(ref key) = cmd.api_key {
        builder = builder.openoutreach_api_key(key);
    }
    if let Some(ref handle) = cmd.account_handle {
        builder = builder.account_handle(handle);
    }
    if let Some(ref username) = cmd.account_username {
        builder = builder.account_username(username);
    }
    if let Some(ref password) = cmd.account_password {
        builder = builder.account_password(password);
    }
    if let Some(ref proxy) = cmd.account_proxy {
        builder = builder.account_proxy(proxy);
    }
    if let Some(n) = cmd.daily_connections {
        builder = builder.daily_connections(n);
    }
    if let Some(n) = cmd.daily_messages {
        builder = builder.daily_messages(n);
    }
    if let Some(s) = cmd.visit_duration {
        builder = builder.profile_visit_duration_seconds(s);
    }
    if let Some(depth) = cmd.scroll_depth {
        builder = builder.profile_visit_scroll_depth(depth);
    }
    if let Some(s) = cmd.poll_interval {
        builder = builder.run_poll_interval_seconds(s);
    }
    if let Some(s) = cmd.poll_timeout {
        builder = builder.run_poll_timeout_seconds(s);
    }
    if let Some(s) = cmd.lead_delay {
        builder = builder.lead_delay_seconds(s);
    }
    builder
}

fn apply_personalize_args(mut builder: ConfigBuilder, cmd: &PersonalizeArgs) -> ConfigBuilder {
    if let Some(ref key) = cmd.brightdata_api_key {
        builder = builder.brightdata_api_key(key);
    }
    if let Some(ref url) = cmd.brightdata_trigger_url {
        builder = builder.brightdata_trigger_url(url);
    }
    if let Some(ref url) = cmd.brightdata_snapshot_url {
        builder = builder.brightdata_snapshot_url(url);
    }
    if let Some(ref key) = cmd.openai_api_key {
        builder = builder.openai_api_key(key);
    }
    if let Some(ref url) = cmd.openai_api_url {
        builder = builder.openai_api_url(url);
    }
    if let Some(ref model) = cmd.llm_model {
        builder = builder.llm_model(model);
    }
    if let Some(ref description) = cmd.product_description {
        builder = builder.product_description(description);
    }
    if let Some(ref path) = cmd.local_profiles {
        builder = builder.local_profiles_path(path);
    }
    if let Some(s) = cmd.poll_interval {
        builder = builder.enrichment_poll_interval_seconds(s);
    }
    if let Some(s) = cmd.poll_timeout {
        builder = builder.enrichment_poll_timeout_seconds(s);
    }
    builder
}

fn build_config(args: &AppArgs) -> lead_sleuth_core::Result<Config> {
    let mut builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        builder = builder.config_file(path);
    }
    if let Some(t) = args.request_timeout {
        builder = builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(ref ua) = args.user_agent {
        builder = builder.user_agent(ua);
    }

    builder = match args.command {
        Command::Emails(ref cmd) => apply_search_args(builder, &cmd.search),
        Command::Find(ref cmd) => apply_search_args(builder, &cmd.search),
        Command::Patterns(_) => builder,
        Command::Linkedin(ref cmd) => apply_linkedin_args(builder, cmd),
        Command::Personalize(ref cmd) => apply_personalize_args(builder, cmd),
    };

    builder.build()
}

async fn process_cli_mode(config: &Config, person: &PersonArgs) -> Result<()> {
    tracing::info!("Running in Single Lead CLI mode.");
    let start_time = Instant::now();
    let sleuth = initialize_sleuth(config).context("Failed to initialize LeadSleuth core")?;

    tracing::info!(
        "Finding email for Name='{} {}', Domain='{}'",
        person.first,
        person.last,
        person.domain
    );
    let lead = Lead::new(&person.first, &person.last, &person.domain);
    let outcome = enrich_single_lead(&sleuth, lead).await;

    print_cli_results(&outcome);
    tracing::info!("CLI mode finished. Duration: {:.2?}", start_time.elapsed());
    Ok(())
}

async fn run_linkedin_mode(
    config: &Config,
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let pipeline =
        LinkedInPipeline::new(config).context("Failed to initialize LinkedIn pipeline")?;
    let path = pipeline
        .run(input, output_dir, format)
        .await
        .context("LinkedIn campaign failed")?;
    println!("Campaign results written to {}", path.display());
    Ok(())
}

async fn run_personalize_mode(
    config: &Config,
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let pipeline = PersonalizationPipeline::new(config)
        .context("Failed to initialize personalization pipeline")?;
    let path = pipeline
        .run(input, output_dir, format)
        .await
        .context("Personalization run failed")?;
    println!("Personalized leads written to {}", path.display());
    Ok(())
}

fn print_patterns(config: &Config, person: &PersonArgs) {
    let engine = CandidateSearchEngine::new(config.search.clone());
    let candidates = engine.candidates_for(&person.first, &person.last, person.domain.trim());
    if candidates.is_empty() {
        tracing::warn!("No candidates: first name, last name and domain must all be non-empty.");
    }
    for candidate in candidates {
        println!("{}", candidate);
    }
}

async fn process_file_mode(
    config: &Config,
    cmd: &EmailsArgs,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let start_time = Instant::now();
    tracing::info!(
        "Running in File Processing mode. Input: '{}', Output dir: '{}'",
        cmd.input.display(),
        output_dir.display()
    );

    let sleuth = initialize_sleuth(config).context("Failed to initialize LeadSleuth core")?;

    tracing::info!("Loading leads from '{}'...", cmd.input.display());
    let leads = load_leads(&cmd.input)
        .with_context(|| format!("Failed to load leads from '{}'", cmd.input.display()))?;
    let total_records_loaded = leads.len();
    if total_records_loaded == 0 {
        tracing::warn!(
            "Input file '{}' contains no leads. Writing an empty results file.",
            cmd.input.display()
        );
    }

    tracing::info!(
        "Starting email discovery for {} records (delay between checks: {:?})...",
        total_records_loaded,
        config.search.validation_delay
    );
    let pb = ProgressBar::new(total_records_loaded as u64);
    pb.set_style(ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
         .context("Failed to set progress bar template")?
         .progress_chars("=> "));
    pb.set_message("Processing leads...");

    let outcomes = process_leads(&sleuth, leads, |done| pb.set_position(done as u64)).await;

    pb.finish_with_message(format!("Processed {} records", outcomes.len()));

    let records: Vec<FlatRecord> = outcomes
        .iter()
        .filter_map(LeadOutcome::enriched)
        .map(|enriched| enriched.to_record())
        .collect();
    let path = export(
        output_dir,
        "validated_emails",
        format,
        &records,
        &EXPORT_PRIORITY_COLUMNS,
    )
    .context("Failed to export results")?;
    tracing::info!("Results saved to '{}'.", path.display());

    log_summary(&outcomes, total_records_loaded, start_time.elapsed());
    Ok(())
}

/// Logs a summary of the processing results to the console using `tracing::info`.
fn log_summary(outcomes: &[LeadOutcome], original_total: usize, duration: Duration) {
    let enriched: Vec<_> = outcomes.iter().filter_map(LeadOutcome::enriched).collect();
    let found = enriched
        .iter()
        .filter(|e| e.validated_email().is_some())
        .count();
    let risky = enriched
        .iter()
        .filter(|e| e.outcome.validation_status() == "risky")
        .count();
    let none_found = enriched.len() - found;
    let skipped = outcomes.len() - enriched.len();
    let patterns_tested: usize = enriched.iter().map(|e| e.outcome.patterns_tested).sum();

    tracing::info!("-------------------- Processing Summary --------------------");
    tracing::info!("Total Records in Input File : {}", original_total);
    tracing::info!("Records Processed/Attempted : {}", outcomes.len());
    tracing::info!("  - Emails Found            : {} ({} risky)", found, risky);
    tracing::info!("  - No Email Found          : {}", none_found);
    tracing::info!("  - Skipped (Invalid Input) : {}", skipped);
    tracing::info!("Verification Calls          : {}", patterns_tested);
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && !outcomes.is_empty() {
        let rate = (outcomes.len() as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate             : {:.2} records/sec", rate);
    }
    tracing::info!("----------------------------------------------------------");
}

/// Prints results for a single lead to standard output (CLI mode).
fn print_cli_results(outcome: &LeadOutcome) {
    const BLUE: &str = "\x1b[34m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    println!("\n{BLUE}===== Lead Sleuth Results ====={RESET}");

    match outcome {
        LeadOutcome::Skipped { lead, reason } => {
            println!("Name:   {} {}", lead.first_name, lead.last_name);
            println!("Domain: {}", lead.company_domain);
            println!("\n{YELLOW}Status: SKIPPED{RESET}");
            println!("Reason: {}", reason);
        }
        LeadOutcome::Enriched(enriched) => {
            println!("Name:   {} {}", enriched.lead.first_name, enriched.lead.last_name);
            println!("Domain: {}", enriched.lead.domain);

            match (enriched.validated_email(), enriched.outcome.best_result.as_ref()) {
                (Some(email), Some(result)) => {
                    let colour = if enriched.outcome.validation_status() == "safe" {
                        GREEN
                    } else {
                        YELLOW
                    };
                    println!("\n{colour}Status: {}{RESET}", result.reachability.as_str().to_uppercase());
                    println!("Email:      {colour}{}{RESET}", email);
                    println!("Disposable: {}", result.is_disposable);
                    println!("Role:       {}", result.is_role_account);
                    if !result.mx_records.is_empty() {
                        println!("MX:         {}", result.mx_records.join(", "));
                    }
                }
                _ => {
                    println!("\n{YELLOW}Status: NO EMAIL FOUND{RESET}");
                    if enriched.outcome.patterns_tested == 0 {
                        println!("Reason: No candidate addresses were generated.");
                    } else if enriched.outcome.patterns_hit > 0 {
                        println!("Reason: Deliverable addresses were seen but none was rated safe (use --include-risky to keep risky ones).");
                    } else {
                        println!("Reason: No candidate was deliverable.");
                    }
                }
            }
            println!(
                "\nPatterns tested: {}, deliverable: {}",
                enriched.outcome.patterns_tested, enriched.outcome.patterns_hit
            );
        }
    }

    println!("{BLUE}=============================={RESET}\n");
}
