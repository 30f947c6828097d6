//! fo - staged file reorganization client
//!
//! CLI entry point: wires logging, configuration, the HTTP session client,
//! and the workflow controller, then dispatches one subcommand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, eyre};
use tracing::{debug, info};

use fileorg::cli::{Cli, Command, parse_param};
use fileorg::config::{Config, PollConfig};
use fileorg::poll::Poller;
use fileorg::preview::{EntryKind, FlatEntry, Reconciled};
use fileorg::{AnalysisMethod, HttpSessionApi, JobProgress, SessionApi, StructAlgorithm, Workflow};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_ref())?;
    config.validate()?;

    let api = Arc::new(HttpSessionApi::from_config(&config.api)?);
    let mut workflow = Workflow::new(Arc::clone(&api) as Arc<dyn SessionApi>);

    match cli.command {
        Command::Create { directory, recursive } => cmd_create(&mut workflow, &directory, recursive).await,
        Command::Sessions { skip, limit } => cmd_sessions(&mut workflow, skip, limit).await,
        Command::Status { session_id } => cmd_status(&mut workflow, &session_id).await,
        Command::Methods => cmd_methods(&mut workflow).await,
        Command::Algorithms => cmd_algorithms(&mut workflow).await,
        Command::Analyze {
            session_id,
            method,
            watch,
        } => cmd_analyze(&mut workflow, &api, &config.poll, &session_id, method, watch).await,
        Command::Plan {
            session_id,
            algorithm,
            params,
        } => cmd_plan(&mut workflow, &session_id, algorithm, &params).await,
        Command::Preview { session_id } => cmd_preview(&mut workflow, &session_id).await,
        Command::Apply { session_id, dry_run } => cmd_apply(&mut workflow, &session_id, dry_run).await,
        Command::Progress { session_id, watch } => {
            cmd_progress(&mut workflow, &api, &config.poll, &session_id, watch).await
        }
        Command::Ls { path } => cmd_ls(&mut workflow, &path).await,
        Command::Run {
            directory,
            method,
            algorithm,
            recursive,
            dry_run,
        } => cmd_run(&mut workflow, &api, &config.poll, &directory, method, algorithm, recursive, dry_run).await,
    }
}

/// Poll job progress until completion, printing percent changes
async fn wait_for_job(api: &Arc<HttpSessionApi>, session_id: &str, poll: &PollConfig) -> Result<()> {
    let poller = Poller::new(poll.interval());
    let poller = match poll.max_attempts {
        Some(max) => poller.with_max_attempts(max),
        None => poller,
    };

    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    let probe_api = Arc::clone(api);
    let probe_id = session_id.to_string();

    poller
        .start(
            move || {
                let api = Arc::clone(&probe_api);
                let id = probe_id.clone();
                async move { api.get_progress(&id).await }
            },
            move |progress: JobProgress| {
                info!(percent = progress.percent, status = %progress.status, "job complete");
                done_flag.store(true, Ordering::SeqCst);
            },
        )
        .await;

    let mut last_percent = None;
    while poller.is_polling() {
        if let Some(progress) = poller.latest()
            && last_percent != Some(progress.percent)
        {
            println!("  {:>3}% {}", progress.percent, progress.status);
            last_percent = Some(progress.percent);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    if done.load(Ordering::SeqCst) {
        if let Some(progress) = poller.latest()
            && last_percent != Some(progress.percent)
        {
            println!("  {:>3}% {}", progress.percent, progress.status);
        }
        return Ok(());
    }

    match poller.last_error() {
        Some(err) => Err(eyre!("Progress polling failed: {err}")),
        None => Err(eyre!("Job did not finish within the attempt limit")),
    }
}

async fn cmd_create(workflow: &mut Workflow, directory: &str, recursive: bool) -> Result<()> {
    let session = workflow.create_session(directory, recursive).await?;
    println!("Created session {} for {}", session.id, session.directory);
    Ok(())
}

async fn cmd_sessions(workflow: &mut Workflow, skip: u32, limit: u32) -> Result<()> {
    let sessions = workflow.list_sessions(skip, limit).await?;
    if sessions.is_empty() {
        println!("No sessions");
        return Ok(());
    }
    for session in sessions {
        println!("{}  {:<11} {}", session.id, session.status.to_string(), session.directory);
    }
    Ok(())
}

async fn cmd_status(workflow: &mut Workflow, session_id: &str) -> Result<()> {
    let session = workflow.load_session(session_id).await?;
    println!("Session:   {}", session.id);
    println!("Directory: {}", session.directory);
    println!("Status:    {}", session.status);
    println!("Recursive: {}", session.recursive);
    if let Some(method) = session.analysis_method {
        println!("Method:    {method}");
    }
    if let Some(algorithm) = session.struct_algorithm {
        println!("Algorithm: {algorithm}");
    }
    println!("Files:     {}", session.files_total);
    println!("Actions:   {}", session.actions_total);
    Ok(())
}

async fn cmd_methods(workflow: &mut Workflow) -> Result<()> {
    for method in workflow.analysis_methods().await? {
        match method.description {
            Some(description) => println!("{:<10} {description}", method.id),
            None => println!("{}", method.id),
        }
    }
    Ok(())
}

async fn cmd_algorithms(workflow: &mut Workflow) -> Result<()> {
    for algorithm in workflow.struct_algorithms().await? {
        match algorithm.description {
            Some(description) => println!("{:<10} {description}", algorithm.id),
            None => println!("{}", algorithm.id),
        }
        if algorithm.params_schema.is_some() {
            println!("           (accepts parameters, see 'fo plan --set')");
        }
    }
    Ok(())
}

async fn cmd_analyze(
    workflow: &mut Workflow,
    api: &Arc<HttpSessionApi>,
    poll: &PollConfig,
    session_id: &str,
    method: AnalysisMethod,
    watch: bool,
) -> Result<()> {
    workflow.load_session(session_id).await?;
    let summary = workflow.run_analysis(method).await?;
    println!("Analyzing {} file(s) with {method}", summary.files_analyzed);
    for example in &summary.description_examples {
        println!("  e.g. {example}");
    }
    if watch {
        wait_for_job(api, session_id, poll).await?;
    }
    Ok(())
}

async fn cmd_plan(
    workflow: &mut Workflow,
    session_id: &str,
    algorithm: StructAlgorithm,
    params: &[String],
) -> Result<()> {
    workflow.load_session(session_id).await?;

    // Install the algorithm's parameter form when it declares a schema
    let algorithms = workflow.struct_algorithms().await?;
    let schema = algorithms
        .into_iter()
        .find(|info| info.id == algorithm.to_string())
        .and_then(|info| info.params_schema);

    if let Some(schema) = schema {
        workflow.set_plan_schema(&schema)?;
        if let Some(form) = workflow.plan_form() {
            for raw in params {
                let (key, value) = parse_param(raw).map_err(|e| eyre!(e))?;
                if !form.set_value(&key, value) {
                    return Err(eyre!("Algorithm {algorithm} has no parameter '{key}'"));
                }
                form.touch(&key);
            }
        }
    } else if !params.is_empty() {
        return Err(eyre!("Algorithm {algorithm} does not accept parameters"));
    }

    let summary = workflow.generate_plan(algorithm).await?;
    println!("Plan ready: {} action(s)", summary.actions_created);
    for (action, count) in &summary.breakdown {
        println!("  {action}: {count}");
    }
    Ok(())
}

async fn cmd_preview(workflow: &mut Workflow, session_id: &str) -> Result<()> {
    workflow.load_session(session_id).await?;
    let preview = workflow.get_preview().await?;
    print_preview(preview);
    Ok(())
}

fn print_preview(preview: &Reconciled) {
    if preview.before.is_empty() {
        println!("No preview available");
        return;
    }
    println!("Current structure:");
    print_entries(&preview.before);
    println!();
    println!("After reorganization:");
    print_entries(&preview.after);
}

fn print_entries(entries: &[FlatEntry]) {
    for entry in entries {
        match entry.kind {
            EntryKind::Directory => println!("  {}/", entry.path),
            EntryKind::File => println!("  {}", entry.path),
        }
    }
}

async fn cmd_apply(workflow: &mut Workflow, session_id: &str, dry_run: bool) -> Result<()> {
    workflow.load_session(session_id).await?;
    let outcome = workflow.apply_plan(dry_run).await?;

    let prefix = if dry_run { "Dry run: would apply" } else { "Applied" };
    println!("{prefix} {} action(s), {} failed", outcome.applied, outcome.failed);
    for error in &outcome.errors {
        println!("  error: {error}");
    }
    Ok(())
}

async fn cmd_progress(
    workflow: &mut Workflow,
    api: &Arc<HttpSessionApi>,
    poll: &PollConfig,
    session_id: &str,
    watch: bool,
) -> Result<()> {
    workflow.load_session(session_id).await?;

    if watch {
        return wait_for_job(api, session_id, poll).await;
    }

    let progress = workflow.get_progress().await?;
    match progress.message {
        Some(message) => println!("{:>3}% {} - {}", progress.percent, progress.status, message),
        None => println!("{:>3}% {}", progress.percent, progress.status),
    }
    Ok(())
}

async fn cmd_ls(workflow: &mut Workflow, path: &str) -> Result<()> {
    for entry in workflow.list_directory(path).await? {
        if entry.kind == "directory" {
            println!("{}/", entry.name);
        } else {
            println!("{}", entry.name);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    workflow: &mut Workflow,
    api: &Arc<HttpSessionApi>,
    poll: &PollConfig,
    directory: &str,
    method: AnalysisMethod,
    algorithm: StructAlgorithm,
    recursive: bool,
    dry_run: bool,
) -> Result<()> {
    let session_id = workflow.create_session(directory, recursive).await?.id.clone();
    println!("Created session {session_id}");

    let summary = workflow.run_analysis(method).await?;
    println!("Analyzing {} file(s) with {method}", summary.files_analyzed);
    wait_for_job(api, &session_id, poll).await?;

    let summary = workflow.generate_plan(algorithm).await?;
    println!("Plan ready: {} action(s)", summary.actions_created);
    wait_for_job(api, &session_id, poll).await?;

    let preview = workflow.get_preview().await?;
    print_preview(preview);
    println!();

    let outcome = workflow.apply_plan(dry_run).await?;
    let prefix = if dry_run { "Dry run: would apply" } else { "Applied" };
    println!("{prefix} {} action(s), {} failed", outcome.applied, outcome.failed);
    for error in &outcome.errors {
        println!("  error: {error}");
    }
    Ok(())
}
