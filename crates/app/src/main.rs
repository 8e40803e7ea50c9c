//! Courier - Main Entry Point
//!
//! Loads a project document and runs one of its requests through the
//! execution pipeline: pre-request scripts, resolution, transport and
//! post-request scripts.

mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use courier_application::{RequestExecutor, RuntimeVariableStore};
use courier_domain::ProjectTree;
use courier_infrastructure::{
    BufferedLogSink, ReqwestHttpClient, RhaiSandbox, SettingsRepository, TracingLogSink,
    load_project, load_runtime, save_runtime, to_json_stable,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "courier")]
#[command(about = "Run collection requests with their scripts", version)]
struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one request and print the response and console output.
    Run(RunArgs),
    /// Print the variables visible to an item, without running scripts.
    Vars(TargetArgs),
    /// Print the effective settings.
    Settings {
        /// Write the effective settings back to the settings file.
        #[arg(long)]
        init: bool,
    },
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// Project document (JSON).
    project: PathBuf,
    /// Id of the request or folder.
    item: String,
    /// Runtime variable overlay (JSON object).
    #[arg(long)]
    runtime: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Write the updated runtime overlay back to `--runtime`.
    #[arg(long, requires = "runtime")]
    save_runtime: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn settings_repository(path: Option<PathBuf>) -> SettingsRepository {
    path.map_or_else(SettingsRepository::new, SettingsRepository::at)
}

async fn load_target(
    target: &TargetArgs,
) -> Result<(ProjectTree, RuntimeVariableStore), Box<dyn std::error::Error>> {
    let project = load_project(&target.project).await?;
    let runtime = match &target.runtime {
        Some(path) => load_runtime(path).await?,
        None => courier_domain::RuntimeVariables::new(),
    };
    Ok((
        ProjectTree::from_project(&project),
        RuntimeVariableStore::new(runtime),
    ))
}

async fn run(
    args: RunArgs,
    settings: SettingsRepository,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings.load().await?;
    let (tree, runtime) = load_target(&args.target).await?;

    let console = BufferedLogSink::forwarding(Arc::new(TracingLogSink));
    let executor = RequestExecutor::new(
        Arc::new(ReqwestHttpClient::new(&settings.http)?),
        Arc::new(RhaiSandbox::new(settings.script)),
        Arc::new(console.clone()),
    );

    let result = executor
        .send(&tree, &tree, &args.target.item, &runtime)
        .await;
    print!("{}", output::render_console(&console.drain()));
    let outcome = result?;

    tracing::info!(state = %outcome.final_state(), url = %outcome.request.url, "request finished");
    print!("{}", output::render_response(&outcome.response));

    if args.save_runtime
        && let Some(path) = &args.target.runtime
    {
        save_runtime(path, &runtime.snapshot()).await?;
        tracing::info!(path = %path.display(), "runtime variables saved");
    }
    Ok(())
}

async fn vars(args: TargetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (tree, runtime) = load_target(&args).await?;
    let variables =
        RequestExecutor::get_scoped_variables(&tree, &args.item, &tree, &runtime.snapshot())?;
    print!("{}", output::render_variables(&variables));
    Ok(())
}

async fn show_settings(
    repository: SettingsRepository,
    init: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = repository.load().await?;
    if init {
        repository.save(&settings).await?;
    }
    if let Some(path) = repository.settings_path() {
        println!("# {}", path.display());
    }
    print!("{}", to_json_stable(&settings)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let repository = settings_repository(cli.settings);

    match cli.command {
        Command::Run(args) => run(args, repository).await,
        Command::Vars(args) => vars(args).await,
        Command::Settings { init } => show_settings(repository, init).await,
    }
}
