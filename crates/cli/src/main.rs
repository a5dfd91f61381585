mod config;
mod console;
mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use director::{DirectorHandle, PhaseDirector, PhaseRegistry};
use events::{EventBus, EventEnvelope};
use progress::{FileStore, ProgressGate};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AuroraConfig;
use crate::console::ConsoleSurfaces;
use crate::input::{parse_command, Command, HELP};

const FATAL_MESSAGE: &str = "Something went wrong. Please reload.";

#[derive(Parser)]
#[command(name = "aurora")]
#[command(about = "A journey in nine phases", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file, defaults to <config_dir>/aurora/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the save file
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,

    /// Multiplier on every scripted duration
    #[arg(long, global = true)]
    pace: Option<f32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resume the journey and read commands from stdin
    Play {
        /// Log lifecycle events to stderr
        #[arg(long)]
        events: bool,
    },
    /// Show saved progress
    Status,
    /// Write saved progress to a JSON file
    Export { path: PathBuf },
    /// Replace saved progress with a JSON file
    Import { path: PathBuf },
    /// Erase saved progress
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(AuroraConfig::default_path) {
        Some(path) => AuroraConfig::load_or_default(&path).await,
        None => AuroraConfig::default(),
    }
    .with_save_dir(cli.save_dir)
    .with_pace(cli.pace);

    match cli.command.unwrap_or(Commands::Play { events: false }) {
        Commands::Play { events } => play(&config, events).await,
        Commands::Status => status(&*open_progress(&config).await?),
        Commands::Export { path } => export(&*open_progress(&config).await?, &path).await,
        Commands::Import { path } => import(&*open_progress(&config).await?, &path).await,
        Commands::Reset { yes } => reset(&*open_progress(&config).await?, yes).await,
    }
}

async fn open_progress(config: &AuroraConfig) -> Result<Arc<ProgressGate>> {
    let save_dir = config.save_dir();
    let store = FileStore::new(&save_dir);
    store
        .ensure_dir()
        .await
        .with_context(|| format!("Cannot create save directory {}", save_dir.display()))?;

    let codes = config.code_table()?;
    let gate = ProgressGate::open(Arc::new(store), codes).await;
    info!(save_dir = %save_dir.display(), "Progress opened");
    Ok(Arc::new(gate))
}

async fn play(config: &AuroraConfig, log_events: bool) -> Result<()> {
    let console = ConsoleSurfaces::new();
    let surfaces = console.surfaces();

    let (director, progress) = match bootstrap(config, &console, log_events).await {
        Ok(started) => started,
        Err(e) => {
            surfaces.presentation.show_fatal(FATAL_MESSAGE);
            return Err(e);
        }
    };

    let handle = director.handle();
    let bus = director.events().bus().clone();
    let runner = tokio::spawn(director.run());
    println!("{}", "Type help for the list of commands.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = dispatch(&handle, &progress, command).await {
                    println!("{}", format!("{e:#}").red());
                }
            }
            Ok(None) => {}
            Err(e) => println!("{}", format!("{e:#}").red()),
        }
    }

    handle.shutdown()?;
    runner.await.context("Director task failed")?;
    debug!(
        published = bus.published(),
        undelivered = bus.undelivered(),
        "Event bus closed"
    );
    if let Err(e) = progress.persist().await {
        warn!(error = %e, "Failed to save progress on exit");
    }
    Ok(())
}

async fn bootstrap(
    config: &AuroraConfig,
    console: &ConsoleSurfaces,
    log_events: bool,
) -> Result<(PhaseDirector, Arc<ProgressGate>)> {
    let progress = open_progress(config).await?;

    let bus = EventBus::new();
    if log_events {
        tokio::spawn(log_lifecycle(bus.subscribe()));
    }

    let mut director = PhaseDirector::new(
        PhaseRegistry::standard(),
        console.surfaces(),
        Arc::clone(&progress),
        bus,
        config.director_config(),
    );
    director.resume().await.context("Could not resume the journey")?;
    Ok((director, progress))
}

async fn dispatch(handle: &DirectorHandle, progress: &ProgressGate, command: Command) -> Result<()> {
    match command {
        Command::Code(raw) => {
            handle.submit_code(raw).await?;
        }
        Command::Phase(phase) => handle.request_phase(phase).await?,
        Command::Input(input) => handle.send_input(input)?,
        Command::Status => status(progress)?,
        Command::Export(path) => {
            let document = handle.export().await?;
            write_document(&path, &document).await?;
            println!("Progress exported to {}", path.display());
        }
        Command::Import(path) => {
            let document = read_document(&path).await?;
            report_repaired(&handle.import(document).await?);
        }
        Command::Reset => handle.reset().await?,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn status(progress: &ProgressGate) -> Result<()> {
    let state = progress.snapshot();

    println!();
    println!(
        "Current phase: {} ({})",
        state.current_phase,
        state.current_phase.info().title
    );
    println!("Completed:     {}%", progress.completion_percentage());
    println!("Play time:     {}", progress.formatted_play_time());
    println!();
    for phase in aurora_core::PhaseId::all() {
        let icon = if state.is_completed(phase) {
            "●".green()
        } else if state.is_unlocked(phase) {
            "◐".yellow()
        } else {
            "○".dimmed()
        };
        println!("  {} {} {}", icon, phase, phase.info().title);
    }
    println!();
    Ok(())
}

async fn export(progress: &ProgressGate, path: &Path) -> Result<()> {
    write_document(path, &progress.export()?).await?;
    println!("Progress exported to {}", path.display());
    Ok(())
}

async fn import(progress: &ProgressGate, path: &Path) -> Result<()> {
    let document = read_document(path).await?;
    report_repaired(&progress.import(&document).await?);
    Ok(())
}

async fn reset(progress: &ProgressGate, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("This erases all progress; run again with --yes");
    }
    progress.reset_all().await?;
    println!("Progress erased.");
    Ok(())
}

async fn write_document(path: &Path, document: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(document)?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Cannot write {}", path.display()))
}

async fn read_document(path: &Path) -> Result<serde_json::Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not JSON", path.display()))
}

fn report_repaired(repaired: &[String]) {
    if repaired.is_empty() {
        println!("Progress imported.");
    } else {
        println!(
            "Progress imported; reset to defaults: {}",
            repaired.join(", ")
        );
    }
}

async fn log_lifecycle(receiver: broadcast::Receiver<EventEnvelope>) {
    let mut stream = BroadcastStream::new(receiver);
    while let Some(result) = stream.next().await {
        match result {
            Ok(envelope) => info!(
                sequence = envelope.sequence,
                kind = envelope.event.kind(),
                phase = ?envelope.event.phase(),
                "Lifecycle event"
            ),
            Err(e) => warn!(error = %e, "Lifecycle log fell behind"),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aurora=info,director=info,progress=info".into()),
        )
        .init();
}
