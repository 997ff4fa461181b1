use std::io::Write;

use anyhow::{Context, Result};
use warden_config::{discover, load_from_path, DEFAULT_FILENAMES};
use warden_core::{ActionReport, LifecycleSupervisor, Outcome};
use warden_types::{Action, ServiceConfig};

use crate::{config::Cli, logger::Logger};

fn load(cli: &Cli) -> Result<ServiceConfig> {
    let file = match &cli.file {
        Some(file) => file.clone(),
        None => {
            let cwd = std::env::current_dir().context("cannot resolve working directory")?;
            discover(&cwd).with_context(|| {
                format!("no config file given and none of {DEFAULT_FILENAMES:?} found")
            })?
        }
    };

    let mut config =
        load_from_path(&file).with_context(|| format!("cannot load {}", file.display()))?;
    if let Some(run_dir) = &cli.run_dir {
        config.run_dir.clone_from(run_dir);
    }
    config.strict_kill |= cli.strict_kill;
    config.lock |= cli.lock;

    Ok(config)
}

fn summarize<W: Write>(logger: &mut Logger<W>, report: &ActionReport) {
    let message = match &report.outcome {
        Outcome::Status(status) => status.to_string(),
        Outcome::AlreadyRunning(status) => format!("already started ({status})"),
        Outcome::Started { pid } => format!("started with pid {pid}"),
        Outcome::StartTimeout { pid } => format!("pid {pid} did not survive startup"),
        Outcome::AlreadyStopped => "already stopped".to_owned(),
        Outcome::NothingToKill { pid } => format!("pid {pid} was already gone"),
        Outcome::Stopped { pid } => format!("stopped pid {pid}"),
        Outcome::StopEscalated { pid, forced } => {
            let signal = if *forced { "SIGKILL" } else { "SIGALRM" };
            format!("stopped pid {pid} with {signal}")
        }
        Outcome::StopFailed { pid } => format!("pid {pid} survived SIGKILL"),
        Outcome::Restarted { .. } => "restarted".to_owned(),
        Outcome::Registered { tools } => format!("registered with {}", tools.join(", ")),
        Outcome::NoRegistrar => "no boot registrar available".to_owned(),
    };

    if !report.success() {
        logger.failure(&message);
    } else if report.outcome.is_warning() {
        logger.warn(&message);
    } else {
        logger.success(&message);
    }
}

/// Run one action against the configured service and return the exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let config = load(&cli)?;
    let action = Action::from(cli.command);
    let service = config.name.full();
    tracing::debug!("Loaded config for {service}: {config:?}");

    let mut narrator = Logger::default();
    let mut supervisor = LifecycleSupervisor::system(config)
        .on_narrative(move |line| narrator.log(&service, line));

    let report = supervisor
        .run(action)
        .await
        .with_context(|| format!("{action} failed"))?;

    summarize(&mut Logger::default(), &report);
    Ok(report.exit_code())
}
