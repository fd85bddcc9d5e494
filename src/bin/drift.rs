use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use drift_wm::actor::reactor::replay::{self, Record};
use drift_wm::actor::reactor::{Directive, Event, Reactor};
use drift_wm::common::config::{Config, config_file};
use drift_wm::common::log;
use tracing::{error, warn};

/// Tiling window manager decision core.
///
/// Consumes windowing-server events as JSON lines on stdin and emits
/// placement/focus directives as JSON lines on stdout; the server
/// collaborator owns the actual display connection and applies them.
#[derive(Parser)]
#[command(name = "drift", version)]
struct Cli {
    /// Path to the configuration file. Defaults to ~/.drift.toml; built-in
    /// defaults are used when neither exists.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check the configuration and exit.
    #[arg(long)]
    validate: bool,

    /// Record incoming events to this file. Overwrites the file if it
    /// exists; the recording can be fed back with --replay.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Replay a recorded event stream instead of reading stdin.
    #[arg(long)]
    replay: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let opt: Cli = Parser::parse();
    log::init_logging();

    let path = opt.config.unwrap_or_else(config_file);
    let mut config = if path.exists() {
        Config::read(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        Config::default_config()
    };

    let issues = config.validate();
    if opt.validate {
        if issues.is_empty() {
            println!("{}: ok", path.display());
            return Ok(());
        }
        for issue in &issues {
            eprintln!("{issue}");
        }
        bail!("{} configuration issues found", issues.len());
    }
    if !issues.is_empty() {
        for issue in &issues {
            warn!("config: {issue}");
        }
        let fixes = config.auto_fix_values();
        warn!("config: applied {fixes} automatic fixes");
    }

    let record = Record::new(opt.record.as_deref()).context("opening the recording file")?;
    let mut reactor = Reactor::with_record(config, record);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_directives(&mut out, reactor.startup())?;

    if let Some(path) = &opt.replay {
        for event in replay::replay(path)? {
            write_directives(&mut out, reactor.handle_event(event))?;
            if let Some(code) = reactor.exit_code() {
                std::process::exit(code);
            }
        }
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(err) => {
                error!(%err, "dropping undecodable event");
                continue;
            }
        };
        write_directives(&mut out, reactor.handle_event(event))?;
        if let Some(code) = reactor.exit_code() {
            std::process::exit(code);
        }
    }
    Ok(())
}

fn write_directives(out: &mut impl Write, directives: Vec<Directive>) -> anyhow::Result<()> {
    for directive in directives {
        serde_json::to_writer(&mut *out, &directive)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
