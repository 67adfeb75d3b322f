use std::{io::Write as _, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use cascade::{CascadeSession, CompletionOutcome, SelectionState, Transition};
use clap::Parser;
use shared::domain::TermId;
use term_store::{HttpTermRepository, TermStoreEndpoint};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::UiCommand;
use config::{load_settings, Settings};
use render::Screen;

/// Drill into a three-level term store taxonomy.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "term_picker.toml")]
    config: PathBuf,
    #[arg(long)]
    site_url: Option<String>,
    /// Term whose children populate level one.
    #[arg(long)]
    anchor: Option<String>,
    /// Load level one, print it and exit.
    #[arg(long)]
    once: bool,
    /// With --once, print the state as JSON instead of text.
    #[arg(long, requires = "once")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(site_url) = args.site_url {
        settings.site_url = site_url;
    }
    if let Some(anchor) = args.anchor {
        settings.anchor_term_id = anchor;
    }

    let mut session = build_session(&settings)?;
    session.mount();

    if args.once {
        session.settle().await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(session.state())?);
        } else {
            print!("{}", Screen(session.state()));
        }
        return Ok(());
    }

    run_interactive(session).await
}

fn build_session(settings: &Settings) -> Result<CascadeSession> {
    let anchor = TermId::new(settings.anchor_term_id.clone()).context("invalid anchor term id")?;
    let endpoint =
        TermStoreEndpoint::new(&settings.site_url, &settings.group_id, &settings.set_id)
            .context("invalid term store endpoint")?;
    let mut repository = HttpTermRepository::with_timeout(
        endpoint,
        Duration::from_secs(settings.request_timeout_secs),
    )
    .context("failed to build http client")?;
    if let Some(token) = &settings.access_token {
        repository = repository.with_access_token(token.clone());
    }
    tracing::info!(site_url = %settings.site_url, "term store configured");
    Ok(CascadeSession::new(Arc::new(repository), anchor))
}

async fn run_interactive(mut session: CascadeSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    draw(session.state(), None)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let notice = match UiCommand::parse(&line, session.state()) {
                    Ok(UiCommand::Quit) => break,
                    Ok(command) => apply(&mut session, command),
                    Err(err) => Some(err.to_string()),
                };
                draw(session.state(), notice.as_deref())?;
            }
            outcome = session.next_completion() => match outcome {
                Some(CompletionOutcome::Stale { .. }) => {}
                Some(_) => draw(session.state(), None)?,
                None => break,
            },
        }
    }
    Ok(())
}

fn apply(session: &mut CascadeSession, command: UiCommand) -> Option<String> {
    let transition = match command {
        UiCommand::Select { level, term } => session.on_level_select(level, Some(term)),
        UiCommand::Clear { level } => session.on_level_select(level, None),
        UiCommand::Retry { level } => {
            return (!session.retry(level)).then(|| format!("level {level} has not failed"));
        }
        UiCommand::Show | UiCommand::Quit => return None,
    };
    match transition {
        Transition::Rejected(rejected) => Some(rejected.to_string()),
        Transition::Unchanged | Transition::Applied { .. } => None,
    }
}

fn draw(state: &SelectionState, notice: Option<&str>) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", Screen(state))?;
    if let Some(notice) = notice {
        writeln!(stdout, "! {notice}")?;
    }
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}
