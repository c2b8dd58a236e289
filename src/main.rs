//! Quiz Runner
//!
//! Runs one quiz session over stdin/stdout. Each input line is a JSON
//! `ClientCommand`; each output line is a JSON `QuizUpdate`. Logs go to
//! stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use quiz_runner::{
    VERSION,
    config::RunnerConfig,
    quiz::{replay::replay_session, Quiz},
    runtime::{
        ClientCommand, DriverError, QuizDriver, QuizHandle, QuizUpdate, SessionOutcome,
    },
};

/// Used when `QUIZ_FILE` is not set.
const SAMPLE_QUIZ: &str = include_str!("../data/sample_quiz.json");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Quiz Runner v{}", VERSION);

    let config = RunnerConfig::from_env().context("Invalid configuration")?;
    let quiz = Arc::new(load_quiz(&config)?);

    info!(
        "Quiz {:?}: {} questions, {}s each, hint {:?}",
        quiz.title(),
        quiz.len(),
        config.quiz.seconds_per_question,
        config.quiz.hint
    );

    let handle = QuizDriver::spawn(quiz.clone(), config.quiz.clone(), config.driver.clone());
    let outcome = run_session(&handle).await?;

    match outcome {
        SessionOutcome::Completed(completion) => {
            let summary = &completion.summary;
            info!("=== Quiz Results ===");
            info!(
                "Score: {}/{} ({:.0}%), hint used: {}, timed out: {}",
                summary.score,
                summary.total,
                summary.percentage(),
                summary.hint_used,
                summary.forced_count
            );
            info!("Run digest: {}", summary.digest);

            // Verify determinism by replaying
            info!("=== Verifying Replay ===");
            let history = handle.history().await?;
            let replayed = replay_session(quiz, config.quiz, &history)?;
            info!("Replay digest: {}", replayed.digest());

            if replayed.digest() == summary.digest {
                info!("REPLAY VERIFIED: {} actions, digests match", history.len());
            } else {
                error!("REPLAY FAILURE: digests differ");
            }
        }
        SessionOutcome::Abandoned => {
            info!("Session {} abandoned", handle.session_id());
        }
    }

    Ok(())
}

fn load_quiz(config: &RunnerConfig) -> Result<Quiz> {
    match &config.quiz_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Quiz::from_json(&json).with_context(|| format!("Failed to load {}", path.display()))
        }
        None => Quiz::from_json(SAMPLE_QUIZ).context("Built-in sample quiz is invalid"),
    }
}

/// Pump stdin commands into the driver and driver updates to stdout until
/// the session ends.
async fn run_session(handle: &QuizHandle) -> Result<SessionOutcome> {
    let mut updates = handle.subscribe();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    write_update(&mut stdout, &QuizUpdate::Snapshot(handle.snapshot().await?)).await?;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match ClientCommand::from_json(&line) {
                    Ok(command) => {
                        if let Some(update) = dispatch(handle, command).await? {
                            write_update(&mut stdout, &update).await?;
                        }
                    }
                    Err(e) => warn!("Ignoring malformed command {:?}: {}", line, e),
                },
                None => {
                    info!("stdin closed");
                    stdin_open = false;
                    handle.abandon().await?;
                }
            },
            update = updates.recv() => match update {
                Ok(update) => {
                    write_update(&mut stdout, &update).await?;
                    if update.is_final() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("Output lagged, {} updates dropped", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(handle.finished().await?)
}

/// Forward one command. Returns an update to write directly, if any;
/// accepted mutations are reported through the broadcast instead.
async fn dispatch(handle: &QuizHandle, command: ClientCommand) -> Result<Option<QuizUpdate>> {
    let result = match command {
        ClientCommand::Select { option } => handle.select_option(option).await,
        ClientCommand::Submit => handle.submit_answer().await,
        ClientCommand::Advance => handle.advance().await,
        ClientCommand::Hint => handle.use_hint().await,
        ClientCommand::Snapshot => {
            return Ok(Some(QuizUpdate::Snapshot(handle.snapshot().await?)));
        }
        ClientCommand::Quit => {
            handle.abandon().await?;
            return Ok(None);
        }
    };

    match result {
        Ok(_) => Ok(None),
        Err(DriverError::Quiz(e)) => Ok(Some(QuizUpdate::Rejected(e))),
        Err(e) => Err(e.into()),
    }
}

async fn write_update(stdout: &mut Stdout, update: &QuizUpdate) -> Result<()> {
    let mut line = update.to_json()?;
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
