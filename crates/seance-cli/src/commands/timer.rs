use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use seance_core::notify;
use seance_core::remote::{token_store, Claims, NewSeance};
use seance_core::storage::Database;
use seance_core::timer::format_hms;
use seance_core::{
    BreakType, Config, Event, Phase, SessionConfig, SessionSummary, SnapshotStore, TimerEngine,
    TimerService, TransitionError,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

use super::{print_json, services, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a new study session
    Start {
        /// Session name
        #[arg(long, default_value = "")]
        name: String,
        /// Session type, e.g. "revision" or "examen"
        #[arg(long, default_value = "")]
        kind: String,
        #[arg(long)]
        study_min: Option<u64>,
        #[arg(long)]
        short_break_min: Option<u64>,
        #[arg(long)]
        long_break_min: Option<u64>,
        #[arg(long)]
        cycles: Option<u32>,
        #[arg(long)]
        total_min: Option<u64>,
        /// Do not create the séance remotely; use a local id
        #[arg(long)]
        offline: bool,
    },
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Start the break, or the next study interval
    Confirm,
    /// End the session and report it
    Stop,
    /// Print the current timer state as JSON
    Status,
    /// Drive the countdown in the foreground
    Run,
}

/// Prefix of ids generated for sessions that have no remote séance.
const LOCAL_ID_PREFIX: &str = "local-";

fn open_engine(config: &Config) -> Result<TimerEngine<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(TimerEngine::new(
        SnapshotStore::new(db),
        notify::from_config(&config.notifications),
    ))
}

pub async fn run(action: TimerAction) -> CliResult {
    let config = Config::load()?;
    let mut engine = open_engine(&config)?;

    match action {
        TimerAction::Start {
            name,
            kind,
            study_min,
            short_break_min,
            long_break_min,
            cycles,
            total_min,
            offline,
        } => {
            if !engine.state().is_idle() {
                return Err(TransitionError::AlreadyActive.into());
            }
            let defaults = &config.session;
            let mut session = SessionConfig::from_minutes(
                study_min.unwrap_or(defaults.study_min),
                short_break_min.unwrap_or(defaults.short_break_min),
                long_break_min.unwrap_or(defaults.long_break_min),
                cycles.unwrap_or(defaults.cycles_before_long_break),
                total_min.unwrap_or(defaults.total_min),
            );
            session.session_name = name;
            session.session_type = kind;
            session.flags.sound_alert = config.notifications.enabled;
            session.validate()?;

            let session_id = if offline {
                format!("{LOCAL_ID_PREFIX}{}", uuid::Uuid::new_v4())
            } else {
                create_remote(&config, &session).await?
            };
            let event = engine.start_session(session, session_id)?;
            print_json(&event)?;
        }
        TimerAction::Pause => print_json(&engine.pause()?)?,
        TimerAction::Resume => print_json(&engine.resume()?)?,
        TimerAction::Confirm => print_json(&engine.confirm()?)?,
        TimerAction::Stop => {
            let session_id = engine.state().active_session_id.clone();
            let stopped = engine.stop()?;
            mirror_end(&config, session_id.as_deref(), &stopped.summary).await;
            print_json(&stopped.summary)?;
        }
        TimerAction::Status => print_json(&engine.snapshot())?,
        TimerAction::Run => {
            if engine.state().is_idle() {
                return Err("no active session, start one with `seance start`".into());
            }
            drive(&config, TimerService::new(engine)).await?;
        }
    }
    Ok(())
}

/// Create the remote séance and return its id.
async fn create_remote(
    config: &Config,
    session: &SessionConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let token = token_store::get()?.ok_or("not logged in, run `seance login` or pass --offline")?;
    let claims = Claims::decode(&token)?;
    let remote = services(config)?;
    let seance = remote
        .seances
        .create(&NewSeance::from_config(session, claims.sub, Utc::now()))
        .await?;
    Ok(seance.id)
}

/// Report the ended session. Failures are logged; the local stop stands.
async fn mirror_end(config: &Config, session_id: Option<&str>, summary: &SessionSummary) {
    let Some(id) = session_id.filter(|id| !id.starts_with(LOCAL_ID_PREFIX)) else {
        return;
    };
    match token_store::get() {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::debug!("not logged in, séance end not reported");
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot read access token");
            return;
        }
    }
    let remote = match services(config) {
        Ok(remote) => remote,
        Err(e) => {
            tracing::warn!(error = %e, "séance end not reported");
            return;
        }
    };
    if let Err(e) = remote.seances.end(id, summary).await {
        tracing::warn!(error = %e, session_id = id, "séance end not reported");
    }
}

fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::SessionStarted { session_id, .. } => format!("session {session_id} started"),
        Event::Paused { .. } => "paused".into(),
        Event::Resumed { .. } => "resumed".into(),
        Event::AwaitingBreak {
            cycles_completed,
            upcoming_break_type,
            ..
        } => {
            let kind = match upcoming_break_type {
                BreakType::Long => "long",
                BreakType::Short => "short",
            };
            format!("pomodoro {cycles_completed} done, {kind} break next. [c] to start it")
        }
        Event::BreakStarted { duration_sec, .. } => {
            format!("break started ({})", hms(*duration_sec))
        }
        Event::AwaitingStudy { .. } => "break over. [c] to get back to work".into(),
        Event::StudyResumed { .. } => "studying".into(),
        Event::SessionCompleted {
            cycles_completed, ..
        } => format!("session complete after {cycles_completed} pomodoros. [s] to finish"),
        Event::SessionStopped { .. } => "session stopped".into(),
        Event::StateSnapshot { .. } => return None,
    };
    Some(line)
}

fn hms(secs: u64) -> String {
    format_hms(i64::try_from(secs).unwrap_or(i64::MAX))
}

fn status_line(svc: &TimerService<Database>) -> String {
    let s = svc.state();
    let paused = if s.is_paused { " (paused)" } else { "" };
    format!(
        "\r{:<14} {}{}  session left {}   ",
        s.phase.as_str(),
        hms(s.time_left_sec),
        paused,
        format_hms(s.remaining_session_sec()),
    )
}

/// Stdin lines read on a plain thread. The thread may stay blocked in a
/// read after the loop exits; it never holds the process open.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin");
                    return;
                }
            }
        }
    });
    rx
}

/// Foreground loop: render the countdown and map single-letter commands
/// to intents until the session is stopped or the user detaches.
async fn drive(config: &Config, svc: TimerService<Database>) -> CliResult {
    let mut events = svc.subscribe();
    let mut lines = stdin_lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut refresh = tokio::time::interval(Duration::from_secs(1));

    println!("[p] pause  [r] resume  [c] confirm  [s] stop  [q] detach");
    loop {
        tokio::select! {
            _ = refresh.tick() => {
                print!("{}", status_line(&svc));
                std::io::stdout().flush()?;
            }
            received = events.recv() => match received {
                Ok(event) => {
                    if let Some(line) = describe(&event) {
                        println!("\n{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.recv() => {
                let Some(line) = line else {
                    svc.detach();
                    break;
                };
                let outcome = match line.trim() {
                    "p" => svc.pause().map(|_| ()),
                    "r" => svc.resume().map(|_| ()),
                    "c" => svc.confirm().map(|_| ()),
                    "s" => {
                        let session_id = svc.state().active_session_id;
                        let stopped = svc.stop()?;
                        mirror_end(config, session_id.as_deref(), &stopped.summary).await;
                        println!();
                        print_json(&stopped.summary)?;
                        break;
                    }
                    "q" => {
                        svc.detach();
                        println!("\ndetached, the session is saved");
                        break;
                    }
                    "" => Ok(()),
                    other => {
                        println!("\nunknown command: {other}");
                        Ok(())
                    }
                };
                if let Err(e) = outcome {
                    println!("\n{e}");
                }
            }
            _ = &mut ctrl_c => {
                svc.detach();
                println!("\ndetached, the session is saved");
                break;
            }
        }
        if svc.state().phase == Phase::Idle {
            break;
        }
    }
    Ok(())
}
