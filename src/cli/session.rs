use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    storage::{
        day_store::{DayStore, UpsertOutcome},
        entities::DayRecord,
        key_value::KeyValueStore,
    },
    streak::compute_streak,
    timer::{
        notifier::{Notifier, Silent, TerminalBell},
        runner::{SessionOutcome, SessionRunner, TimerCommand, TimerStatus, DEFAULT_TICK_FREQUENCY},
        session::{SessionLength, TimerSession},
        shutdown::detect_shutdown,
    },
    utils::{
        clock::{Clock, DefaultClock},
        time::DayId,
    },
};

use super::{
    output::{format_seconds, format_streak},
    Store,
};

#[derive(Debug, Parser)]
pub struct SessionCommand {
    #[arg(
        short,
        long,
        help = "Session length in minutes. Presets are 5, 10, 15 and 20, anything from 1 works. Defaults to 10"
    )]
    minutes: Option<SessionLength>,
    #[arg(long, help = "Wait for `s` instead of starting right away")]
    paused: bool,
    #[arg(long, help = "Don't ring the terminal bell at the end")]
    silent: bool,
}

/// Line typed by the user while a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Command(TimerCommand),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    let input = match line {
        "" => Input::Command(TimerCommand::Refresh),
        "p" => Input::Command(TimerCommand::TogglePause),
        "s" => Input::Command(TimerCommand::Start),
        "r" => Input::Command(TimerCommand::Reset),
        "q" => Input::Quit,
        v if v.chars().all(|c| c.is_ascii_digit() || c == '-') => {
            Input::Command(TimerCommand::Select(v.parse().ok()?))
        }
        _ => return None,
    };
    Some(input)
}

/// Command to process `session`. Runs the timer in the foreground and marks today as done when
/// it runs out.
pub async fn process_session_command(
    SessionCommand {
        minutes,
        paused,
        silent,
    }: SessionCommand,
    store: &Store,
) -> Result<()> {
    let length = minutes.unwrap_or_default();
    let shutdown = CancellationToken::new();

    let mut session = TimerSession::new(length, Box::new(DefaultClock));
    if !paused {
        session.start();
    }

    let notifier: Box<dyn Notifier> = if silent {
        Box::new(Silent)
    } else {
        Box::new(TerminalBell)
    };

    let (sender, receiver) = mpsc::channel::<TimerCommand>(16);
    let runner = SessionRunner::new(
        session,
        receiver,
        notifier,
        shutdown.clone(),
        DEFAULT_TICK_FREQUENCY,
        Box::new(DefaultClock),
    );
    let status = runner.subscribe();

    let presets = SessionLength::PRESETS.map(|p| p.minutes().to_string()).join("/");
    println!(
        "{length} session. p pause/resume, s start, r reset, a number picks minutes ({presets}), enter refreshes, q quits"
    );
    tokio::spawn(read_commands(sender, shutdown.clone()));

    let (_, outcome, _) = tokio::join!(
        detect_shutdown(shutdown.clone()),
        async {
            let outcome = runner
                .run(|length| record_completion(store, &DefaultClock, length))
                .await;
            // Stops the shutdown listener.
            shutdown.cancel();
            outcome
        },
        render_status(status),
    );

    println!();
    match outcome? {
        SessionOutcome::Completed { length } => {
            let records = store.get_all_days().await;
            let streak = compute_streak(&records, &chrono::Local::now());
            println!("Session of {length} complete. {}", format_streak(streak));
        }
        SessionOutcome::Cancelled { remaining_seconds } => {
            println!("Stopped with {} left", format_seconds(remaining_seconds));
        }
    }
    Ok(())
}

/// Marks today as done. A record that can't be saved is logged and otherwise ignored.
async fn record_completion<S: KeyValueStore>(
    store: &DayStore<S>,
    clock: &dyn Clock,
    length: SessionLength,
) {
    let today = DayId::local(&clock.time());
    let record = DayRecord::completed(today, length.minutes(), clock.millis());

    match store.upsert_day(record).await {
        Ok(UpsertOutcome::Written) => info!("Marked {today} as done"),
        Ok(UpsertOutcome::Stale) => debug!("{today} already has a newer record"),
        Err(e) => warn!("Couldn't save the session for {today}: {e}"),
    }
}

async fn read_commands(sender: mpsc::Sender<TimerCommand>, shutdown: CancellationToken) {
    let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut inputs = lines.filter_map(|line| match line {
        Ok(line) => parse_input(&line),
        Err(e) => {
            warn!("Failed to read input {e}");
            None
        }
    });

    while let Some(input) = inputs.next().await {
        match input {
            Input::Command(command) => {
                if sender.send(command).await.is_err() {
                    return;
                }
            }
            Input::Quit => {
                shutdown.cancel();
                return;
            }
        }
    }
    debug!("Input closed");
}

/// Redraws the remaining time in place until the runner goes away.
async fn render_status(mut status: watch::Receiver<TimerStatus>) {
    let mut last_drawn = None;
    loop {
        let current = *status.borrow_and_update();
        let line = format!(
            "\r{} {:<7}",
            format_seconds(current.remaining_seconds),
            if current.running { "" } else { "paused" }
        );
        if last_drawn.as_ref() != Some(&line) {
            print!("{line}");
            let _ = std::io::stdout().flush();
            last_drawn = Some(line);
        }
        if status.changed().await.is_err() {
            return;
        }
    }
}
