use std::time::Duration;

use anyhow::anyhow;
use chrono::{NaiveDateTime, Utc};
use hrvstream_types::{HrvSnapshot, RawBeatSample, TimedSample};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{SampleUpdate, Session, SessionConfig, SessionReport};

enum SessionCommand {
    Sample(TimedSample),
    Snapshot(oneshot::Sender<HrvSnapshot>),
    Stop(oneshot::Sender<SessionReport>),
}

/// A [`Session`] running on its own task.
///
/// Samples and the once-per-second ledger tick are handled by the same task,
/// so they never interleave.
pub struct LiveSession {
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

impl LiveSession {
    const COMMAND_BUFFER: usize = 64;
    const TICK: Duration = Duration::from_secs(1);

    /// Starts the session now. Each processed sample is forwarded on the
    /// returned receiver.
    pub fn spawn(config: SessionConfig) -> (Self, mpsc::UnboundedReceiver<SampleUpdate>) {
        let (commands, rx) = mpsc::channel(Self::COMMAND_BUFFER);
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let session = Session::start(config, now());
        let task = tokio::spawn(run(session, rx, updates));

        (Self { commands, task }, updates_rx)
    }

    pub async fn push(&self, sample: RawBeatSample) -> anyhow::Result<()> {
        self.push_timed(TimedSample { time: now(), sample }).await
    }

    pub async fn push_timed(&self, sample: TimedSample) -> anyhow::Result<()> {
        self.commands
            .send(SessionCommand::Sample(sample))
            .await
            .map_err(|_| anyhow!("Live session is no longer running"))
    }

    pub async fn snapshot(&self) -> anyhow::Result<HrvSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Snapshot(tx))
            .await
            .map_err(|_| anyhow!("Live session is no longer running"))?;
        Ok(rx.await?)
    }

    /// Stops the session and returns its report.
    pub async fn stop(self) -> anyhow::Result<SessionReport> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Stop(tx))
            .await
            .map_err(|_| anyhow!("Live session is no longer running"))?;
        let report = rx.await?;
        self.task.await?;
        Ok(report)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

async fn run(
    mut session: Session,
    mut commands: mpsc::Receiver<SessionCommand>,
    updates: mpsc::UnboundedSender<SampleUpdate>,
) {
    let mut ticker = interval(LiveSession::TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => session.tick(now()),
            command = commands.recv() => match command {
                Some(SessionCommand::Sample(TimedSample { time, sample })) => {
                    match session.handle_sample(time, sample) {
                        Ok(Some(update)) => {
                            // receiver may have been dropped, the session keeps running
                            let _ = updates.send(update);
                        }
                        Ok(None) => {}
                        Err(error) => warn!("{error}"),
                    }
                }
                Some(SessionCommand::Snapshot(reply)) => {
                    let _ = reply.send(session.snapshot().clone());
                }
                Some(SessionCommand::Stop(reply)) => {
                    session.stop(now());
                    let _ = reply.send(session.report());
                    break;
                }
                None => {
                    session.stop(now());
                    break;
                }
            }
        }
    }
}
