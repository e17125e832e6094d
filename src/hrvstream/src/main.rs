#[macro_use]
extern crate log;

use std::{io, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use hrvstream::{
    AthleteProfile, LiveSession, Session, SessionConfig, SessionReport,
    recording::{parse_line, read_intervals, read_recording},
};
use hrvstream_algos::HrvAnalyzer;
use hrvstream_types::{ArtifactPreset, ArtifactStrategy};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
pub struct HrvStreamCli {
    #[clap(subcommand)]
    pub subcommand: HrvStreamCommand,
}

#[derive(Subcommand)]
pub enum HrvStreamCommand {
    ///
    /// Compute an HRV snapshot from a file of RR intervals
    ///
    Analyze {
        input: PathBuf,
        /// Only use the trailing N intervals, 0 for all
        #[arg(long, default_value_t = 0)]
        window: usize,
    },
    ///
    /// Run a recorded session (JSON lines or hex payloads) and print its report
    ///
    Replay {
        input: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    ///
    /// Read samples from stdin in real time, print the report on EOF
    ///
    Live {
        #[command(flatten)]
        session: SessionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    ///
    /// Generate shell completions
    ///
    Completions { shell: Shell },
}

#[derive(Args)]
pub struct SessionArgs {
    #[arg(long = "anaerobic-threshold", env = "HRV_AT", default_value_t = 0.0)]
    pub anaerobic_threshold_hr: f64,
    #[arg(long, env = "HRV_RESTING_HR", default_value_t = 0.0)]
    pub resting_hr: f64,
    #[arg(long, env = "HRV_MAX_HR", default_value_t = 0.0)]
    pub max_hr: f64,
    #[arg(long, env = "HRV_PRESET")]
    pub preset: Option<ArtifactPreset>,
    #[arg(long, env = "HRV_ARTIFACT_STRATEGY", default_value_t)]
    pub strategy: ArtifactStrategy,
    #[arg(long, env = "HRV_WINDOW", default_value_t = HrvAnalyzer::DEFAULT_WINDOW)]
    pub hrv_window: usize,
}

impl From<SessionArgs> for SessionConfig {
    fn from(args: SessionArgs) -> Self {
        SessionConfig {
            profile: AthleteProfile::new(args.anaerobic_threshold_hr, args.resting_hr, args.max_hr),
            preset: args.preset,
            strategy: args.strategy,
            hrv_window: args.hrv_window,
        }
    }
}

#[derive(Args)]
pub struct OutputArgs {
    /// Leave the per-beat interval and sample archives out of the report
    #[arg(long)]
    pub summary: bool,
}

impl OutputArgs {
    fn print(&self, report: SessionReport) -> anyhow::Result<()> {
        let report = match self.summary {
            true => report.summary(),
            false => report,
        };
        print_json(&report)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        debug!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = HrvStreamCli::parse();

    match cli.subcommand {
        HrvStreamCommand::Analyze { input, window } => {
            let intervals = read_intervals(&input)?;
            info!("Analyzing {} intervals", intervals.len());
            print_json(&HrvAnalyzer::analyze_window(&intervals, window))
        }
        HrvStreamCommand::Replay {
            input,
            session,
            output,
        } => {
            let samples = read_recording(&input, Utc::now().naive_utc())?;
            let Some(first) = samples.first() else {
                anyhow::bail!("{} contains no samples", input.display());
            };

            let mut session = Session::start(session.into(), first.time);
            let mut last = first.time;
            for timed in samples {
                session.tick(timed.time);
                last = last.max(timed.time);
                if let Err(error) = session.handle_sample(timed.time, timed.sample) {
                    warn!("{error}");
                }
            }

            session.stop(last);
            output.print(session.report())
        }
        HrvStreamCommand::Live { session, output } => {
            let (live, mut updates) = LiveSession::spawn(session.into());
            tokio::spawn(async move {
                while let Some(update) = updates.recv().await {
                    info!(
                        "{} bpm, zone {}, rmssd {:.1}ms, {:.1} breaths/min",
                        update.heart_rate, update.zone, update.rmssd, update.breath_rate
                    );
                    if update.artifacts > 0 {
                        debug!("{} artifact(s) replaced or dropped", update.artifacts);
                    }
                    if let Some(cycle) = update.breath_cycle {
                        info!("breath {:.1}/min, {}", cycle.breath_rate, cycle.depth);
                    }
                }
            });

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                match parse_line(&line, Utc::now().naive_utc()) {
                    Ok(Some(timed)) => live.push_timed(timed).await?,
                    Ok(None) => {}
                    Err(error) => warn!("{error:#}"),
                }
            }

            output.print(live.stop().await?)
        }
        HrvStreamCommand::Completions { shell } => {
            let mut command = HrvStreamCli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
