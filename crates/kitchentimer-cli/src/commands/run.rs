use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use kitchentimer_core::error::InputField;
use kitchentimer_core::timer::{
    format_clock, spawn_countdown, AlertSink, CancellationToken, CountdownEngine, HapticSink,
    LoopExit, NoopSink, SystemTimeSource, TimerLifecycleManager, TimerStores, TracingErrorReporter,
};
use kitchentimer_core::{Config, ExtraTimerId, Snapshot, TimerState};

const RENDER_INTERVAL: Duration = Duration::from_secs(1);
const FLASH: Duration = Duration::from_millis(80);

#[derive(Args)]
pub struct RunArgs {
    /// Main timer duration, in the configured unit (`config get main.unit`)
    #[arg(long)]
    main: String,
    /// Extra timer as LABEL=DURATION; repeat for more
    #[arg(long = "extra", value_parser = parse_extra)]
    extras: Vec<(String, String)>,
    /// Print a JSON snapshot per second instead of the live line
    #[arg(long)]
    json: bool,
}

fn parse_extra(raw: &str) -> Result<(String, String), String> {
    let (label, duration) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=DURATION, got '{raw}'"))?;
    if label.trim().is_empty() {
        return Err("extra timer label must not be empty".into());
    }
    Ok((label.trim().to_string(), duration.to_string()))
}

/// Rings the terminal bell.
struct TerminalBell;

impl AlertSink for TerminalBell {
    fn alert(&self) {
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

/// Terminals cannot vibrate; flash the screen instead.
struct VisualBell;

impl HapticSink for VisualBell {
    fn vibrate(&self) {
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x1b[?5h");
        let _ = err.flush();
        // Sinks must not block the tick; restore from a throwaway thread.
        std::thread::spawn(|| {
            std::thread::sleep(FLASH);
            let mut err = std::io::stderr();
            let _ = err.write_all(b"\x1b[?5l");
            let _ = err.flush();
        });
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_countdown(args, config))
}

async fn run_countdown(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Arc::new(TimerStores::new());
    let lifecycle = TimerLifecycleManager::new(stores.clone(), config.limits());
    for (label, duration) in &args.extras {
        lifecycle.add_extra_timer(label.as_str(), duration.as_str())?;
    }

    let started = match lifecycle.start_with_inputs(&args.main) {
        Ok(event) => event,
        Err(errors) => {
            for error in errors.iter() {
                let field = match error.field {
                    InputField::Main => "main".to_string(),
                    InputField::Extra(id) => lifecycle
                        .extra_input(&id)
                        .map(|input| input.label)
                        .unwrap_or_else(|| id.to_string()),
                };
                eprintln!("{field}: {}", error.reason);
            }
            return Err(format!("{} invalid duration(s)", errors.len()).into());
        }
    };
    if args.json {
        println!("{}", serde_json::to_string(&started)?);
    }

    let alert: Box<dyn AlertSink> = if config.alerts.sound {
        Box::new(TerminalBell)
    } else {
        Box::new(NoopSink)
    };
    let haptic: Box<dyn HapticSink> = if config.alerts.vibration {
        Box::new(VisualBell)
    } else {
        Box::new(NoopSink)
    };
    let engine = Arc::new(
        CountdownEngine::new(stores.clone(), SystemTimeSource::new(), alert, haptic)
            .with_tick_rate(config.engine.tick_rate_hz),
    );
    let handle = spawn_countdown(engine, CancellationToken::new(), TracingErrorReporter);

    let labels: Vec<_> = lifecycle
        .extra_inputs()
        .into_iter()
        .map(|input| (input.id, input.label))
        .collect();
    let mut render = tokio::time::interval(RENDER_INTERVAL);
    let mut last = stores.snapshot();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            _ = render.tick() => {
                last = stores.snapshot();
                if args.json {
                    println!("{}", serde_json::to_string(&last)?);
                } else {
                    eprint!("\r{}", render_line(&last, &labels));
                }
                if last.is_settled() || handle.is_finished() {
                    break;
                }
            }
        }
    }
    if !args.json {
        eprintln!();
    }
    if last.is_settled() && !last.all_finished() {
        eprintln!("main timer finished; unfinished extra timers stopped with it");
    }

    loop_outcome(handle.stop().await)
}

fn loop_outcome(exit: LoopExit) -> Result<(), Box<dyn std::error::Error>> {
    match exit {
        LoopExit::Cancelled => Ok(()),
        LoopExit::Failed => Err("countdown stopped after an internal failure".into()),
    }
}

fn render_line(snapshot: &Snapshot, labels: &[(ExtraTimerId, String)]) -> String {
    let mut parts = Vec::with_capacity(labels.len() + 1);
    if let Some(main) = snapshot.main {
        parts.push(format!("main {}", clock_or_done(&main)));
    }
    for entry in &snapshot.extras {
        let label = labels
            .iter()
            .find(|(id, _)| *id == entry.id)
            .map(|(_, label)| label.as_str())
            .unwrap_or("extra");
        parts.push(format!("{label} {}", clock_or_done(&entry.state)));
    }
    parts.join(" | ")
}

fn clock_or_done(state: &TimerState) -> String {
    if state.is_finished {
        "done".to_string()
    } else if state.is_paused {
        format!("{} (paused)", format_clock(state.remaining))
    } else {
        format_clock(state.remaining)
    }
}
