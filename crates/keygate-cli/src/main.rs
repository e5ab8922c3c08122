mod cli;

use std::io::BufRead;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use keygate_core::AppConfig;
use keygate_gate::{GateController, build_engine};
use keygate_hardware::Key;
use keygate_hardware::mock::{
    MockDisplay, MockDisplayHandle, MockKeypad, MockKeypadHandle, MockServo,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const SERVO_PIN: u8 = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.verbose);

    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(ms) = args.poll_interval_ms {
        config.engine.poll_interval_ms = ms;
        config.validate().context("applying --poll-interval-ms")?;
    }

    let (keypad, keys) = MockKeypad::new();
    let (servo, _servo) = MockServo::new(SERVO_PIN, "Gate");
    let (display, screen) = MockDisplay::new(config.display.lines, config.display.columns);
    let store = config.credential_store()?;
    info!("Loaded {} users", store.len());

    let controller = GateController::new(keypad, servo, display, store, config.gate.clone());
    let mut engine = build_engine(controller, &config.engine)?;

    spawn_stdin_reader(keys);
    let mirror = tokio::spawn(mirror_display(
        screen,
        config.display.columns,
        config.engine.poll_interval(),
    ));

    engine
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    mirror.abort();
    info!(
        "Stopped in state {} after {} transitions",
        engine.current_state(),
        engine.history().len()
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ if verbose => EnvFilter::new("debug"),
        _ => EnvFilter::new("info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Feed stdin characters to the keypad from a plain thread, since stdin
/// reads block.
fn spawn_stdin_reader(keys: MockKeypadHandle) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            };
            for c in line.chars().filter(|c| !c.is_whitespace()) {
                let key = match Key::from_char(c) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!("Ignoring input {:?}: {}", c, e);
                        continue;
                    }
                };
                if let Err(e) = keys.send_key_blocking(key) {
                    debug!("Keypad closed: {}", e);
                    return;
                }
            }
        }
        debug!("stdin closed");
    });
}

/// Print the simulated LCD whenever its contents change.
async fn mirror_display(screen: MockDisplayHandle, columns: usize, period: Duration) {
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(10)));
    let border = format!("+{}+", "-".repeat(columns));
    let mut last = Vec::new();
    loop {
        interval.tick().await;
        let lines = screen.all_lines();
        if lines == last {
            continue;
        }
        println!("{border}");
        for line in &lines {
            println!("|{line:<columns$}|");
        }
        println!("{border}");
        last = lines;
    }
}
