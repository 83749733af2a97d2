use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{info, warn, LevelFilter};

use crate::catalog::load_catalog_files;
use crate::config::{self, Config, ConfigError, MatchMode};
use crate::contract::StateSnapshot;
use crate::controller::{ControllerError, OverlayController};
use crate::overlay_state::OverlayState;
use crate::transport::{handle_json, JsonLineHost, JsonLineSink, JsonLineView};

const IDLE_WAIT: Duration = Duration::from_secs(3600);

#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Controller(ControllerError),
    Io(std::io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Controller(error) => write!(f, "controller error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ControllerError> for RuntimeError {
    fn from(value: ControllerError) -> Self {
        Self::Controller(value)
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub catalog_paths: Vec<PathBuf>,
    pub match_mode: Option<MatchMode>,
    pub log_to_file: bool,
    pub write_default_config: bool,
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut options = RuntimeOptions {
        log_to_file: true,
        ..RuntimeOptions::default()
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or("--config requires a path")?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--catalog" => {
                let value = iter.next().ok_or("--catalog requires a path")?;
                options.catalog_paths.push(PathBuf::from(value));
            }
            "--match-mode" => {
                let value = iter.next().ok_or("--match-mode requires a value")?;
                let mode = MatchMode::parse(value).ok_or_else(|| {
                    format!("unknown match mode '{value}'; use prefix or substring")
                })?;
                options.match_mode = Some(mode);
            }
            "--no-log-file" => options.log_to_file = false,
            "--write-config" => options.write_default_config = true,
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    Ok(options)
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let mut cfg = config::load(options.config_path.as_deref())?;
    if options.write_default_config && !cfg.config_path.exists() {
        config::save(&cfg)?;
        eprintln!("[flick-core] wrote default config to {}", cfg.config_path.display());
    }
    if let Some(mode) = options.match_mode {
        cfg.match_mode = mode;
    }
    cfg.catalog_paths.extend(options.catalog_paths);

    if options.log_to_file && cfg.log_to_file {
        let dir = crate::logging::logs_dir();
        if let Err(error) = crate::logging::init(&dir, LevelFilter::Info) {
            eprintln!("[flick-core] file logging disabled: {error}");
        }
    }

    let sink = JsonLineSink::new(std::io::stdout());
    let mut controller = start_controller(&cfg, &sink, &mut std::io::stderr())?;
    let lines = spawn_stdin_reader();
    run_event_loop(&mut controller, &lines, &sink)?;
    info!("event loop finished");
    Ok(())
}

/// Builds a controller that speaks JSON lines on `sink` and loads the configured catalog
/// files. `sink` carries protocol messages only; the startup banner goes to `diagnostics`.
pub fn start_controller<W, D>(
    cfg: &Config,
    sink: &JsonLineSink<W>,
    diagnostics: &mut D,
) -> Result<OverlayController<JsonLineHost<W>, JsonLineView<W>>, RuntimeError>
where
    W: Write + 'static,
    D: Write,
{
    writeln!(
        diagnostics,
        "[flick-core] startup config_path={} hide_delay_ms={} max_results={} match_mode={:?}",
        cfg.config_path.display(),
        cfg.hide_delay_ms,
        cfg.max_results,
        cfg.match_mode,
    )?;

    let mut controller = OverlayController::new(cfg, JsonLineHost::new(sink.clone()))?;
    controller.attach_view(JsonLineView::new(sink.clone()));
    let state_sink = sink.clone();
    controller.subscribe(Box::new(move |state: &OverlayState| {
        if let Err(error) = state_sink.emit_state(StateSnapshot::from(state)) {
            warn!("state update not delivered: {error}");
        }
    }));

    if !cfg.catalog_paths.is_empty() {
        let files = load_catalog_files(&cfg.catalog_paths);
        for warning in &files.load_warnings {
            warn!("{warning}");
        }
        let payload = files.into_payload();
        controller.replace_catalog(&payload);
    }
    info!(
        "startup catalog_entries={}",
        controller.catalog().map(|c| c.len()).unwrap_or(0)
    );
    Ok(controller)
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Dispatches input lines until the input closes. Waiting is bounded by the next timer
/// deadline, so a pending dismissal completes on time even without further input.
pub fn run_event_loop<H, V, F, W>(
    controller: &mut OverlayController<H, V, F>,
    lines: &Receiver<String>,
    sink: &JsonLineSink<W>,
) -> Result<(), RuntimeError>
where
    H: crate::host::HostBridge,
    V: crate::view::View,
    F: crate::assets::AssetFactory,
    W: Write,
{
    loop {
        let wait = controller
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_WAIT);

        match lines.recv_timeout(wait) {
            Ok(line) => {
                let now = Instant::now();
                controller.poll_timers(now);
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(error) = handle_json(controller, &line, now) {
                    warn!("rejected host message: {}", error.message);
                    sink.emit(&error.to_message())?;
                }
            }
            Err(RecvTimeoutError::Timeout) => controller.poll_timers(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Input closed: let an in-flight dismissal reach the host before teardown.
    if let Some(deadline) = controller.next_deadline() {
        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        controller.poll_timers(deadline);
    }
    Ok(())
}
