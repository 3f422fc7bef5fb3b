//! Folio entrypoint.
use anyhow::{Context, Result};
use clap::Parser;
use core_book::Book;
use core_config::{EffectiveConfig, load_from};
use core_content::{Page, demo_pages, load_pages};
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, TickEventSource};
use core_gesture::GestureTuning;
use core_render::writer::Writer;
use core_render::{Reader, TerminalLayer};
use core_terminal::{CrosstermBackend, TerminalBackend};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod input;
mod session;

use session::ReaderSession;

const DEFAULT_TITLE: &str = "Folio";
const FALLBACK_SIZE: (u16, u16) = (80, 24);
const SOURCE_GRACE: Duration = Duration::from_millis(200);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Page-turn book reader for the terminal")]
struct Args {
    /// Optional TOML pages file. If omitted the built-in demo book is shown.
    pub pages: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `folio.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Window and header title. Defaults to the pages file stem.
    #[arg(long = "title")]
    pub title: Option<String>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext<'a> {
    reader: Reader<TerminalLayer>,
    config: core_config::Config,
    terminal_guard: core_terminal::TerminalGuard<'a>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run<'a>(&'a mut self, args: &Args) -> Result<RuntimeContext<'a>> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        // Everything that can fail on bad input happens before raw mode.
        let config = load_from(args.config.clone())?;
        let pages = match args.pages.as_deref() {
            Some(path) => load_pages(path)
                .with_context(|| format!("cannot open book {}", path.display()))?,
            None => demo_pages(),
        };
        let title = book_title(args);

        self.backend.set_title(&title)?;
        let (width, height) = self.backend.size().unwrap_or(FALLBACK_SIZE);
        let guard = self.backend.enter_guard()?;

        let page_count = pages.len();
        let path_str = args.pages.as_ref().map(|p| p.display().to_string());
        let reader = build_reader(pages, &title, &config.effective, width, height);
        info!(
            target: "runtime.startup",
            title = title.as_str(),
            pages = page_count,
            leaves = reader.book().len(),
            path = path_str.as_deref(),
            config_override = args.config.is_some(),
            threshold_ratio = config.effective.threshold_ratio,
            width,
            height,
            "bootstrap_complete"
        );

        Ok(RuntimeContext {
            reader,
            config,
            terminal_guard: guard,
        })
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("folio.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "folio.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        if tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn book_title(args: &Args) -> String {
    if let Some(title) = args.title.as_ref() {
        return title.clone();
    }
    args.pages
        .as_deref()
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

fn tuning_from(effective: &EffectiveConfig) -> GestureTuning {
    GestureTuning {
        threshold_ratio: effective.threshold_ratio,
        travel_ratio: effective.travel_ratio,
        settle: effective.settle,
    }
}

fn build_reader(
    pages: Vec<Page>,
    title: &str,
    effective: &EffectiveConfig,
    width: u16,
    height: u16,
) -> Reader<TerminalLayer> {
    let layer = TerminalLayer::new(title, width, height, effective.settle);
    let half = layer.half_width();
    Reader::new(
        Book::from_pages(pages),
        layer,
        half,
        tuning_from(effective),
        effective.resize_debounce,
    )
}

struct FolioRuntime<'a> {
    session: ReaderSession,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    input_task: Option<tokio::task::JoinHandle<()>>,
    input_shutdown: Option<core_input::AsyncInputShutdown>,
    _terminal_guard: core_terminal::TerminalGuard<'a>,
}

enum LoopControl {
    Continue { redraw: bool },
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    CtrlC,
    KeyQuit,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CtrlC => "ctrl_c",
            ShutdownReason::KeyQuit => "key_quit",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

impl<'a> FolioRuntime<'a> {
    fn new(
        context: RuntimeContext<'a>,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        input_task: tokio::task::JoinHandle<()>,
        input_shutdown: core_input::AsyncInputShutdown,
        source_handles: Vec<tokio::task::JoinHandle<()>>,
    ) -> Self {
        let RuntimeContext {
            reader,
            terminal_guard,
            ..
        } = context;
        Self {
            session: ReaderSession::new(reader),
            rx,
            tx: Some(tx),
            source_handles,
            input_task: Some(input_task),
            input_shutdown: Some(input_shutdown),
            _terminal_guard: terminal_guard,
        }
    }

    async fn run(&mut self) -> Result<()> {
        self.render();

        let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
        let reason = pump_events(&mut self.session, &mut self.rx, render_frame)
            .instrument(loop_span.clone())
            .await;

        self.rx.close();
        self.finalize_shutdown(reason).instrument(loop_span).await;
        Ok(())
    }

    fn render(&mut self) {
        render_frame(&mut self.session);
    }

    /// Hang up the channel, give event sources a bounded grace period, then
    /// stop and join the input task. The terminal guard restores the screen
    /// when the runtime drops.
    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        drop(self.tx.take());

        for handle in self.source_handles.drain(..) {
            match tokio::time::timeout(SOURCE_GRACE, handle).await {
                Ok(joined) => log_task_exit(reason, "event_source", joined),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }

        if let Some(shutdown) = self.input_shutdown.take() {
            shutdown.signal();
        }
        if let Some(handle) = self.input_task.take() {
            log_task_exit(reason, "input", handle.await);
        }

        log_shutdown_stage(reason, "complete");
    }
}

/// Feed loop events into the session until a quit or a closed channel.
/// `render` runs whenever an event changed the picture or a rotation is still
/// moving.
async fn pump_events<F>(
    session: &mut ReaderSession,
    rx: &mut mpsc::Receiver<Event>,
    mut render: F,
) -> ShutdownReason
where
    F: FnMut(&mut ReaderSession),
{
    while let Some(event) = rx.recv().await {
        let now = Instant::now();
        let control = match &event {
            Event::Input(input) => session.handle_input(input, now),
            Event::Tick => LoopControl::Continue {
                redraw: session.tick(now),
            },
        };
        match control {
            LoopControl::Break { reason } => return reason,
            LoopControl::Continue { redraw } => {
                if redraw || session.wants_frame() {
                    render(session);
                }
            }
        }
    }
    ShutdownReason::ChannelClosed
}

fn render_frame(session: &mut ReaderSession) {
    let frame = session.layer_mut().compose(Instant::now());
    let mut writer = Writer::from_frame(&frame);
    if session.take_needs_clear() {
        writer = writer.with_clear();
    }
    if let Err(e) = writer.flush() {
        error!(target: "render.terminal", ?e, "frame_flush_failed");
    }
}

fn log_task_exit(
    reason: ShutdownReason,
    task: &'static str,
    joined: Result<(), tokio::task::JoinError>,
) {
    match joined {
        Ok(()) => trace!(target: "runtime.shutdown", reason = reason.as_str(), task, "task_stopped"),
        Err(err) if err.is_cancelled() => {
            trace!(target: "runtime.shutdown", reason = reason.as_str(), task, "task_cancelled")
        }
        Err(err) => error!(
            target: "runtime.shutdown",
            reason = reason.as_str(),
            task,
            ?err,
            "task_join_failed"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let context = startup.run(&args)?;
    let tick = context.config.effective.tick;
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone());
    let mut registry = EventSourceRegistry::new();
    registry.register(TickEventSource::new(tick));
    let source_handles = registry.spawn_all(&tx);

    let mut runtime =
        FolioRuntime::new(context, tx, rx, input_task, input_shutdown, source_handles);
    runtime.run().await
}
