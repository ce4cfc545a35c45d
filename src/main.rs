mod config;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use botmon_client::HttpLogSource;
use botmon_logs::{LogView, PinThreshold, SessionError};
use botmon_tui::{
    Action, AppState, ConfirmDialog, Event, EventHandler, HelpOverlay, KeyBindings,
    LogViewerScreen, Tui, cycle_level, cycle_level_back, plain_line,
};

use crate::config::{FileConfig, Overrides, Settings};

/// botmon - tail the agent service's monitor log from the terminal
#[derive(Parser, Debug)]
#[command(name = "botmon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the service (e.g. http://localhost:1314)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Base URL of the service (same as the positional argument)
    #[arg(long = "url", value_name = "URL", conflicts_with = "url")]
    url_flag: Option<String>,

    /// Server-side level filter: all, debug, info, warn, error, fatal
    #[arg(long)]
    level: Option<String>,

    /// Maximum number of records kept in memory
    #[arg(long)]
    capacity: Option<usize>,

    /// Milliseconds between incremental polls
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Page size requested for full loads
    #[arg(long)]
    limit: Option<usize>,

    /// Config file (default: ~/.config/botmon/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print new records to stdout instead of opening the terminal UI
    #[arg(long)]
    plain: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.url.clone().or_else(|| self.url_flag.clone()),
            poll_interval_ms: self.poll_interval_ms,
            request_timeout_ms: self.timeout_ms,
            capacity: self.capacity,
            full_load_limit: self.limit,
            level: self.level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref(), args.plain)?;

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Diagnostics go to `--log-file`, else stderr in plain mode. The terminal UI
/// owns the screen, so without a log file they are discarded there.
fn init_tracing(log_file: Option<&Path>, plain: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
    );

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None if plain => builder.with_writer(std::io::stderr).init(),
        None => builder.with_writer(std::io::sink).init(),
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let file = FileConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    let settings = Settings::resolve(file, args.overrides()).context("invalid configuration")?;

    let source = HttpLogSource::new(&settings.base_url, settings.session.request_timeout)
        .with_context(|| format!("cannot use service URL '{}'", settings.base_url))?;
    info!(endpoint = %source.endpoint(), "tailing monitor endpoint");

    let view = LogView::open(Arc::new(source), settings.session.clone(), settings.level)
        .with_threshold(PinThreshold::Units(settings.pin_threshold_rows));

    if args.plain {
        run_plain(view).await
    } else {
        run_app(view, settings.base_url).await
    }
}

/// Results of async operations finishing off the UI loop
enum InternalAction {
    ClearDone(Result<(), SessionError>),
}

async fn run_app(mut view: LogView, service_url: String) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();

    let mut state = AppState::new(service_url);
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let keybindings = KeyBindings::new();

    render(&mut tui, &state, &mut view)?;

    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = keybindings.get_action(state.key_context(), &key) {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick => {
                        if view.is_loading() {
                            state.render_dirty = true;
                        }
                    }
                    Event::Resize(_, _) => {
                        state.render_dirty = true;
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                        state.render_dirty = true;
                    }
                }
            }

            // New snapshot from the sync session
            alive = view.changed() => {
                if !alive {
                    state.should_quit = true;
                } else if view.refresh() {
                    state.render_dirty = true;
                }
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &mut view, &internal_tx, action);
            }

            // Handle internal async actions
            Some(internal) = internal_rx.recv() => {
                match internal {
                    InternalAction::ClearDone(result) => {
                        if let Err(e) = result {
                            state.show_error(format!("Clear failed: {}", e));
                        }
                        view.refresh();
                        state.render_dirty = true;
                    }
                }
            }
        }

        if state.should_quit {
            break;
        }

        if state.render_dirty {
            render(&mut tui, &state, &mut view)?;
            state.render_dirty = false;
        }
    }

    // Cleanup
    view.close();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action(
    state: &mut AppState,
    view: &mut LogView,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
    action: Action,
) {
    state.render_dirty = true;

    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::ToggleTimestamps => {
            state.ui_state.show_timestamps = !state.ui_state.show_timestamps;
        }
        Action::ToggleAttributes => {
            state.ui_state.show_attributes = !state.ui_state.show_attributes;
        }

        // Viewport
        Action::ScrollUp(n) => view.scroll_up(n),
        Action::ScrollDown(n) => view.scroll_down(n),
        Action::PageUp => view.page_up(),
        Action::PageDown => view.page_down(),
        Action::ScrollToTop => view.scroll_to_top(),
        Action::JumpToLatest => view.jump_to_latest(),

        // Level filter
        Action::CycleLevel => {
            view.set_level_filter(cycle_level(view.level_filter()));
        }
        Action::CycleLevelBack => {
            view.set_level_filter(cycle_level_back(view.level_filter()));
        }

        // Text filter, applied as it is typed
        Action::OpenSearch => {
            state.start_search(view.text_filter());
        }
        Action::CloseSearch => {
            view.set_text_filter(state.cancel_search());
        }
        Action::SearchInput(c) => {
            state.search_input_char(c);
            view.set_text_filter(&state.ui_state.search_input);
        }
        Action::SearchBackspace => {
            state.search_input_backspace();
            view.set_text_filter(&state.ui_state.search_input);
        }
        Action::SearchClear => {
            state.ui_state.search_input.clear();
            view.set_text_filter("");
        }
        Action::ApplyFilter => {
            state.apply_filter();
        }
        Action::ClearFilter => {
            state.clear_filter();
            view.set_text_filter("");
        }

        Action::Reload => {
            state.dismiss_error();
            view.reload();
        }

        // Destructive clear
        Action::RequestClear => {
            state.request_clear();
        }
        Action::ConfirmClear => {
            state.resolve_clear();
            let pending = view.begin_clear();
            let tx = internal_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(InternalAction::ClearDone(pending.await));
            });
        }
        Action::CancelClear => {
            state.resolve_clear();
        }

        Action::ShowError(msg) => {
            state.show_error(msg);
        }
        Action::DismissError => {
            if state.ui_state.help_visible {
                state.ui_state.help_visible = false;
            } else {
                state.dismiss_error();
            }
        }
    }
}

fn render(tui: &mut Tui, state: &AppState, view: &mut LogView) -> Result<()> {
    tui.draw(|frame| {
        LogViewerScreen::render(frame, state, view);

        if state.ui_state.confirm_clear {
            ConfirmDialog::render(
                frame,
                "Clear logs",
                "Delete all logs on the service? This cannot be undone.",
            );
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}

/// tail -f style output until Ctrl-C
async fn run_plain(mut view: LogView) -> Result<()> {
    let mut last_seq: Option<u64> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            alive = view.changed() => {
                if !alive {
                    break;
                }
                if view.refresh() {
                    last_seq = print_new_records(&view, last_seq)?;
                }
            }
        }
    }

    view.close();
    Ok(())
}

/// Print visible records newer than `last_seq`; returns the newest printed
fn print_new_records(view: &LogView, last_seq: Option<u64>) -> Result<Option<u64>> {
    let mut out = std::io::stdout().lock();
    let mut newest = last_seq;

    for record in view.visible_records() {
        if last_seq.is_some_and(|seq| record.seq <= seq) {
            continue;
        }
        writeln!(out, "{}", plain_line(record, true))?;
        newest = Some(record.seq);
    }

    out.flush()?;
    Ok(newest)
}
