mod app;
mod backend;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod logging;
mod tree;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::sync::mpsc;

use crate::app::{App, TreeCallbacks};
use crate::backend::http::HttpBackend;
use crate::backend::writer::OrderWriter;
use crate::backend::TreeBackend;
use crate::config::{AppConfig, GeneralConfig, LoggingConfig, TreeConfig};
use crate::event::{Event, EventHandler};
use crate::tui::{install_panic_hook, Tui};

/// Browse and reorder a knowledge-base document tree.
#[derive(Parser, Debug)]
#[command(name = "kbt", version, about)]
struct Cli {
    /// Backend base URL (default http://127.0.0.1:8080)
    #[arg(long, value_name = "URL")]
    backend: Option<String>,

    /// Config file to load on top of the discovered ones
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Row count above which only the visible window is rendered
    #[arg(long, value_name = "N")]
    threshold: Option<usize>,

    /// Log level or filter directive, e.g. "debug" or "kbtree=trace"
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Flags as a partial config; unset flags leave file values alone.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                backend_url: self.backend.clone(),
                mouse: self.no_mouse.then_some(false),
                ..Default::default()
            },
            tree: TreeConfig {
                enable_threshold: self.threshold,
                ..Default::default()
            },
            logging: LoggingConfig {
                level: self.log_level.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Fetch the tree in the background and report back as an event.
fn spawn_fetch(
    backend: Arc<dyn TreeBackend>,
    tx: mpsc::UnboundedSender<Event>,
    generation: u64,
) {
    tokio::spawn(async move {
        let result = backend.fetch_tree().await.map_err(|e| e.to_string());
        let _ = tx.send(Event::TreeLoaded { generation, result });
    });
}

/// Wire the tree's callbacks to the event loop and the order writer.
fn build_callbacks(tx: &mpsc::UnboundedSender<Event>, writer: OrderWriter) -> TreeCallbacks {
    let open_tx = tx.clone();
    let action_tx = tx.clone();
    TreeCallbacks {
        on_open_file: Box::new(move |path| {
            let _ = open_tx.send(Event::OpenFile(path.to_string()));
        }),
        on_toggle_directory: Box::new(|path, expanded| {
            tracing::debug!(path, expanded, "directory toggled");
        }),
        on_reorder: Box::new(move |request| {
            writer.submit(request.clone());
        }),
        on_context_action: Box::new(move |row, action| {
            let _ = action_tx.send(Event::ContextAction {
                path: row.path.clone(),
                action,
            });
        }),
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let log_path = logging::init_logging(config.log_level(), config.log_file())?;
    tracing::info!(
        backend = config.backend_url(),
        log = %log_path.display(),
        "starting kbt"
    );

    let backend: Arc<dyn TreeBackend> =
        Arc::new(HttpBackend::new(config.backend_url(), config.request_timeout())?);

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();

    let saved_tx = event_tx.clone();
    let writer = OrderWriter::spawn(backend.clone(), move |outcome| {
        let _ = saved_tx.send(Event::OrderSaved(outcome));
    });

    let mut app = App::new(&config, build_callbacks(&event_tx, writer));
    app.request_refresh();

    loop {
        if let Some(generation) = app.take_refresh_request() {
            spawn_fetch(backend.clone(), event_tx.clone(), generation);
        }

        tui.draw(&mut app)?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.tick(Instant::now()),
            Event::Resize(_, _) => {}
            Event::TreeLoaded { generation, result } => {
                app.handle_fetch_result(generation, result)
            }
            Event::OrderSaved(outcome) => app.handle_persist_outcome(outcome),
            Event::OpenFile(path) => app.set_status(format!("Opened {}", path)),
            Event::ContextAction { path, action } => {
                tracing::info!(path = %path, action = action.label(), "context action requested");
                app.set_status(format!("{}: {} is handled by the editor", path, action.label()));
            }
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
