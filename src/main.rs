mod app;
mod events;
mod ui;

use anyhow::Result;
use civic_assistant::api::AssistantClient;
use civic_assistant::config;
use civic_assistant::session::ChatTurn;
use civic_assistant::storage::Storage;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::{AnalysisJob, App, AppMode};
use events::AppEvent;

/// The terminal owns stdout, so logs go to a daily file instead.
fn init_logging() -> Option<WorkerGuard> {
    let logs_dir = config::get_logs_dir().ok()?;
    let appender = tracing_appender::rolling::daily(logs_dir, "civic-assistant.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging();

    let app_config = config::load_config()?;
    let client = AssistantClient::from_config(&app_config)?;
    let storage = match Storage::new() {
        Ok(storage) => Some(storage),
        Err(err) => {
            tracing::warn!(error = %err, "Transcript archive unavailable");
            None
        }
    };

    let probe = client.clone();
    let gateway_url = app_config.gateway_url.clone();
    tokio::spawn(async move {
        if !probe.health_check().await {
            tracing::warn!(url = %gateway_url, "Gateway health check failed");
        }
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&app_config);
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let res = run_app(&mut terminal, &mut app, &client, storage.as_ref(), &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.abort_chat();

    if let Err(err) = res {
        tracing::error!(error = ?err, "Terminal client failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn spawn_chat(client: &AssistantClient, turn: ChatTurn, event_tx: &mpsc::UnboundedSender<AppEvent>) {
    let client = client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let ChatTurn { id, request, cancel } = turn;

        let mut stream = match client.stream_chat(&request, cancel).await {
            Ok(stream) => stream,
            Err(error) => {
                let _ = tx.send(AppEvent::ChatFailed { turn: id, error });
                return;
            }
        };

        while let Some(item) = stream.next().await {
            let event = match item {
                Ok(event) => AppEvent::Stream { turn: id, event },
                Err(error) => AppEvent::ChatFailed { turn: id, error },
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}

fn spawn_analysis(
    client: &AssistantClient,
    job: AnalysisJob,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let client = client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let result = match job.into_request().await {
            Ok(request) => client.analyze_misinformation(&request).await,
            Err(error) => Err(error),
        };
        let event = match result {
            Ok(analysis) => AppEvent::AnalysisReady(analysis),
            Err(error) => AppEvent::AnalysisFailed(error),
        };
        let _ = tx.send(event);
    });
}

const fn handle_help_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    if !app.show_help {
        return false;
    }

    match key {
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Esc => {
            app.show_help = false;
        }
        _ => {}
    }
    true
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    client: &AssistantClient,
    storage: Option<&Storage>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    match key {
        KeyCode::Char('c') if ctrl => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return;
        }
        KeyCode::Esc if app.exit_pending => {
            app.exit_pending = false;
            return;
        }
        // Any other key cancels pending exit and is then handled normally
        _ if app.exit_pending => app.exit_pending = false,
        _ => {}
    }

    match key {
        KeyCode::Char('q') if ctrl => app.quit(),
        KeyCode::Char('h') if ctrl => app.toggle_help(),
        KeyCode::Char('l') if ctrl => app.toggle_language(),
        KeyCode::Char('n') if ctrl => app.new_conversation(),
        KeyCode::Char('s') if ctrl => {
            if let Some(storage) = storage {
                app.archive(storage);
            }
        }
        KeyCode::Esc => {
            if !app.abort_chat() {
                app.notification = None;
            }
        }
        KeyCode::Tab => app.toggle_mode(),
        KeyCode::F(n @ 1..=4) => app.pick_suggestion(usize::from(n - 1)),

        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Enter => match app.mode {
            AppMode::Chat => {
                if let Some(turn) = app.begin_chat() {
                    spawn_chat(client, turn, event_tx);
                }
            }
            AppMode::Verify => {
                if let Some(job) = app.begin_analysis() {
                    spawn_analysis(client, job, event_tx);
                }
            }
        },
        KeyCode::Char(c) if !ctrl => app.input_buffer.push(c),
        _ => {}
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &AssistantClient,
    storage: Option<&Storage>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        app.expire_notification();
        terminal.draw(|f| ui::render(f, app))?;

        while let Ok(app_event) = event_rx.try_recv() {
            app.handle_event(app_event);
        }

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_help_keys(app, key.code, key.modifiers)
                {
                    handle_keyboard_input(app, key.code, key.modifiers, client, storage, event_tx);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
