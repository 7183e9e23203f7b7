use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use foodfinder_core::card::UNKNOWN;
use foodfinder_core::ApiError;
use tracing::{info, warn};

use crate::app::{App, FocusPane, InputMode, PromptKind, NO_CARD_SELECTED};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::ExchangeFinished(outcome) => {
            app.orchestrator.finish(outcome, &mut app.chat);
            app.sync_card_selection();
        }
        AppEvent::ExchangeAborted { id, reason } => {
            warn!(exchange = id, %reason, "exchange produced no outcome");
            app.orchestrator.abandon(id, &mut app.chat);
        }
        AppEvent::Located { name, result } => {
            let text = match result {
                Ok(Some(point)) => format!("{}: {:.5}, {:.5}", name, point.lat, point.lng),
                Ok(None) => format!("Không tìm thấy vị trí của {}.", name),
                Err(e) => failure_notice(&e),
            };
            app.notify(&text);
        }
        AppEvent::Routed { destination, result } => {
            let text = match result {
                Ok(plan) => format!(
                    "Đường đến {}: {:.2} km ({} điểm)",
                    destination,
                    plan.length_km(),
                    plan.path.len()
                ),
                Err(e) => failure_notice(&e),
            };
            app.notify(&text);
        }
        AppEvent::Favorited { name, result } => {
            let text = match result {
                Ok(()) => format!("Đã lưu {} vào danh sách yêu thích.", name),
                Err(e) => failure_notice(&e),
            };
            app.notify(&text);
        }
    }
    app.follow_transcript();
    Ok(())
}

/// Notice text for a failed place lookup. Messages the backend or local
/// validation wrote for the user are shown as is.
fn failure_notice(error: &ApiError) -> String {
    match error {
        ApiError::Backend(msg) | ApiError::InvalidInput(msg) | ApiError::Unauthorized(msg) => {
            msg.clone()
        }
        other => format!("Lỗi kết nối máy chủ: {}", other),
    }
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key).await,
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter => {
            app.close_prompt();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('o') => app.open_prompt(PromptKind::ImagePath),
        KeyCode::Char('x') => {
            if app.orchestrator.staging().is_staged() {
                app.orchestrator.staging_mut().clear();
                info!("staged image cleared");
            }
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Chat => FocusPane::Cards,
                FocusPane::Cards => FocusPane::Chat,
            };
        }
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Chat => app.scroll_chat_down(),
            FocusPane::Cards => app.card_nav_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Chat => app.scroll_chat_up(),
            FocusPane::Cards => app.card_nav_up(),
        },
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Char('m') => locate_selected(app),
        KeyCode::Char('r') => {
            if app.selected_card().is_some() {
                app.open_prompt(PromptKind::RouteOrigin);
            } else {
                app.notify(NO_CARD_SELECTED);
            }
        }
        KeyCode::Char('f') => favorite_selected(app),
        _ => {}
    }
}

async fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.close_prompt();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => submit_prompt(app).await,
        KeyCode::Backspace => app.active_input_mut().backspace(),
        KeyCode::Delete => app.active_input_mut().delete(),
        KeyCode::Left => app.active_input_mut().left(),
        KeyCode::Right => app.active_input_mut().right(),
        KeyCode::Home => app.active_input_mut().home(),
        KeyCode::End => app.active_input_mut().end(),
        KeyCode::Char(c) => app.active_input_mut().insert(c),
        _ => {}
    }
}

async fn submit_prompt(app: &mut App) {
    match app.prompt {
        PromptKind::Message => app.send_message(),
        PromptKind::ImagePath => {
            let raw = app.prompt_input.take();
            app.close_prompt();
            app.input_mode = InputMode::Normal;
            stage_from_path(app, raw.trim()).await;
        }
        PromptKind::RouteOrigin => {
            let origin = app.prompt_input.take();
            app.close_prompt();
            app.input_mode = InputMode::Normal;
            route_to_selected(app, origin);
        }
    }
}

async fn stage_from_path(app: &mut App, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let path = expand_home(raw);

    let staged = app
        .orchestrator
        .staging_mut()
        .stage_path(&path)
        .await
        .map(|preview| preview.label.clone());
    match staged {
        Ok(label) => info!(%label, "image staged"),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not stage image");
            app.notify(&e.to_string());
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

fn locate_selected(app: &mut App) {
    let Some(card) = app.selected_card() else {
        app.notify(NO_CARD_SELECTED);
        return;
    };
    let name = card.name.clone();
    let address = card.address.clone();
    let client = app.orchestrator.backend().clone();
    let tx = app.events.clone();

    tokio::spawn(async move {
        let result = client.geocode(&address).await;
        let _ = tx.send(AppEvent::Located { name, result });
    });
}

fn route_to_selected(app: &mut App, origin: String) {
    let Some(card) = app.selected_card() else {
        app.notify(NO_CARD_SELECTED);
        return;
    };
    let destination = card.name.clone();
    let address = if card.address == UNKNOWN {
        card.name.clone()
    } else {
        card.address.clone()
    };
    let client = app.orchestrator.backend().clone();
    let tx = app.events.clone();

    tokio::spawn(async move {
        let result = client.find_path(&origin, &address).await;
        let _ = tx.send(AppEvent::Routed { destination, result });
    });
}

fn favorite_selected(app: &mut App) {
    let Some(card) = app.selected_card() else {
        app.notify(NO_CARD_SELECTED);
        return;
    };
    let name = card.name.clone();
    let place_id = card.favorite_id().to_string();
    let client = app.orchestrator.backend().clone();
    let tx = app.events.clone();

    tokio::spawn(async move {
        let result = client.add_favorite(&place_id, &name).await;
        let _ = tx.send(AppEvent::Favorited { name, result });
    });
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(),
        MouseEventKind::ScrollUp => app.scroll_chat_up(),
        _ => {}
    }
}
