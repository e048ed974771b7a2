use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::{App, Focus};
use crate::audio::{MediaDecoder, OutputDevice};
use crate::config;
use crate::error::PlayerError;
use crate::player::{EngineEvent, PlaybackEngine};
use crate::ui;

/// Main terminal event loop: draws, feeds keys to the engine and folds engine
/// events into the status line. Returns `Ok(())` when the user quits.
pub fn run<D, O>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    engine: &mut PlaybackEngine<D, O>,
) -> Result<(), Box<dyn std::error::Error>>
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    loop {
        for event in engine.tick() {
            apply_engine_event(event, app);
        }
        app.follow(engine.current_index());
        app.clamp_cursors(engine.playlist().len(), engine.catalog().len());

        terminal.draw(|f| ui::draw(f, app, engine, &settings.ui, &settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, engine) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn apply_engine_event(event: EngineEvent, app: &mut App) {
    match event {
        EngineEvent::TrackLoaded { index, duration } => {
            debug!(index, ?duration, "track loaded");
        }
        EngineEvent::TrackChanged { index } => debug!(index, "track changed"),
        EngineEvent::Stopped => app.info("end of playlist"),
        EngineEvent::Failed(e) => app.error(e.to_string()),
    }
}

/// Show the outcome of a command; errors are also logged.
fn report<T>(app: &mut App, result: Result<T, PlayerError>, ok: impl FnOnce(T) -> Option<String>) {
    match result {
        Ok(value) => {
            if let Some(msg) = ok(value) {
                app.info(msg);
            }
        }
        Err(e) => {
            warn!(error = %e, "command failed");
            app.error(e.to_string());
        }
    }
}

/// Apply one key press. Returns true when the user asked to quit.
pub(crate) fn handle_key_event<D, O>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    engine: &mut PlaybackEngine<D, O>,
) -> bool
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    if app.take_clear_request() {
        if key.code == KeyCode::Char('y') {
            engine.clear_playlist();
            app.info("playlist cleared");
        } else {
            app.info("clear cancelled");
        }
        return false;
    }

    let controls = &settings.controls;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc => {
            app.metadata_window = false;
            app.clear_status();
        }
        KeyCode::Tab => app.cycle_focus(),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            app.follow_playback_on();
            report(app, engine.play_pause(), |_| None);
        }
        KeyCode::Char('l') => {
            app.follow_playback_on();
            report(app, engine.next(), |_| None);
        }
        KeyCode::Char('h') => {
            app.follow_playback_on();
            report(app, engine.previous(), |_| None);
        }
        KeyCode::Char('L') => {
            report(app, engine.seek_relative(controls.scrub_seconds as f64), |_| None);
        }
        KeyCode::Char('H') => {
            report(app, engine.seek_relative(-(controls.scrub_seconds as f64)), |_| None);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let v = engine.set_volume(engine.volume() + controls.volume_step);
            app.info(format!("volume {:.0}%", v * 100.0));
        }
        KeyCode::Char('-') => {
            let v = engine.set_volume(engine.volume() - controls.volume_step);
            app.info(format!("volume {:.0}%", v * 100.0));
        }
        KeyCode::Char('s') => {
            let on = engine.toggle_shuffle();
            app.info(format!("shuffle {}", if on { "on" } else { "off" }));
        }
        KeyCode::Char('r') => {
            let mode = engine.cycle_repeat_mode();
            app.info(format!("repeat {mode}"));
        }
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            Focus::Equalizer => {
                let result = engine.adjust_eq_band(app.eq_band, -controls.eq_step_db);
                report(app, result, |_| None)
            }
            Focus::Playlist => app.next(engine.playlist().len()),
            Focus::Catalog => app.next(engine.catalog().len()),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            Focus::Equalizer => {
                let result = engine.adjust_eq_band(app.eq_band, controls.eq_step_db);
                report(app, result, |_| None)
            }
            Focus::Playlist => app.prev(engine.playlist().len()),
            Focus::Catalog => app.prev(engine.catalog().len()),
        },
        KeyCode::Left => app.prev_band(),
        KeyCode::Right => app.next_band(),
        KeyCode::Char('0') => {
            engine.reset_eq();
            app.info("equalizer reset");
        }
        KeyCode::Char(c @ '1'..='9') => {
            let fraction = f64::from(c as u8 - b'0') / 10.0;
            report(app, engine.seek_fraction(fraction), |_| None);
        }
        KeyCode::Backspace if app.focus == Focus::Equalizer => {
            let result = engine.set_eq_band(app.eq_band, 0.0);
            report(app, result, |_| None);
        }
        KeyCode::Enter => match app.focus {
            Focus::Playlist if !engine.playlist().is_empty() => {
                app.follow_playback_on();
                let result = engine.play_at(app.playlist_cursor);
                report(app, result, |_| None);
            }
            Focus::Catalog => add_selected(app, engine),
            _ => {}
        },
        KeyCode::Char('a') => add_selected(app, engine),
        KeyCode::Char('d') | KeyCode::Char('x') => {
            if let Some(id) = engine.playlist().get(app.playlist_cursor).map(|t| t.id.clone()) {
                report(app, engine.remove_track(&id), |_| Some(format!("removed '{id}'")));
            }
        }
        KeyCode::Char('f') => {
            if let Some(id) = engine.playlist().get(app.playlist_cursor).map(|t| t.id.clone()) {
                report(app, engine.toggle_favorite(&id), |on| {
                    Some(if on { "added to favorites" } else { "removed from favorites" }.into())
                });
            }
        }
        KeyCode::Char('w') => {
            report(app, engine.save_playlist(), |n| Some(format!("saved {n} tracks")));
        }
        KeyCode::Char('o') => {
            report(app, engine.restore_playlist(), |n| Some(format!("restored {n} tracks")));
        }
        KeyCode::Char('c') => app.request_clear(),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    false
}

fn add_selected<D, O>(app: &mut App, engine: &mut PlaybackEngine<D, O>)
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    let Some(track) = engine.catalog().tracks().get(app.catalog_cursor) else {
        return;
    };
    let (id, title) = (track.id.clone(), track.display());
    report(app, engine.add_track(&id), |_| Some(format!("added '{title}'")));
}
