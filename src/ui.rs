//! UI rendering helpers for the terminal user interface.
//!
//! Everything here reads state; nothing mutates the engine.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Focus, StatusKind};
use crate::audio::{BAND_COUNT, MediaDecoder, OutputDevice};
use crate::config::{ControlsSettings, UiSettings};
use crate::equalizer::band_label;
use crate::library::{Track, format_duration};
use crate::player::{PlaybackEngine, PlayerState};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("tab", "switch panel");
    map.insert("enter", "play / add");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next song");
    map.insert("+/-", "volume");
    map.insert("←/→", "eq band");
    map.insert("1-9", "seek 10-90%");
    map.insert("0", "flat eq");
    map.insert("bksp", "flat band");
    map.insert("a", "add");
    map.insert("d", "remove");
    map.insert("f", "favorite");
    map.insert("w/o", "save/restore");
    map.insert("c", "clear");
    map.insert("s", "shuffle");
    map.insert("r", "repeat");
    map.insert("K", "metadata");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "tab", "enter", "space/p", "h/l", "H/L", "+/-", "1-9", "←/→", "bksp", "0", "a",
        "d", "f", "w/o", "c", "s", "r", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// `elapsed / total`, or just the elapsed time while the length is unknown.
fn progress_label(position: Duration, duration: Option<Duration>) -> String {
    match duration {
        Some(total) => format!("{} / {}", format_duration(position), format_duration(total)),
        None => format_duration(position),
    }
}

fn progress_ratio(position: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(total) if !total.is_zero() => {
            (position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn dash_if_blank(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

fn metadata_text(track: Option<&Track>) -> String {
    match track {
        Some(track) => format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nSource: {}\nArt: {}",
            track.title,
            dash_if_blank(&track.artist),
            dash_if_blank(&track.album),
            track.duration,
            track.source,
            dash_if_blank(&track.album_art),
        ),
        None => "No track selected".to_string(),
    }
}

fn left_padded() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

/// Render the entire UI into the provided `frame`.
pub fn draw<D, O>(
    frame: &mut Frame,
    app: &App,
    engine: &PlaybackEngine<D, O>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_status(frame, chunks[1], app, engine);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" progress "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio(engine.position(), engine.duration()))
        .label(progress_label(engine.position(), engine.duration()));
    frame.render_widget(gauge, chunks[2]);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[3]);
    draw_playlist(frame, lists[0], app, engine);
    draw_catalog(frame, lists[1], app, engine);

    draw_equalizer(frame, chunks[4], app, engine);

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_padded()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);

    if app.metadata_window {
        let area = centered_rect_sized(72, 10, chunks[3]);
        frame.render_widget(Clear, area);
        let track = match app.focus {
            Focus::Catalog => engine.catalog().tracks().get(app.catalog_cursor),
            _ => engine.playlist().get(app.playlist_cursor),
        };
        let popup = Paragraph::new(metadata_text(track))
            .block(
                Block::default()
                    .padding(left_padded())
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(popup, area);
    }

    if app.confirm_clear {
        let area = centered_rect_sized(40, 5, chunks[3]);
        frame.render_widget(Clear, area);
        let popup = Paragraph::new("Clear the whole playlist? [y/N]")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" confirm "))
            .wrap(Wrap { trim: true });
        frame.render_widget(popup, area);
    }
}

fn draw_status<D, O>(frame: &mut Frame, area: Rect, app: &App, engine: &PlaybackEngine<D, O>)
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    let mut parts: Vec<String> = Vec::new();
    let state = match engine.state() {
        PlayerState::Empty => "Empty",
        PlayerState::Paused if engine.is_loading() => "Loading",
        PlayerState::Paused => "Paused",
        PlayerState::Playing => "Playing",
    };
    parts.push(state.to_string());
    if let Some(track) = engine.current_track() {
        parts.push(format!("Song: {}", track.display()));
    }
    parts.push(format!(
        "Shuffle: {}",
        if engine.shuffle() { "ON" } else { "OFF" }
    ));
    parts.push(format!("Repeat: {}", engine.repeat_mode()));
    parts.push(format!("Vol: {:.0}%", engine.volume() * 100.0));
    parts.push(format!(
        "Cursor: {}",
        if app.follow_playback { "follow" } else { "free" }
    ));
    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    let mut lines = vec![Line::from(parts.join(" • "))];
    if let Some(status) = &app.status {
        let style = match status.kind {
            StatusKind::Info => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        };
        lines.push(Line::from(Span::styled(status.text.clone(), style)));
    }

    let status = Paragraph::new(lines)
        .block(Block::bordered().padding(left_padded()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}

fn draw_playlist<D, O>(frame: &mut Frame, area: Rect, app: &App, engine: &PlaybackEngine<D, O>)
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    let playlist = engine.playlist();
    let current = engine.current_index();
    let items: Vec<ListItem> = playlist
        .tracks()
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if current == Some(i) { "▶ " } else { "  " };
            let heart = if playlist.is_favorite(&track.id) { " ♥" } else { "" };
            let line = format!("{}{} [{}]{}", marker, track.display(), track.duration, heart);
            if current == Some(i) {
                ListItem::new(line).bold()
            } else {
                ListItem::new(line)
            }
        })
        .collect();

    let title = format!(" playlist ({}) ", playlist.len());
    let list = List::new(items)
        .block(panel(&title, app.focus == Focus::Playlist))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !playlist.is_empty() {
        state.select(Some(app.playlist_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_catalog<D, O>(frame: &mut Frame, area: Rect, app: &App, engine: &PlaybackEngine<D, O>)
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    let catalog = engine.catalog();
    let items: Vec<ListItem> = catalog
        .tracks()
        .iter()
        .map(|track| {
            let line = track.display();
            if engine.playlist().contains(&track.id) {
                ListItem::new(line).dim()
            } else {
                ListItem::new(line)
            }
        })
        .collect();

    let list = List::new(items)
        .block(panel(" catalog ", app.focus == Focus::Catalog))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !catalog.is_empty() {
        state.select(Some(app.catalog_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_equalizer<D, O>(frame: &mut Frame, area: Rect, app: &App, engine: &PlaybackEngine<D, O>)
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    let focused = app.focus == Focus::Equalizer;
    let title = format!(" equalizer (±{} dB) ", engine.max_gain_db());
    let block = panel(&title, focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, BAND_COUNT as u32); BAND_COUNT])
        .split(inner);

    for (i, band) in engine.equalizer().bands.iter().enumerate() {
        let text = format!("{}\n{:+.0}", band_label(band.frequency_hz), band.gain_db);
        let mut cell = Paragraph::new(text).alignment(Alignment::Center);
        if focused && i == app.eq_band {
            cell = cell.reversed();
        }
        frame.render_widget(cell, columns[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_text_includes_scrub_seconds() {
        let text = controls_text(7);
        assert!(text.contains("[H/L] scrub -/+7s"));
        assert!(text.starts_with("[j/k] up/down"));
        assert!(text.ends_with("[q] quit"));
    }

    #[test]
    fn progress_without_duration_shows_elapsed_only() {
        let pos = Duration::from_secs(65);
        assert_eq!(progress_label(pos, None), "1:05");
        assert_eq!(progress_ratio(pos, None), 0.0);
        assert_eq!(
            progress_label(pos, Some(Duration::from_secs(130))),
            "1:05 / 2:10"
        );
        assert!((progress_ratio(pos, Some(Duration::from_secs(130))) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        let r = centered_rect_sized(72, 9, area);
        assert_eq!(r.width, 38);
        assert_eq!(r.height, 8);
        assert_eq!((r.x, r.y), (1, 1));
    }

    #[test]
    fn metadata_uses_dashes_for_blank_fields() {
        let track = Track {
            id: crate::library::TrackId::new("1"),
            title: "Song".into(),
            artist: " ".into(),
            album: String::new(),
            duration: "3:00".into(),
            source: "song.mp3".into(),
            album_art: String::new(),
        };
        let text = metadata_text(Some(&track));
        assert!(text.contains("Artist: -\n"));
        assert!(text.contains("Album: -\n"));
        assert!(text.ends_with("Art: -"));
        assert_eq!(metadata_text(None), "No track selected");
    }
}
