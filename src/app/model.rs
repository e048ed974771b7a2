//! Application model types: `App`, `Focus` and the status line.
//!
//! `App` holds presentation state only (cursors, focus, popups, the last
//! status message). Playback state lives in the engine.

use crate::audio::BAND_COUNT;

/// Which panel receives navigation keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Playlist,
    Catalog,
    Equalizer,
}

impl Focus {
    /// Playlist → Catalog → Equalizer → Playlist.
    pub fn next(self) -> Self {
        match self {
            Focus::Playlist => Focus::Catalog,
            Focus::Catalog => Focus::Equalizer,
            Focus::Equalizer => Focus::Playlist,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    pub focus: Focus,
    pub playlist_cursor: usize,
    pub catalog_cursor: usize,
    pub eq_band: usize,

    /// Move the playlist cursor along with the current track.
    pub follow_playback: bool,
    /// Waiting for `y` to confirm clearing the playlist.
    pub confirm_clear: bool,
    pub metadata_window: bool,

    pub status: Option<StatusMessage>,
    pub current_dir: Option<String>,
}

/// Step `cursor` through `len` entries, wrapping at both ends.
fn step(cursor: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    let cursor = cursor.min(len - 1);
    if forward {
        (cursor + 1) % len
    } else if cursor == 0 {
        len - 1
    } else {
        cursor - 1
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            follow_playback: true,
            ..Self::default()
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Move the cursor of the focused list down; `len` is that list's length.
    pub fn next(&mut self, len: usize) {
        match self.focus {
            Focus::Playlist => {
                self.follow_playback = false;
                self.playlist_cursor = step(self.playlist_cursor, len, true);
            }
            Focus::Catalog => self.catalog_cursor = step(self.catalog_cursor, len, true),
            Focus::Equalizer => {}
        }
    }

    pub fn prev(&mut self, len: usize) {
        match self.focus {
            Focus::Playlist => {
                self.follow_playback = false;
                self.playlist_cursor = step(self.playlist_cursor, len, false);
            }
            Focus::Catalog => self.catalog_cursor = step(self.catalog_cursor, len, false),
            Focus::Equalizer => {}
        }
    }

    pub fn next_band(&mut self) {
        self.eq_band = step(self.eq_band, BAND_COUNT, true);
    }

    pub fn prev_band(&mut self) {
        self.eq_band = step(self.eq_band, BAND_COUNT, false);
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    /// Put the playlist cursor on `current` when following playback.
    pub fn follow(&mut self, current: Option<usize>) {
        if let (true, Some(index)) = (self.follow_playback, current) {
            self.playlist_cursor = index;
        }
    }

    /// Keep both cursors inside their lists after the lists changed.
    pub fn clamp_cursors(&mut self, playlist_len: usize, catalog_len: usize) {
        self.playlist_cursor = self.playlist_cursor.min(playlist_len.saturating_sub(1));
        self.catalog_cursor = self.catalog_cursor.min(catalog_len.saturating_sub(1));
    }

    pub fn request_clear(&mut self) {
        self.confirm_clear = true;
        self.info("clear the playlist? press y to confirm");
    }

    /// Consume a pending clear request; true when it was pending.
    pub fn take_clear_request(&mut self) -> bool {
        std::mem::take(&mut self.confirm_clear)
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Info,
            text: text.into(),
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Error,
            text: text.into(),
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}
