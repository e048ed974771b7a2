use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::app::App;
use crate::audio::{MediaDecoder, OutputDevice};
use crate::config::{LibrarySettings, Settings};
use crate::error::PlayerError;
use crate::library::{Catalog, scan};
use crate::player::PlaybackEngine;
use crate::playlist::{FileStore, KeyValueStore, MemoryStore};

/// The configured catalog file, or a scan of `dir` when there is none or it is unreadable.
pub fn load_catalog(dir: &Path, library: &LibrarySettings) -> Catalog {
    if let Some(path) = &library.catalog_file {
        match Catalog::from_json_file(path) {
            Ok(catalog) => return catalog,
            Err(e) => warn!(error = %e, "catalog file unusable, scanning the music directory"),
        }
    }
    Catalog::from_tracks(scan(dir, library))
}

/// Saved playlists go to the data directory; without one they last for the session.
pub fn open_store(settings: &Settings) -> Box<dyn KeyValueStore> {
    let dir = settings.data_dir();
    match fs::create_dir_all(&dir) {
        Ok(()) => {
            debug!(dir = %dir.display(), "playlist storage ready");
            Box::new(FileStore::new(dir))
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "data directory unavailable, playlists will not persist");
            Box::new(MemoryStore::default())
        }
    }
}

/// Apply the start-of-session defaults that the engine does not handle itself.
pub fn apply_startup_defaults<D, O>(
    engine: &mut PlaybackEngine<D, O>,
    app: &mut App,
    settings: &Settings,
) where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    app.follow_playback = settings.ui.follow_playback;

    if settings.playback.restore_on_start {
        match engine.restore_playlist() {
            Ok(n) => info!(tracks = n, "restored saved playlist"),
            Err(PlayerError::NoSavedPlaylist) => debug!("no saved playlist to restore"),
            Err(e) => {
                warn!(error = %e, "failed to restore saved playlist");
                app.error(e.to_string());
            }
        }
    }
    app.follow(engine.current_index());
}
