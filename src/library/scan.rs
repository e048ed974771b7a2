use std::path::Path;

use lofty::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::audio::AudioFormat;
use crate::config::LibrarySettings;

use super::model::{PLACEHOLDER_DURATION, Track, TrackId, format_duration};

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Path of `path` relative to `root`, with `/` separators on every platform.
fn relative_locator(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Walk `dir` and build a catalog entry for every recognized audio file.
///
/// Ids and locators are the file's path relative to `dir`, so they stay
/// stable between sessions and saved playlists keep resolving.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || (!settings.include_hidden && is_hidden(path)) {
            continue;
        }
        let locator = relative_locator(dir, path);
        if AudioFormat::from_locator(&locator).is_none() {
            continue;
        }

        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist = settings.unknown_artist.clone();
        let mut album = settings.unknown_album.clone();
        let mut duration = PLACEHOLDER_DURATION.to_string();

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                duration = format_duration(tagged.properties().duration());

                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(v) = tag.title().filter(|v| !v.trim().is_empty()) {
                        title = v.trim().to_string();
                    }
                    if let Some(v) = tag.artist().filter(|v| !v.trim().is_empty()) {
                        artist = v.trim().to_string();
                    }
                    if let Some(v) = tag.album().filter(|v| !v.trim().is_empty()) {
                        album = v.trim().to_string();
                    }
                }
            }
            Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
        }

        tracks.push(Track {
            id: TrackId::new(locator.clone()),
            title,
            artist,
            album,
            duration,
            source: locator,
            album_art: settings.default_album_art.clone(),
        });
    }

    tracks.sort_by(|a, b| a.display().to_lowercase().cmp(&b.display().to_lowercase()));
    info!(dir = %dir.display(), count = tracks.len(), "scanned music directory");
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn relative_locator_uses_forward_slashes() {
        let root = Path::new("/music");
        assert_eq!(
            relative_locator(root, &root.join("album").join("song.mp3")),
            "album/song.mp3"
        );
    }

    #[test]
    fn scan_filters_non_audio_and_sorts_by_display_case_insensitive() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
        fs::write(dir.path().join("c.m4a"), b"not a real m4a").unwrap();
        fs::write(dir.path().join("d.txt"), b"ignore me").unwrap();

        let settings = LibrarySettings {
            unknown_artist: String::new(),
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);
        let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "b", "c"]);
        assert_eq!(tracks[0].id.as_str(), "A.ogg");
        assert_eq!(tracks[0].source, "A.ogg");
        assert_eq!(tracks[0].duration, PLACEHOLDER_DURATION);
    }

    #[test]
    fn scan_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "visible");
    }

    #[test]
    fn scan_respects_recursive_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("child.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            recursive: false,
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "root");
    }

    #[test]
    fn scan_ids_include_subdirectories() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("live");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("encore.flac"), b"not real").unwrap();

        let tracks = scan(dir.path(), &LibrarySettings::default());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id.as_str(), "live/encore.flac");
    }
}
