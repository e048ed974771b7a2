use super::*;
use std::fs;
use std::time::Duration;

fn t(id: &str, title: &str) -> Track {
    Track {
        id: TrackId::new(id),
        title: title.into(),
        artist: "Yuhger6a6y".into(),
        album: "Local Tracks".into(),
        duration: "0:00".into(),
        source: format!("{id}.mp3"),
        album_art: String::new(),
    }
}

#[test]
fn format_duration_pads_seconds() {
    assert_eq!(format_duration(Duration::from_secs(218)), "3:38");
    assert_eq!(format_duration(Duration::from_secs(65)), "1:05");
    assert_eq!(format_duration(Duration::from_millis(59_999)), "0:59");
    assert_eq!(format_duration(Duration::ZERO), "0:00");
}

#[test]
fn display_prefers_artist_dash_title() {
    let mut track = t("1", "Best Lies");
    assert_eq!(track.display(), "Yuhger6a6y - Best Lies");
    track.artist = "   ".into();
    assert_eq!(track.display(), "Best Lies");
}

#[test]
fn track_ids_accept_numbers_and_src_alias() {
    let json = r#"[{
        "id": 1,
        "title": "Best Lies",
        "artist": "Yuhger6a6y",
        "album": "Local Tracks",
        "duration": "3:38",
        "src": "./Best Lies.mp3",
        "albumArt": "../images/best lifes.jpeg"
    }]"#;
    let tracks: Vec<Track> = serde_json::from_str(json).unwrap();
    assert_eq!(tracks[0].id, TrackId::new("1"));
    assert_eq!(tracks[0].source, "./Best Lies.mp3");
    assert_eq!(tracks[0].album_art, "../images/best lifes.jpeg");
}

#[test]
fn track_serializes_with_camel_case_fields() {
    let value = serde_json::to_value(t("7", "Song")).unwrap();
    let obj = value.as_object().unwrap();
    for key in ["id", "title", "artist", "album", "duration", "source", "albumArt"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
    assert_eq!(obj["id"], "7");
}

#[test]
fn catalog_drops_repeated_ids() {
    let catalog = Catalog::from_tracks(vec![t("a", "First"), t("b", "B"), t("a", "Second")]);
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get(&TrackId::new("a")).unwrap().title, "First");
    assert_eq!(catalog.head(1).len(), 1);
    assert_eq!(catalog.head(10).len(), 2);
}

#[test]
fn catalog_reads_json_file_and_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("catalog.json");
    fs::write(&good, serde_json::to_string(&vec![t("a", "A"), t("b", "B")]).unwrap()).unwrap();
    let catalog = Catalog::from_json_file(&good).unwrap();
    assert_eq!(catalog.tracks()[1].title, "B");

    let bad = dir.path().join("broken.json");
    fs::write(&bad, "{ not json").unwrap();
    assert!(matches!(
        Catalog::from_json_file(&bad),
        Err(CatalogError::Parse { .. })
    ));
    assert!(matches!(
        Catalog::from_json_file(&dir.path().join("missing.json")),
        Err(CatalogError::Read { .. })
    ));
}
