//! Recognition of playable sources by file extension.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    M4a,
    Aac,
    Flac,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 6] = [
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::Ogg,
        AudioFormat::M4a,
        AudioFormat::Aac,
        AudioFormat::Flac,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "m4a",
            AudioFormat::Aac => "aac",
            AudioFormat::Flac => "flac",
        }
    }

    /// Recognize `locator` by its trailing extension, case-insensitively.
    ///
    /// Only the final path segment is considered, so `"live.v2/track"` has no
    /// extension while `"Best Lies.MP3"` is an mp3.
    pub fn from_locator(locator: &str) -> Option<Self> {
        let (_, ext) = locator.rsplit_once('.')?;
        if ext.contains(['/', '\\']) {
            return None;
        }
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}
