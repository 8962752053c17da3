use std::path::Path;

/// Artist and title guessed from a file name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub artist: Option<String>,
    pub title: Option<String>,
}

impl ParsedName {
    /// Search keywords in "artist title" order, skipping missing parts.
    pub fn keywords(&self) -> Vec<String> {
        self.artist
            .iter()
            .chain(self.title.iter())
            .cloned()
            .collect()
    }
}

/// Parse a file name into artist and title.
///
/// Supported patterns:
/// - "Artist - Title.mp3"
/// - "01. Title.mp3"
/// - "01 Artist - Title.mp3"
/// - "Title.mp3" (fallback)
pub fn parse_filename(path: &Path) -> ParsedName {
    let stem = match path.file_stem().and_then(|s| s.to_str()) {
        Some(s) => s.trim(),
        None => return ParsedName::default(),
    };
    if stem.is_empty() {
        return ParsedName::default();
    }

    // "01 Artist - Title" or "01. Artist - Title"
    if let Some(parsed) = strip_track_number(stem).and_then(try_artist_title) {
        return parsed;
    }

    if let Some(parsed) = try_artist_title(stem) {
        return parsed;
    }

    // "01. Title" or "01 Title"
    if let Some(rest) = strip_track_number(stem) {
        return ParsedName {
            artist: None,
            title: Some(rest.trim().to_string()),
        };
    }

    ParsedName {
        artist: None,
        title: Some(stem.to_string()),
    }
}

/// Keywords for a metadata search, derived from the file name.
pub fn keywords_from_path(path: &Path) -> Vec<String> {
    parse_filename(path).keywords()
}

fn try_artist_title(stem: &str) -> Option<ParsedName> {
    let (artist, title) = stem.split_once(" - ")?;
    let artist = artist.trim();
    let title = title.trim();

    if artist.is_empty() || title.is_empty() {
        return None;
    }

    Some(ParsedName {
        artist: Some(artist.to_string()),
        title: Some(title.to_string()),
    })
}

fn strip_track_number(stem: &str) -> Option<&str> {
    let digits = stem.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    // Skip optional "." and/or spaces
    let rest = &stem[digits..];
    let rest = rest.strip_prefix('.').unwrap_or(rest).trim_start();

    if rest.is_empty() {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_artist_title() {
        let parsed = parse_filename(&PathBuf::from("周杰伦 - 晴天.mp3"));
        assert_eq!(parsed.artist.as_deref(), Some("周杰伦"));
        assert_eq!(parsed.title.as_deref(), Some("晴天"));
    }

    #[test]
    fn test_numbered_title() {
        let parsed = parse_filename(&PathBuf::from("01. 晴天.flac"));
        assert_eq!(parsed.title.as_deref(), Some("晴天"));
        assert!(parsed.artist.is_none());
    }

    #[test]
    fn test_numbered_artist_title() {
        let parsed = parse_filename(&PathBuf::from("01 IU - Blueming.mp3"));
        assert_eq!(parsed.artist.as_deref(), Some("IU"));
        assert_eq!(parsed.title.as_deref(), Some("Blueming"));
    }

    #[test]
    fn test_fallback() {
        let parsed = parse_filename(&PathBuf::from("SomeSong.ogg"));
        assert_eq!(parsed.title.as_deref(), Some("SomeSong"));
        assert!(parsed.artist.is_none());
    }

    #[test]
    fn test_digits_only_is_title() {
        let parsed = parse_filename(&PathBuf::from("1989.mp3"));
        assert_eq!(parsed.title.as_deref(), Some("1989"));
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            keywords_from_path(&PathBuf::from("music/周杰伦 - 晴天.mp3")),
            vec!["周杰伦", "晴天"]
        );
        assert_eq!(keywords_from_path(&PathBuf::from("晴天.mp3")), vec!["晴天"]);
        assert!(keywords_from_path(&PathBuf::from("")).is_empty());
    }
}
