//! Remote metadata returned by a file lookup
//!
//! These records are keyed by AniDB ids and merged into persistence by the
//! search stage.

use crate::error::ValidationError;
use crate::hashing::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Video frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::invalid_parameter("resolution", "expected WIDTHxHEIGHT");
        let (width, height) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = width.parse().map_err(|_| invalid())?;
        let height = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeMetadata {
    pub aid: u32,
    pub romaji_name: Option<String>,
    pub kanji_name: Option<String>,
    pub english_name: Option<String>,
    pub year: Option<String>,
    pub kind: Option<String>,
    pub episode_count: Option<u32>,
}

impl AnimeMetadata {
    /// Best title for display and path building
    pub fn preferred_title(&self) -> Option<&str> {
        self.romaji_name
            .as_deref()
            .or(self.english_name.as_deref())
            .or(self.kanji_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub eid: u32,
    pub aid: u32,
    pub number: Option<String>,
    pub english_name: Option<String>,
    pub romaji_name: Option<String>,
    pub kanji_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub fid: u32,
    pub aid: Option<u32>,
    pub eid: Option<u32>,
    pub gid: Option<u32>,
    pub state: Option<u16>,
    pub size: Option<u64>,
    pub ed2k: Option<ContentHash>,
    pub crc32: Option<String>,
    pub quality: Option<String>,
    pub source: Option<String>,
    pub audio_codecs: Vec<String>,
    pub video_codec: Option<String>,
    pub video_resolution: Option<Resolution>,
    pub file_type: Option<String>,
    pub dub_languages: Vec<String>,
    pub sub_languages: Vec<String>,
    pub length_seconds: Option<u32>,
    pub anidb_filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub gid: u32,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

/// Everything one `FILE` reply told us
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLookup {
    pub file: FileMetadata,
    pub anime: Option<AnimeMetadata>,
    pub episode: Option<EpisodeMetadata>,
    pub group: Option<GroupMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse_and_display() {
        let resolution: Resolution = "1920x1080".parse().unwrap();
        assert_eq!(resolution, Resolution::new(1920, 1080));
        assert_eq!(resolution.to_string(), "1920x1080");
    }

    #[test]
    fn test_resolution_rejects_garbage() {
        assert!("".parse::<Resolution>().is_err());
        assert!("1920".parse::<Resolution>().is_err());
        assert!("0x0".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_preferred_title_order() {
        let mut anime = AnimeMetadata {
            aid: 1,
            kanji_name: Some("カウボーイビバップ".into()),
            ..Default::default()
        };
        assert_eq!(anime.preferred_title(), Some("カウボーイビバップ"));

        anime.english_name = Some("Cowboy Bebop".into());
        assert_eq!(anime.preferred_title(), Some("Cowboy Bebop"));

        anime.romaji_name = Some("Cowboy Bebop (romaji)".into());
        assert_eq!(anime.preferred_title(), Some("Cowboy Bebop (romaji)"));
    }
}
