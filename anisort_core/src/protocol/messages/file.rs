//! FILE reply parsing

use crate::error::ProtocolError;
use crate::metadata::{AnimeMetadata, EpisodeMetadata, FileLookup, FileMetadata, GroupMetadata};
use crate::protocol::codec::LIST_SEPARATOR;
use crate::protocol::masks::{AnimeField, AnimeMask, FileField, FileMask};
use crate::protocol::messages::Response;
use std::str::FromStr;

pub const FILE_FOUND: u16 = 220;
pub const MULTIPLE_FILES_FOUND: u16 = 322;
pub const NO_SUCH_FILE: u16 = 320;

/// Result of a file lookup. Not finding the file is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSearchResult {
    Found(Box<FileLookup>),
    NotFound,
}

impl FileSearchResult {
    pub fn file_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_lookup(self) -> Option<FileLookup> {
        match self {
            Self::Found(lookup) => Some(*lookup),
            Self::NotFound => None,
        }
    }
}

/// Map the single body line of a `220 FILE` reply onto the selected fields
pub fn parse_lookup(
    response: &Response,
    file_mask: FileMask,
    anime_mask: AnimeMask,
) -> Result<FileLookup, ProtocolError> {
    let fields = response
        .fields(0)
        .ok_or_else(|| ProtocolError::malformed("FILE reply has no body"))?;

    let expected = 1 + file_mask.fields().count() + anime_mask.fields().count();
    if fields.len() < expected {
        return Err(ProtocolError::malformed(format!(
            "FILE reply has {} fields, masks select {expected}",
            fields.len()
        )));
    }

    let mut values = fields.into_iter();
    let mut next = || values.next().unwrap_or_default();

    let fid = number::<u32>(&next(), "fid")?
        .ok_or_else(|| ProtocolError::malformed("FILE reply without a file id"))?;
    let mut file = FileMetadata {
        fid,
        ..Default::default()
    };
    for field in file_mask.fields() {
        apply_file_field(&mut file, field, next())?;
    }

    let mut anime = AnimeMetadata::default();
    let mut episode = EpisodeMetadata::default();
    let mut group = GroupMetadata::default();
    for field in anime_mask.fields() {
        apply_anime_field(&mut anime, &mut episode, &mut group, field, next())?;
    }

    let anime = file.aid.map(|aid| AnimeMetadata { aid, ..anime });
    let episode = match (file.eid, file.aid) {
        (Some(eid), Some(aid)) => Some(EpisodeMetadata { eid, aid, ..episode }),
        _ => None,
    };
    let group = file.gid.map(|gid| GroupMetadata { gid, ..group });

    Ok(FileLookup {
        file,
        anime,
        episode,
        group,
    })
}

fn apply_file_field(
    file: &mut FileMetadata,
    field: FileField,
    value: String,
) -> Result<(), ProtocolError> {
    match field {
        FileField::AnimeId => file.aid = id(&value, "aid")?,
        FileField::EpisodeId => file.eid = id(&value, "eid")?,
        FileField::GroupId => file.gid = id(&value, "gid")?,
        FileField::State => file.state = number(&value, "state")?,
        FileField::Size => file.size = number(&value, "size")?,
        FileField::Ed2k => file.ed2k = value.parse().ok(),
        FileField::Crc32 => file.crc32 = text(value),
        FileField::Quality => file.quality = text(value),
        FileField::Source => file.source = text(value),
        FileField::AudioCodecs => file.audio_codecs = list(&value),
        FileField::VideoCodec => file.video_codec = text(value),
        FileField::VideoResolution => file.video_resolution = value.parse().ok(),
        FileField::FileType => file.file_type = text(value),
        FileField::DubLanguage => file.dub_languages = list(&value),
        FileField::SubLanguage => file.sub_languages = list(&value),
        FileField::LengthSeconds => file.length_seconds = number(&value, "length")?,
        FileField::AnidbFileName => file.anidb_filename = text(value),
        _ => {}
    }
    Ok(())
}

fn apply_anime_field(
    anime: &mut AnimeMetadata,
    episode: &mut EpisodeMetadata,
    group: &mut GroupMetadata,
    field: AnimeField,
    value: String,
) -> Result<(), ProtocolError> {
    match field {
        AnimeField::TotalEpisodes => anime.episode_count = number(&value, "episodes")?,
        AnimeField::Year => anime.year = text(value),
        AnimeField::Kind => anime.kind = text(value),
        AnimeField::RomajiName => anime.romaji_name = text(value),
        AnimeField::KanjiName => anime.kanji_name = text(value),
        AnimeField::EnglishName => anime.english_name = text(value),
        AnimeField::EpisodeNumber => episode.number = text(value),
        AnimeField::EpisodeName => episode.english_name = text(value),
        AnimeField::EpisodeRomajiName => episode.romaji_name = text(value),
        AnimeField::EpisodeKanjiName => episode.kanji_name = text(value),
        AnimeField::GroupName => group.name = text(value),
        AnimeField::GroupShortName => group.short_name = text(value),
        _ => {}
    }
    Ok(())
}

fn text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn number<T: FromStr>(value: &str, name: &str) -> Result<Option<T>, ProtocolError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ProtocolError::malformed(format!("{name} is not a number: {value:?}")))
}

/// AniDB uses 0 for "no such record"
fn id(value: &str, name: &str) -> Result<Option<u32>, ProtocolError> {
    Ok(number::<u32>(value, name)?.filter(|id| *id != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Resolution;

    fn masks() -> (FileMask, AnimeMask) {
        let file_mask = FileMask::REQUIRED
            .with(FileField::Size)
            .with(FileField::AudioCodecs)
            .with(FileField::VideoResolution)
            .with(FileField::FileType);
        let anime_mask = AnimeMask::empty()
            .with(AnimeField::RomajiName)
            .with(AnimeField::EpisodeNumber)
            .with(AnimeField::EpisodeName)
            .with(AnimeField::GroupShortName);
        (file_mask, anime_mask)
    }

    #[test]
    fn test_parse_lookup_maps_fields_in_mask_order() {
        let (file_mask, anime_mask) = masks();
        let response = Response::new(
            FILE_FOUND,
            "FILE",
            vec![
                "312498|4896|69260|4243|233674044|aac'opus|1280x720|mkv|Cowboy Bebop|01|Asteroid Blues|Coalgirls"
                    .to_string(),
            ],
        );

        let lookup = parse_lookup(&response, file_mask, anime_mask).unwrap();

        assert_eq!(lookup.file.fid, 312498);
        assert_eq!(lookup.file.aid, Some(4896));
        assert_eq!(lookup.file.size, Some(233674044));
        assert_eq!(lookup.file.audio_codecs, vec!["aac", "opus"]);
        assert_eq!(lookup.file.video_resolution, Some(Resolution::new(1280, 720)));
        assert_eq!(lookup.file.file_type.as_deref(), Some("mkv"));

        let anime = lookup.anime.unwrap();
        assert_eq!(anime.aid, 4896);
        assert_eq!(anime.romaji_name.as_deref(), Some("Cowboy Bebop"));

        let episode = lookup.episode.unwrap();
        assert_eq!(episode.eid, 69260);
        assert_eq!(episode.number.as_deref(), Some("01"));
        assert_eq!(episode.english_name.as_deref(), Some("Asteroid Blues"));

        let group = lookup.group.unwrap();
        assert_eq!(group.gid, 4243);
        assert_eq!(group.short_name.as_deref(), Some("Coalgirls"));
    }

    #[test]
    fn test_zero_group_means_no_group() {
        let (file_mask, anime_mask) = masks();
        let response = Response::new(
            FILE_FOUND,
            "FILE",
            vec!["1|2|3|0|10||||Title|1||".to_string()],
        );

        let lookup = parse_lookup(&response, file_mask, anime_mask).unwrap();
        assert!(lookup.group.is_none());
        assert!(lookup.file.video_resolution.is_none());
        assert!(lookup.file.audio_codecs.is_empty());
    }

    #[test]
    fn test_too_few_fields_is_malformed() {
        let (file_mask, anime_mask) = masks();
        let response = Response::new(FILE_FOUND, "FILE", vec!["1|2|3".to_string()]);
        assert!(matches!(
            parse_lookup(&response, file_mask, anime_mask),
            Err(ProtocolError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_missing_body_is_malformed() {
        let response = Response::new(FILE_FOUND, "FILE", vec![]);
        assert!(parse_lookup(&response, FileMask::empty(), AnimeMask::empty()).is_err());
    }

    #[test]
    fn test_non_numeric_id_is_malformed() {
        let response = Response::new(FILE_FOUND, "FILE", vec!["1|abc".to_string()]);
        let file_mask = FileMask::empty().with(FileField::AnimeId);
        assert!(parse_lookup(&response, file_mask, AnimeMask::empty()).is_err());
    }

    #[test]
    fn test_file_found_flag() {
        assert!(!FileSearchResult::NotFound.file_found());
        assert!(FileSearchResult::Found(Box::default()).file_found());
    }
}
