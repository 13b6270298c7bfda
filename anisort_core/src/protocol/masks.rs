//! `fmask`/`amask` bitmasks for the `FILE` command
//!
//! AniDB returns the selected fields in bit order, most significant bit first:
//! the file id, then every selected file field, then every selected anime field.
//! The field tables below are listed in that order.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! mask_fields {
    ($field:ident, $bits:ty, [$(($variant:ident, $bit:expr)),+ $(,)?]) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $field {
            $($variant),+
        }

        impl $field {
            /// Every field, in wire order
            pub const ALL: &'static [$field] = &[$($field::$variant),+];

            pub const fn bit(self) -> $bits {
                match self {
                    $($field::$variant => $bit),+
                }
            }
        }
    };
}

mask_fields!(FileField, u64, [
    (AnimeId, 0x40_0000_0000),
    (EpisodeId, 0x20_0000_0000),
    (GroupId, 0x10_0000_0000),
    (MylistId, 0x08_0000_0000),
    (OtherEpisodes, 0x04_0000_0000),
    (IsDeprecated, 0x02_0000_0000),
    (State, 0x01_0000_0000),
    (Size, 0x00_8000_0000),
    (Ed2k, 0x00_4000_0000),
    (Md5, 0x00_2000_0000),
    (Sha1, 0x00_1000_0000),
    (Crc32, 0x00_0800_0000),
    (ColourDepth, 0x00_0200_0000),
    (Quality, 0x00_0080_0000),
    (Source, 0x00_0040_0000),
    (AudioCodecs, 0x00_0020_0000),
    (AudioBitrates, 0x00_0010_0000),
    (VideoCodec, 0x00_0008_0000),
    (VideoBitrate, 0x00_0004_0000),
    (VideoResolution, 0x00_0002_0000),
    (FileType, 0x00_0001_0000),
    (DubLanguage, 0x00_0000_8000),
    (SubLanguage, 0x00_0000_4000),
    (LengthSeconds, 0x00_0000_2000),
    (Description, 0x00_0000_1000),
    (AiredDate, 0x00_0000_0800),
    (AnidbFileName, 0x00_0000_0100),
    (MylistState, 0x00_0000_0080),
    (MylistFileState, 0x00_0000_0040),
    (MylistViewed, 0x00_0000_0020),
    (MylistViewDate, 0x00_0000_0010),
    (MylistStorage, 0x00_0000_0008),
    (MylistSource, 0x00_0000_0004),
    (MylistOther, 0x00_0000_0002),
]);

mask_fields!(AnimeField, u32, [
    (TotalEpisodes, 0x8000_0000),
    (HighestEpisode, 0x4000_0000),
    (Year, 0x2000_0000),
    (Kind, 0x1000_0000),
    (RelatedAidList, 0x0800_0000),
    (RelatedAidType, 0x0400_0000),
    (CategoryList, 0x0200_0000),
    (RomajiName, 0x0080_0000),
    (KanjiName, 0x0040_0000),
    (EnglishName, 0x0020_0000),
    (OtherName, 0x0010_0000),
    (ShortNameList, 0x0008_0000),
    (SynonymList, 0x0004_0000),
    (EpisodeNumber, 0x0000_8000),
    (EpisodeName, 0x0000_4000),
    (EpisodeRomajiName, 0x0000_2000),
    (EpisodeKanjiName, 0x0000_1000),
    (EpisodeRating, 0x0000_0800),
    (EpisodeVoteCount, 0x0000_0400),
    (GroupName, 0x0000_0080),
    (GroupShortName, 0x0000_0040),
    (DateRecordUpdated, 0x0000_0001),
]);

/// Five byte file field selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMask(u64);

impl FileMask {
    /// Ids the pipeline needs to link a file to its anime, episode and group
    pub const REQUIRED: FileMask = FileMask(
        FileField::AnimeId.bit() | FileField::EpisodeId.bit() | FileField::GroupId.bit(),
    );

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits & 0xFF_FFFF_FFFF)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn with(self, field: FileField) -> Self {
        Self(self.0 | field.bit())
    }

    pub const fn union(self, other: FileMask) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, field: FileField) -> bool {
        self.0 & field.bit() != 0
    }

    /// Selected fields in the order the server returns them
    pub fn fields(self) -> impl Iterator<Item = FileField> {
        FileField::ALL
            .iter()
            .copied()
            .filter(move |field| self.contains(*field))
    }
}

impl Default for FileMask {
    fn default() -> Self {
        [
            FileField::State,
            FileField::Size,
            FileField::Ed2k,
            FileField::Crc32,
            FileField::Quality,
            FileField::Source,
            FileField::AudioCodecs,
            FileField::VideoCodec,
            FileField::VideoResolution,
            FileField::FileType,
            FileField::DubLanguage,
            FileField::SubLanguage,
            FileField::LengthSeconds,
            FileField::AnidbFileName,
        ]
        .into_iter()
        .fold(Self::REQUIRED, FileMask::with)
    }
}

impl fmt::Display for FileMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010X}", self.0)
    }
}

/// Four byte anime field selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimeMask(u32);

impl AnimeMask {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn with(self, field: AnimeField) -> Self {
        Self(self.0 | field.bit())
    }

    pub const fn contains(self, field: AnimeField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn fields(self) -> impl Iterator<Item = AnimeField> {
        AnimeField::ALL
            .iter()
            .copied()
            .filter(move |field| self.contains(*field))
    }
}

impl Default for AnimeMask {
    fn default() -> Self {
        [
            AnimeField::TotalEpisodes,
            AnimeField::Year,
            AnimeField::Kind,
            AnimeField::RomajiName,
            AnimeField::KanjiName,
            AnimeField::EnglishName,
            AnimeField::EpisodeNumber,
            AnimeField::EpisodeName,
            AnimeField::EpisodeRomajiName,
            AnimeField::EpisodeKanjiName,
            AnimeField::GroupName,
            AnimeField::GroupShortName,
        ]
        .into_iter()
        .fold(Self::empty(), AnimeMask::with)
    }
}

impl fmt::Display for AnimeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_tables_are_in_descending_bit_order() {
        assert!(FileField::ALL.windows(2).all(|w| w[0].bit() > w[1].bit()));
        assert!(AnimeField::ALL.windows(2).all(|w| w[0].bit() > w[1].bit()));
    }

    #[test]
    fn test_field_bits_are_single_and_unique() {
        let mut seen = HashSet::new();
        for field in FileField::ALL {
            assert_eq!(field.bit().count_ones(), 1, "{field:?}");
            assert!(seen.insert(field.bit()));
        }

        let mut seen = HashSet::new();
        for field in AnimeField::ALL {
            assert_eq!(field.bit().count_ones(), 1, "{field:?}");
            assert!(seen.insert(field.bit()));
        }
    }

    #[test]
    fn test_mask_hex_is_fixed_width_uppercase() {
        let mask = FileMask::empty().with(FileField::AnimeId);
        assert_eq!(mask.to_string(), "4000000000");

        let mask = AnimeMask::empty().with(AnimeField::GroupShortName);
        assert_eq!(mask.to_string(), "00000040");

        let mask = FileMask::empty().with(FileField::Ed2k).with(FileField::Size);
        assert_eq!(mask.to_string(), "00C0000000");
    }

    #[test]
    fn test_default_masks_include_linkage_ids() {
        let mask = FileMask::default();
        assert!(mask.contains(FileField::AnimeId));
        assert!(mask.contains(FileField::EpisodeId));
        assert!(mask.contains(FileField::GroupId));
        assert!(!mask.contains(FileField::Md5));
    }

    #[test]
    fn test_fields_iterate_in_wire_order() {
        let mask = FileMask::empty()
            .with(FileField::FileType)
            .with(FileField::AnimeId)
            .with(FileField::Size);
        let fields: Vec<_> = mask.fields().collect();
        assert_eq!(
            fields,
            vec![FileField::AnimeId, FileField::Size, FileField::FileType]
        );
    }

    #[test]
    fn test_from_bits_truncates_to_five_bytes() {
        assert_eq!(FileMask::from_bits(u64::MAX).bits(), 0xFF_FFFF_FFFF);
    }
}
