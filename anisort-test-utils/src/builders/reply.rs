//! `220 FILE` reply text

use anisort_core::metadata::FileLookup;
use anisort_core::protocol::{AnimeField, AnimeMask, FileField, FileMask};
use std::collections::HashMap;

/// Lays out field values in the order the masks select them
#[derive(Debug, Clone, Default)]
pub struct FileReplyBuilder {
    fid: u32,
    file: HashMap<FileField, String>,
    anime: HashMap<AnimeField, String>,
}

impl FileReplyBuilder {
    pub fn new(fid: u32) -> Self {
        Self {
            fid,
            ..Default::default()
        }
    }

    /// Fill every field a lookup carries
    pub fn from_lookup(lookup: &FileLookup) -> Self {
        let file = &lookup.file;
        let mut reply = Self::new(file.fid);
        let ids = [
            (FileField::AnimeId, file.aid),
            (FileField::EpisodeId, file.eid),
            (FileField::GroupId, file.gid),
        ];
        for (field, value) in ids {
            if let Some(value) = value {
                reply = reply.file(field, value.to_string());
            }
        }
        if let Some(size) = file.size {
            reply = reply.file(FileField::Size, size.to_string());
        }
        if let Some(hash) = file.ed2k {
            reply = reply.file(FileField::Ed2k, hash.to_string());
        }
        if let Some(file_type) = &file.file_type {
            reply = reply.file(FileField::FileType, file_type.clone());
        }
        if let Some(resolution) = file.video_resolution {
            reply = reply.file(FileField::VideoResolution, resolution.to_string());
        }
        if let Some(anime) = &lookup.anime {
            if let Some(name) = &anime.romaji_name {
                reply = reply.anime(AnimeField::RomajiName, name.clone());
            }
            if let Some(name) = &anime.english_name {
                reply = reply.anime(AnimeField::EnglishName, name.clone());
            }
        }
        if let Some(episode) = &lookup.episode {
            if let Some(number) = &episode.number {
                reply = reply.anime(AnimeField::EpisodeNumber, number.clone());
            }
            if let Some(name) = &episode.english_name {
                reply = reply.anime(AnimeField::EpisodeName, name.clone());
            }
        }
        if let Some(group) = &lookup.group {
            if let Some(name) = &group.name {
                reply = reply.anime(AnimeField::GroupName, name.clone());
            }
            if let Some(name) = &group.short_name {
                reply = reply.anime(AnimeField::GroupShortName, name.clone());
            }
        }
        reply
    }

    pub fn file(mut self, field: FileField, value: impl Into<String>) -> Self {
        self.file.insert(field, value.into());
        self
    }

    pub fn anime(mut self, field: AnimeField, value: impl Into<String>) -> Self {
        self.anime.insert(field, value.into());
        self
    }

    pub fn build(&self, file_mask: FileMask, anime_mask: AnimeMask) -> String {
        let mut fields = vec![self.fid.to_string()];
        fields.extend(
            file_mask
                .fields()
                .map(|field| self.file.get(&field).cloned().unwrap_or_default()),
        );
        fields.extend(
            anime_mask
                .fields()
                .map(|field| self.anime.get(&field).cloned().unwrap_or_default()),
        );
        format!("220 FILE\n{}", fields.join("|"))
    }

    /// Reply for the default masks
    pub fn build_default(&self) -> String {
        self.build(FileMask::default(), AnimeMask::default())
    }
}
