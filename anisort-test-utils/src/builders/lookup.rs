//! Builders for lookups and tracked files

use anisort_core::hashing::ContentHash;
use anisort_core::metadata::{
    AnimeMetadata, EpisodeMetadata, FileLookup, FileMetadata, GroupMetadata, Resolution,
};
use anisort_core::persistence::{FileStatus, LocalFile};
use std::path::PathBuf;

/// Builds a [`FileLookup`] with every field the path builder needs
#[derive(Debug, Clone)]
pub struct LookupBuilder {
    lookup: FileLookup,
}

impl LookupBuilder {
    pub fn new(fid: u32) -> Self {
        Self {
            lookup: FileLookup {
                file: FileMetadata {
                    fid,
                    aid: Some(1),
                    eid: Some(10),
                    gid: Some(100),
                    file_type: Some("mkv".into()),
                    video_resolution: Some(Resolution::new(1920, 1080)),
                    ..Default::default()
                },
                anime: Some(AnimeMetadata {
                    aid: 1,
                    romaji_name: Some("Cowboy Bebop".into()),
                    english_name: Some("Cowboy Bebop".into()),
                    year: Some("1998-1999".into()),
                    kind: Some("TV Series".into()),
                    episode_count: Some(26),
                    ..Default::default()
                }),
                episode: Some(EpisodeMetadata {
                    eid: 10,
                    aid: 1,
                    number: Some("01".into()),
                    english_name: Some("Asteroid Blues".into()),
                    ..Default::default()
                }),
                group: Some(GroupMetadata {
                    gid: 100,
                    name: Some("Example Subs".into()),
                    short_name: Some("ES".into()),
                }),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        if let Some(anime) = self.lookup.anime.as_mut() {
            anime.romaji_name = Some(title.into());
        }
        self
    }

    pub fn episode_number(mut self, number: Option<&str>) -> Self {
        if let Some(episode) = self.lookup.episode.as_mut() {
            episode.number = number.map(str::to_string);
        }
        self
    }

    pub fn episode_name(mut self, name: &str) -> Self {
        if let Some(episode) = self.lookup.episode.as_mut() {
            episode.english_name = Some(name.into());
        }
        self
    }

    pub fn file_type(mut self, file_type: Option<&str>) -> Self {
        self.lookup.file.file_type = file_type.map(str::to_string);
        self
    }

    pub fn resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.lookup.file.video_resolution = resolution;
        self
    }

    pub fn build(self) -> FileLookup {
        self.lookup
    }
}

/// Builds a [`LocalFile`] in a given state without going through a repository
#[derive(Debug, Clone)]
pub struct LocalFileBuilder {
    file: LocalFile,
}

impl LocalFileBuilder {
    pub fn new(id: i64, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            file: LocalFile::new(id, &path),
        }
    }

    pub fn hashed(mut self, hash: ContentHash, size: u64) -> Self {
        self.file.hash = Some(hash);
        self.file.size = Some(size);
        self.file.status = FileStatus::Hashed;
        self
    }

    pub fn status(mut self, status: FileStatus) -> Self {
        self.file.status = status;
        self
    }

    pub fn build(self) -> LocalFile {
        self.file
    }
}
