//! In-memory repository

use super::{FileAction, LocalFile, NewFileAction, Repository, ensure_paired};
use crate::Result;
use crate::error::ConcurrencyError;
use crate::metadata::{AnimeMetadata, EpisodeMetadata, FileLookup, FileMetadata, GroupMetadata};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    next_file_id: i64,
    next_action_id: i64,
    files: HashMap<i64, LocalFile>,
    by_path: HashMap<PathBuf, i64>,
    actions: Vec<FileAction>,
    anime: HashMap<u32, AnimeMetadata>,
    episodes: HashMap<u32, EpisodeMetadata>,
    remote_files: HashMap<u32, FileMetadata>,
    groups: HashMap<u32, GroupMetadata>,
}

impl Store {
    fn update_file(&mut self, file: &LocalFile) -> Result<LocalFile> {
        let stored = self
            .files
            .get_mut(&file.id)
            .ok_or_else(|| ConcurrencyError::vanished("local_file", file.id))?;

        if stored.version != file.version {
            return Err(ConcurrencyError::stale_record(
                "local_file",
                file.id,
                file.version,
                stored.version,
            )
            .into());
        }

        let updated = LocalFile {
            version: file.version + 1,
            updated_at: Utc::now(),
            ..file.clone()
        };
        let previous = std::mem::replace(stored, updated.clone());

        if previous.path != updated.path {
            self.by_path.remove(&previous.path);
        }
        self.by_path.insert(updated.path.clone(), updated.id);
        Ok(updated)
    }

    fn append_action(&mut self, action: NewFileAction) -> Result<FileAction> {
        if !self.files.contains_key(&action.local_file_id) {
            return Err(ConcurrencyError::vanished("local_file", action.local_file_id).into());
        }

        self.next_action_id += 1;
        let action = action.stored(self.next_action_id);
        self.actions.push(action.clone());
        Ok(action)
    }
}

/// Repository held entirely in memory. Used by tests and when no database is configured.
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked files
    pub async fn len(&self) -> usize {
        self.store.read().await.files.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_or_create_local_file(&self, path: &Path) -> Result<LocalFile> {
        let mut store = self.store.write().await;
        if let Some(file) = store.by_path.get(path).and_then(|id| store.files.get(id)) {
            return Ok(file.clone());
        }

        store.next_file_id += 1;
        let file = LocalFile::new(store.next_file_id, path);
        store.by_path.insert(path.to_path_buf(), file.id);
        store.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find_local_file(&self, path: &Path) -> Result<Option<LocalFile>> {
        let store = self.store.read().await;
        Ok(store
            .by_path
            .get(path)
            .and_then(|id| store.files.get(id))
            .cloned())
    }

    async fn update_local_file(&self, file: &LocalFile) -> Result<LocalFile> {
        self.store.write().await.update_file(file)
    }

    async fn file_actions(&self, local_file_id: i64) -> Result<Vec<FileAction>> {
        let store = self.store.read().await;
        let mut actions: Vec<_> = store
            .actions
            .iter()
            .filter(|action| action.local_file_id == local_file_id)
            .cloned()
            .collect();
        actions.sort_by_key(|action| (action.created_at, action.id));
        Ok(actions)
    }

    async fn append_file_action(&self, action: NewFileAction) -> Result<FileAction> {
        self.store.write().await.append_action(action)
    }

    async fn commit_file_change(
        &self,
        file: &LocalFile,
        action: NewFileAction,
    ) -> Result<(LocalFile, FileAction)> {
        ensure_paired(file, &action)?;
        let mut store = self.store.write().await;
        let updated = store.update_file(file)?;
        let action = store.append_action(action)?;
        Ok((updated, action))
    }

    async fn upsert_lookup(&self, lookup: &FileLookup) -> Result<()> {
        let mut store = self.store.write().await;
        if let Some(anime) = &lookup.anime {
            store.anime.insert(anime.aid, anime.clone());
        }
        if let Some(episode) = &lookup.episode {
            store.episodes.insert(episode.eid, episode.clone());
        }
        if let Some(group) = &lookup.group {
            store.groups.insert(group.gid, group.clone());
        }
        store
            .remote_files
            .insert(lookup.file.fid, lookup.file.clone());
        Ok(())
    }

    async fn find_lookup(&self, fid: u32) -> Result<Option<FileLookup>> {
        let store = self.store.read().await;
        Ok(store.remote_files.get(&fid).map(|file| FileLookup {
            file: file.clone(),
            anime: file.aid.and_then(|aid| store.anime.get(&aid)).cloned(),
            episode: file.eid.and_then(|eid| store.episodes.get(&eid)).cloned(),
            group: file.gid.and_then(|gid| store.groups.get(&gid)).cloned(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::persistence::{FileActionKind, FileStatus};
    use chrono::Duration;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let repository = MemoryRepository::new();
        let first = repository
            .get_or_create_local_file(Path::new("/a.mkv"))
            .await
            .unwrap();
        let second = repository
            .get_or_create_local_file(Path::new("/a.mkv"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, FileStatus::NotYetImported);
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_rejects_stale_writes() {
        let repository = MemoryRepository::new();
        let mut file = repository
            .get_or_create_local_file(Path::new("/a.mkv"))
            .await
            .unwrap();
        let stale = file.clone();

        file.set_status(FileStatus::Hashed).unwrap();
        let updated = repository.update_local_file(&file).await.unwrap();
        assert_eq!(updated.version, 1);

        let error = repository.update_local_file(&stale).await.unwrap_err();
        assert!(matches!(
            error,
            Error::Concurrency(ConcurrencyError::StaleRecord {
                expected: 0,
                found: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_actions_are_ordered_by_creation_time() {
        let repository = MemoryRepository::new();
        let file = repository
            .get_or_create_local_file(Path::new("/a.mkv"))
            .await
            .unwrap();

        let now = Utc::now();
        repository
            .append_file_action(NewFileAction::succeeded(file.id, FileActionKind::Search).at(now))
            .await
            .unwrap();
        repository
            .append_file_action(
                NewFileAction::succeeded(file.id, FileActionKind::Hash).at(now - Duration::hours(1)),
            )
            .await
            .unwrap();

        let kinds: Vec<_> = repository
            .file_actions(file.id)
            .await
            .unwrap()
            .into_iter()
            .map(|action| action.kind)
            .collect();
        assert_eq!(kinds, vec![FileActionKind::Hash, FileActionKind::Search]);
    }

    #[tokio::test]
    async fn test_commit_stores_status_and_action_together() {
        let repository = MemoryRepository::new();
        let mut file = repository
            .get_or_create_local_file(Path::new("/a.mkv"))
            .await
            .unwrap();
        file.set_status(FileStatus::Hashed).unwrap();

        let (stored, action) = repository
            .commit_file_change(&file, NewFileAction::succeeded(file.id, FileActionKind::Hash))
            .await
            .unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(action.local_file_id, file.id);
        assert_eq!(repository.file_actions(file.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_commit_records_no_action() {
        let repository = MemoryRepository::new();
        let mut file = repository
            .get_or_create_local_file(Path::new("/a.mkv"))
            .await
            .unwrap();
        let mut stale = file.clone();

        file.set_status(FileStatus::Hashed).unwrap();
        repository.update_local_file(&file).await.unwrap();

        stale.set_status(FileStatus::Error).unwrap();
        let result = repository
            .commit_file_change(&stale, NewFileAction::failed(stale.id, FileActionKind::Hash, "io"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Concurrency(ConcurrencyError::StaleRecord { .. }))
        ));
        assert!(repository.file_actions(file.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_action_of_another_file() {
        let repository = MemoryRepository::new();
        let file = repository
            .get_or_create_local_file(Path::new("/a.mkv"))
            .await
            .unwrap();

        let result = repository
            .commit_file_change(&file, NewFileAction::succeeded(file.id + 1, FileActionKind::Hash))
            .await;
        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(
            repository.find_local_file(Path::new("/a.mkv")).await.unwrap().unwrap().version,
            0
        );
    }

    #[tokio::test]
    async fn test_moved_file_is_found_only_at_new_path() {
        let repository = MemoryRepository::new();
        let mut file = repository
            .get_or_create_local_file(Path::new("/incoming/a.mkv"))
            .await
            .unwrap();
        file.path = PathBuf::from("/library/a.mkv");
        repository.update_local_file(&file).await.unwrap();

        assert!(
            repository
                .find_local_file(Path::new("/incoming/a.mkv"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            repository
                .find_local_file(Path::new("/library/a.mkv"))
                .await
                .unwrap()
                .unwrap()
                .id,
            file.id
        );
    }

    #[tokio::test]
    async fn test_action_for_unknown_file_is_rejected() {
        let repository = MemoryRepository::new();
        let result = repository
            .append_file_action(NewFileAction::succeeded(42, FileActionKind::Hash))
            .await;
        assert!(matches!(
            result,
            Err(Error::Concurrency(ConcurrencyError::Vanished { id: 42, .. }))
        ));
    }

    #[tokio::test]
    async fn test_upsert_lookup_replaces_by_remote_id() {
        let repository = MemoryRepository::new();
        let mut lookup = FileLookup {
            file: FileMetadata {
                fid: 7,
                aid: Some(1),
                ..Default::default()
            },
            anime: Some(AnimeMetadata {
                aid: 1,
                romaji_name: Some("Old".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        repository.upsert_lookup(&lookup).await.unwrap();

        lookup.anime.as_mut().unwrap().romaji_name = Some("New".into());
        repository.upsert_lookup(&lookup).await.unwrap();

        let stored = repository.find_lookup(7).await.unwrap().unwrap();
        assert_eq!(
            stored.anime.unwrap().romaji_name.as_deref(),
            Some("New")
        );
        assert!(repository.find_lookup(8).await.unwrap().is_none());
    }
}
