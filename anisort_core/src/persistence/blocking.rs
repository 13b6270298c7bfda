//! Synchronous access to a [`Repository`]

use super::{FileAction, LocalFile, NewFileAction, Repository};
use crate::Result;
use crate::metadata::FileLookup;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Drives an async repository from synchronous code.
///
/// Must not be called from a thread that is running the same runtime.
#[derive(Clone)]
pub struct BlockingRepository {
    inner: Arc<dyn Repository>,
    handle: Handle,
}

impl BlockingRepository {
    pub fn new(inner: Arc<dyn Repository>, handle: Handle) -> Self {
        Self { inner, handle }
    }

    pub fn get_or_create_local_file(&self, path: &Path) -> Result<LocalFile> {
        self.handle.block_on(self.inner.get_or_create_local_file(path))
    }

    pub fn find_local_file(&self, path: &Path) -> Result<Option<LocalFile>> {
        self.handle.block_on(self.inner.find_local_file(path))
    }

    pub fn update_local_file(&self, file: &LocalFile) -> Result<LocalFile> {
        self.handle.block_on(self.inner.update_local_file(file))
    }

    pub fn file_actions(&self, local_file_id: i64) -> Result<Vec<FileAction>> {
        self.handle.block_on(self.inner.file_actions(local_file_id))
    }

    pub fn append_file_action(&self, action: NewFileAction) -> Result<FileAction> {
        self.handle.block_on(self.inner.append_file_action(action))
    }

    pub fn commit_file_change(
        &self,
        file: &LocalFile,
        action: NewFileAction,
    ) -> Result<(LocalFile, FileAction)> {
        self.handle.block_on(self.inner.commit_file_change(file, action))
    }

    pub fn upsert_lookup(&self, lookup: &FileLookup) -> Result<()> {
        self.handle.block_on(self.inner.upsert_lookup(lookup))
    }

    pub fn find_lookup(&self, fid: u32) -> Result<Option<FileLookup>> {
        self.handle.block_on(self.inner.find_lookup(fid))
    }
}
