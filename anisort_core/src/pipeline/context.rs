//! Resources shared by every stage of one pipeline

use super::collaborators::{MediaProber, PathBuilder};
use super::config::PipelineConfig;
use crate::Result;
use crate::metadata::FileLookup;
use crate::persistence::{FileAction, LocalFile, NewFileAction, Repository};
use crate::progress::SharedProvider;
use crate::protocol::ProtocolClient;
use crate::shutdown::Shutdown;
use log::debug;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything a stage needs. Writes go through the helpers here, which
/// serialize them and turn them into no-ops in debug mode.
pub struct PipelineContext {
    repository: Arc<dyn Repository>,
    client: Arc<ProtocolClient>,
    path_builder: Arc<dyn PathBuilder>,
    prober: Arc<dyn MediaProber>,
    progress: SharedProvider,
    config: PipelineConfig,
    shutdown: Shutdown,
    write_lock: Mutex<()>,
}

impl PipelineContext {
    pub fn new(
        repository: Arc<dyn Repository>,
        client: Arc<ProtocolClient>,
        path_builder: Arc<dyn PathBuilder>,
        prober: Arc<dyn MediaProber>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            repository,
            client,
            path_builder,
            prober,
            progress: SharedProvider::null(),
            config,
            shutdown: Shutdown::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_progress(mut self, progress: SharedProvider) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    pub fn client(&self) -> &ProtocolClient {
        &self.client
    }

    pub fn path_builder(&self) -> &dyn PathBuilder {
        self.path_builder.as_ref()
    }

    pub fn prober(&self) -> &dyn MediaProber {
        self.prober.as_ref()
    }

    pub fn progress(&self) -> &SharedProvider {
        &self.progress
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    /// Record for `path`. In debug mode an unknown path gets an unsaved record with id 0.
    pub async fn get_or_create_local_file(&self, path: &Path) -> Result<LocalFile> {
        if self.is_debug() {
            return Ok(self
                .repository
                .find_local_file(path)
                .await?
                .unwrap_or_else(|| LocalFile::new(0, path)));
        }

        let _guard = self.write_lock.lock().await;
        self.repository.get_or_create_local_file(path).await
    }

    pub async fn file_actions(&self, local_file_id: i64) -> Result<Vec<FileAction>> {
        self.repository.file_actions(local_file_id).await
    }

    pub async fn append_file_action(&self, action: NewFileAction) -> Result<()> {
        if self.is_debug() {
            debug!(
                "Debug mode: not recording {} action for file {}",
                action.kind, action.local_file_id
            );
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        self.repository.append_file_action(action).await?;
        Ok(())
    }

    /// Store the file record and the action describing what changed it
    pub async fn commit(&self, file: &LocalFile, action: NewFileAction) -> Result<LocalFile> {
        if self.is_debug() {
            debug!(
                "Debug mode: not storing {} as {} with {} action",
                file.path.display(),
                file.status,
                action.kind
            );
            return Ok(file.clone());
        }

        let _guard = self.write_lock.lock().await;
        let (stored, _) = self.repository.commit_file_change(file, action).await?;
        Ok(stored)
    }

    pub async fn upsert_lookup(&self, lookup: &FileLookup) -> Result<()> {
        if self.is_debug() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        self.repository.upsert_lookup(lookup).await
    }
}
