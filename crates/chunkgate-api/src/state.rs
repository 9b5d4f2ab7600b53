//! Application state shared by every handler

use crate::error::HttpAppError;
use chunkgate_core::{Config, UploadError};
use chunkgate_services::{EncryptionKeyManager, FilesApi, StatusAggregator, UploadCoordinator};
use chunkgate_storage::ObjectStorage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn ObjectStorage>,
    pub files: Arc<dyn FilesApi>,
    /// `None` when encryption is disabled
    pub keys: Option<EncryptionKeyManager>,
    pub coordinator: UploadCoordinator,
    pub status: StatusAggregator,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn ObjectStorage>,
        files: Arc<dyn FilesApi>,
        keys: Option<EncryptionKeyManager>,
    ) -> Self {
        let coordinator = UploadCoordinator::new(
            storage.clone(),
            files.clone(),
            keys.clone(),
            config.completion_digest(),
        );
        let status = StatusAggregator::new(storage.clone(), files.clone(), keys.clone());

        Self {
            config: Arc::new(config),
            storage,
            files,
            keys,
            coordinator,
            status,
        }
    }

    /// Wrap a protocol error for rendering under this deployment's disclosure rules
    pub fn error(&self, error: UploadError) -> HttpAppError {
        HttpAppError::Upload {
            error,
            expose_details: !self.config.is_production(),
        }
    }

    /// Wrap the failure of a completion call made after every chunk was stored
    pub fn notification_error(&self, error: UploadError) -> HttpAppError {
        HttpAppError::NotificationFailed {
            error,
            expose_details: !self.config.is_production(),
        }
    }
}
