// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::artifact::{Artifact, ArtifactKind};
use crate::domain::models::run::{GenerationSettings, RunStatus};
use crate::domain::repositories::run_repository::{RepositoryError, RunRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// 仓库中的运行元数据
#[derive(Debug, Clone)]
struct StoredRun {
    #[allow(dead_code)]
    site_url: String,
    #[allow(dead_code)]
    settings: GenerationSettings,
    status: RunStatus,
    #[allow(dead_code)]
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// 内存运行仓库
///
/// 持久化协作方的进程内实现，记录运行元数据和产物。
#[derive(Default)]
pub struct MemoryRunRepository {
    runs: Mutex<HashMap<Uuid, StoredRun>>,
    artifacts: Mutex<HashMap<Uuid, Artifact>>,
}

impl MemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunRepository for MemoryRunRepository {
    async fn record_run_start(
        &self,
        run_id: Uuid,
        site_url: &str,
        settings: &GenerationSettings,
    ) -> Result<(), RepositoryError> {
        let mut runs = self.runs.lock();
        runs.insert(
            run_id,
            StoredRun {
                site_url: site_url.to_string(),
                settings: settings.clone(),
                status: RunStatus::Started,
                started_at: Utc::now(),
                finished_at: None,
            },
        );
        Ok(())
    }

    async fn record_artifact(
        &self,
        run_id: Uuid,
        kind: ArtifactKind,
        content: &str,
    ) -> Result<(), RepositoryError> {
        if !self.runs.lock().contains_key(&run_id) {
            return Err(RepositoryError::NotFound);
        }
        let mut artifacts = self.artifacts.lock();
        if artifacts.contains_key(&run_id) {
            return Err(RepositoryError::Storage(
                "artifact already recorded for run".to_string(),
            ));
        }
        artifacts.insert(run_id, Artifact::new(run_id, kind, content.to_string()));
        Ok(())
    }

    async fn mark_run_finished(
        &self,
        run_id: Uuid,
        status: RunStatus,
    ) -> Result<(), RepositoryError> {
        let mut runs = self.runs.lock();
        let stored = runs.get_mut(&run_id).ok_or(RepositoryError::NotFound)?;
        stored.status = status;
        stored.finished_at = Some(Utc::now());
        Ok(())
    }

    async fn find_artifact(&self, run_id: Uuid) -> Result<Option<Artifact>, RepositoryError> {
        Ok(self.artifacts.lock().get(&run_id).cloned())
    }
}
