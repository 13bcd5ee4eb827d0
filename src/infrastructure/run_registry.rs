// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run::Run;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 注册表错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    /// 同一站点已有进行中的运行
    #[error("A run is already in progress for this site")]
    AlreadyRunning,
}

/// 运行句柄
///
/// 运行记录只由该运行的流水线任务写入，其他调用方通过
/// 读锁轮询。取消标志在阶段边界被流水线检查。
#[derive(Clone)]
pub struct RunHandle {
    /// 运行记录
    pub run: Arc<RwLock<Run>>,
    cancelled: Arc<AtomicBool>,
}

impl RunHandle {
    fn new(run: Run) -> Self {
        Self {
            run: Arc::new(RwLock::new(run)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 请求取消该运行
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// 取消是否已被请求
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 活跃运行注册表
///
/// 跨运行共享的唯一状态，按站点键与运行ID索引。
/// 同一站点键同一时刻至多一个非终态运行，检查与插入
/// 在同一分片锁内完成，两个并发start不会都通过。
pub struct RunRegistry {
    /// 所有运行，按运行ID索引
    runs: DashMap<Uuid, RunHandle>,
    /// 进行中的运行，按站点键索引
    active: DashMap<String, Uuid>,
    /// 每个站点键最近一次运行，含终态
    latest: DashMap<String, Uuid>,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self {
            runs: DashMap::new(),
            active: DashMap::new(),
            latest: DashMap::new(),
        }
    }

    /// 注册新运行
    ///
    /// 原子的检查并插入：站点键存在非终态运行时拒绝。
    /// 终态的历史运行被新运行取代，旧运行仍可按ID读取。
    pub fn try_register(&self, run: Run) -> Result<RunHandle, RegistryError> {
        let site_key = run.site_key.clone();
        let run_id = run.id;

        match self.active.entry(site_key.clone()) {
            Entry::Occupied(mut occupied) => {
                let existing_id = *occupied.get();
                let existing_terminal = self
                    .runs
                    .get(&existing_id)
                    .map(|h| h.run.read().is_terminal())
                    .unwrap_or(true);
                if !existing_terminal {
                    return Err(RegistryError::AlreadyRunning);
                }
                occupied.insert(run_id);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(run_id);
            }
        }

        let handle = RunHandle::new(run);
        self.runs.insert(run_id, handle.clone());
        self.latest.insert(site_key, run_id);
        Ok(handle)
    }

    /// 运行进入终态后从活跃索引移除
    pub fn release(&self, site_key: &str, run_id: Uuid) {
        self.active.remove_if(site_key, |_, active_id| *active_id == run_id);
    }

    /// 按运行ID查找
    pub fn get_by_id(&self, run_id: Uuid) -> Option<RunHandle> {
        self.runs.get(&run_id).map(|h| h.value().clone())
    }

    /// 按站点键查找最近一次运行
    pub fn get_by_site(&self, site_key: &str) -> Option<RunHandle> {
        let run_id = *self.latest.get(site_key)?;
        self.get_by_id(run_id)
    }
}
