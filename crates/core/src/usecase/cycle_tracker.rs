use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::cycle::{CycleInfo, CycleStatus};
use crate::domain::types::TriggerSource;

/// リライトサイクルの発行・追跡
///
/// 同時に複数のサイクルが走りうる。結果の配信は「最後にトリガーされたサイクル」
/// だけが行い、それより古いサイクルの結果は `Superseded` として破棄する。
pub struct CycleTracker {
    inner: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    next_id: u64,
    latest: Option<u64>,
    cycles: HashMap<u64, CycleInfo>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerState::default()),
        }
    }

    /// サイクルを登録し ID を返す
    pub fn begin(&self, source: TriggerSource) -> u64 {
        let now = chrono::Utc::now().to_rfc3339();
        let mut state = self.inner.lock();
        state.next_id += 1;
        let cycle_id = state.next_id;
        state.latest = Some(cycle_id);
        state
            .cycles
            .insert(cycle_id, CycleInfo::new(cycle_id, source, now));
        cycle_id
    }

    /// このサイクルより後にトリガーされたものがなければ true
    pub fn is_latest(&self, cycle_id: u64) -> bool {
        self.inner.lock().latest == Some(cycle_id)
    }

    pub fn mark_delivered(&self, cycle_id: u64) {
        self.finish(cycle_id, CycleStatus::Delivered, None);
    }

    pub fn mark_failed(&self, cycle_id: u64, error: String) {
        self.finish(cycle_id, CycleStatus::Failed, Some(error));
    }

    pub fn mark_superseded(&self, cycle_id: u64) {
        self.finish(cycle_id, CycleStatus::Superseded, None);
    }

    /// 入力が見つからなかったトリガーを記録する。実行中のサイクルは置き換えない。
    pub fn record_no_input(&self, source: TriggerSource) -> u64 {
        let now = chrono::Utc::now().to_rfc3339();
        let mut state = self.inner.lock();
        state.next_id += 1;
        let cycle_id = state.next_id;
        let mut info = CycleInfo::new(cycle_id, source, now);
        info.status = CycleStatus::NoInput;
        state.cycles.insert(cycle_id, info);
        cycle_id
    }

    fn finish(&self, cycle_id: u64, status: CycleStatus, error: Option<String>) {
        let mut state = self.inner.lock();
        if let Some(info) = state.cycles.get_mut(&cycle_id) {
            info.status = status;
            info.error = error;
        }
    }

    pub fn get(&self, cycle_id: u64) -> Option<CycleInfo> {
        self.inner.lock().cycles.get(&cycle_id).cloned()
    }

    /// 実行中のサイクル数
    pub fn in_flight(&self) -> usize {
        self.inner
            .lock()
            .cycles
            .values()
            .filter(|c| !c.status.is_finished())
            .count()
    }

    /// 完了済みサイクルを削除（メモリ解放）
    pub fn cleanup_finished(&self) {
        self.inner
            .lock()
            .cycles
            .retain(|_, info| !info.status.is_finished());
    }
}

impl Default for CycleTracker {
    fn default() -> Self {
        Self::new()
    }
}
