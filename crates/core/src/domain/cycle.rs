use serde::Serialize;

use super::types::TriggerSource;

/// リライトサイクルの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Running,
    Delivered,
    Failed,
    /// 後から発行されたサイクルがあるため結果を破棄した
    Superseded,
    NoInput,
}

impl CycleStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// サイクルのメタデータ
#[derive(Debug, Clone, Serialize)]
pub struct CycleInfo {
    pub cycle_id: u64,
    pub source: TriggerSource,
    pub status: CycleStatus,
    pub created_at: String,
    pub error: Option<String>,
}

impl CycleInfo {
    pub fn new(cycle_id: u64, source: TriggerSource, now: String) -> Self {
        Self {
            cycle_id,
            source,
            status: CycleStatus::Running,
            created_at: now,
            error: None,
        }
    }
}
