use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::error::ErrorCode;

/// 最新何件のレイテンシを保持するか
const LATENCY_CAPACITY: usize = 1000;

/// ローカルメトリクス収集器（外部送信はしない）
pub struct Metrics {
    counters: Mutex<MetricsCounters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default)]
struct MetricsCounters {
    cycles_triggered: u64,
    rewrites_succeeded: u64,
    rewrites_failed: u64,
    cycles_delivered: u64,
    cycles_superseded: u64,
    cycles_without_input: u64,
    errors: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub phase: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// メトリクスサマリー
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub cycles_triggered: u64,
    pub rewrites_succeeded: u64,
    pub rewrites_failed: u64,
    pub cycles_delivered: u64,
    pub cycles_superseded: u64,
    pub cycles_without_input: u64,
    /// エラーコード → 件数
    pub error_counts: BTreeMap<&'static str, u64>,
    pub avg_latency_ms: AvgLatency,
    pub recent_latencies: Vec<LatencyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgLatency {
    pub rewrite: Option<f64>,
    pub deliver: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(MetricsCounters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    pub fn inc_cycles_triggered(&self) {
        self.counters.lock().cycles_triggered += 1;
    }

    pub fn inc_rewrites_succeeded(&self) {
        self.counters.lock().rewrites_succeeded += 1;
    }

    pub fn inc_rewrites_failed(&self) {
        self.counters.lock().rewrites_failed += 1;
    }

    pub fn inc_cycles_delivered(&self) {
        self.counters.lock().cycles_delivered += 1;
    }

    pub fn inc_cycles_superseded(&self) {
        self.counters.lock().cycles_superseded += 1;
    }

    pub fn inc_cycles_without_input(&self) {
        self.counters.lock().cycles_without_input += 1;
    }

    pub fn inc_error(&self, code: ErrorCode) {
        *self.counters.lock().errors.entry(code.as_str()).or_default() += 1;
    }

    pub fn record_latency(&self, phase: &str, duration_ms: u64) {
        let record = LatencyRecord {
            phase: phase.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut latencies = self.latencies.lock();
        latencies.push(record);
        if latencies.len() > LATENCY_CAPACITY {
            let excess = latencies.len() - LATENCY_CAPACITY;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = self.counters.lock();
        let latencies = self.latencies.lock();

        let avg = |phase: &str| -> Option<f64> {
            let vals: Vec<f64> = latencies
                .iter()
                .filter(|r| r.phase == phase)
                .map(|r| r.duration_ms as f64)
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        };

        let recent: Vec<LatencyRecord> = latencies.iter().rev().take(20).cloned().collect();

        MetricsSummary {
            cycles_triggered: c.cycles_triggered,
            rewrites_succeeded: c.rewrites_succeeded,
            rewrites_failed: c.rewrites_failed,
            cycles_delivered: c.cycles_delivered,
            cycles_superseded: c.cycles_superseded,
            cycles_without_input: c.cycles_without_input,
            error_counts: c.errors.clone(),
            avg_latency_ms: AvgLatency {
                rewrite: avg("rewrite"),
                deliver: avg("deliver"),
            },
            recent_latencies: recent,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
