// 進行監視の具象実装

use crate::core::{ConsumerStatus, LaunchObserver, LaunchReport, ProductionOutcome, ProductionReport};

/// tracing へ進行状況を出力する実装
#[derive(Debug, Default, Clone)]
pub struct TracingLaunchObserver {
    quiet: bool,
}

impl TracingLaunchObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 失敗だけを出力する
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl LaunchObserver for TracingLaunchObserver {
    fn on_launch(&self, consumers: usize) {
        if !self.quiet {
            tracing::info!(consumers, "🚀 starting fan-out");
        }
    }

    fn on_production_finished(&self, report: &ProductionReport) {
        match &report.outcome {
            ProductionOutcome::Exhausted => {
                if !self.quiet {
                    tracing::info!(
                        items = report.items_produced,
                        subscribers = report.subscribers,
                        "📦 production finished"
                    );
                }
            }
            ProductionOutcome::Failed(reason) => {
                tracing::warn!(items = report.items_produced, %reason, "❌ production failed");
            }
        }
    }

    fn on_consumer_finished(&self, status: &ConsumerStatus) {
        match &status.failure {
            Some(failure) => tracing::warn!(consumer = status.index, %failure, "❌ consumer failed"),
            None if !self.quiet => tracing::info!(consumer = status.index, "consumer finished"),
            None => {}
        }
    }

    fn on_completed(&self, report: &LaunchReport) {
        if !self.quiet {
            tracing::info!(
                succeeded = report.consumers_succeeded,
                failed = report.consumers_failed,
                elapsed_ms = report.elapsed_ms,
                "✅ fan-out completed"
            );
        }
    }
}

/// 何もしない監視実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpLaunchObserver;

impl NoOpLaunchObserver {
    pub fn new() -> Self {
        Self
    }
}

impl LaunchObserver for NoOpLaunchObserver {
    fn on_launch(&self, _consumers: usize) {
        // 何もしない
    }

    fn on_production_finished(&self, _report: &ProductionReport) {
        // 何もしない
    }

    fn on_consumer_finished(&self, _status: &ConsumerStatus) {
        // 何もしない
    }

    fn on_completed(&self, _report: &LaunchReport) {
        // 何もしない
    }
}
