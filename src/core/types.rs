// ストリーム処理に関連するデータ型定義

use serde::Serialize;
use std::fmt;

/// チャンネルを流れる信号
///
/// 終端は値ではなく専用のバリアントで表す。正規のデータが終端と
/// 取り違えられることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal<T> {
    Item(T),
    End,
}

impl<T> Signal<T> {
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// アイテムを取り出す（終端なら None）
    pub fn into_item(self) -> Option<T> {
        match self {
            Self::Item(item) => Some(item),
            Self::End => None,
        }
    }
}

/// ワーカーのライフサイクル状態
///
/// Idle → Running → Done の一方向のみ遷移する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WorkerState {
    #[default]
    Idle,
    Running,
    Done,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Done => "Done",
        };
        f.write_str(name)
    }
}

/// 生産ループの終了理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProductionOutcome {
    /// 生産関数がデータ終了を返した
    Exhausted,
    /// 生産関数が失敗した（終端は送信済み）
    Failed(String),
}

/// Producerワーカーの実行結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionReport {
    pub items_produced: usize,
    pub subscribers: usize,
    pub outcome: ProductionOutcome,
}

impl ProductionReport {
    pub fn is_exhausted(&self) -> bool {
        self.outcome == ProductionOutcome::Exhausted
    }
}

/// 個々のConsumerの状態スナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerStatus {
    pub index: usize,
    pub state: WorkerState,
    pub succeeded: bool,
    pub failure: Option<String>,
}

/// launch() 全体のサマリー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchReport {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub consumers_launched: usize,
    pub consumers_succeeded: usize,
    pub consumers_failed: usize,
    pub production: Option<ProductionReport>,
    pub elapsed_ms: u64,
}

impl LaunchReport {
    /// 全ワーカーが正常終了したか
    pub fn is_clean(&self) -> bool {
        self.consumers_failed == 0
            && self
                .production
                .as_ref()
                .is_some_and(ProductionReport::is_exhausted)
    }
}
