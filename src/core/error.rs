// Custom error types for the fan-out stream engine
// ストリームエンジン専用のカスタムエラー型定義

use super::types::WorkerState;
use thiserror::Error;

/// ストリームエンジン固有のエラー型
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("設定エラー: {message}")]
    Configuration { message: String },

    #[error("チャンネルエラー: クローズ済みのチャンネルに送信しました")]
    ChannelClosed,

    #[error("ストリーム未設定エラー: consumer #{consumer}")]
    MissingStream { consumer: usize },

    #[error("消費エラー: consumer #{consumer} - {source}")]
    Consume {
        consumer: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("消費パニック: consumer #{consumer} - {message}")]
    ConsumerPanicked { consumer: usize, message: String },

    #[error("ワーカー状態エラー: {worker} は {state} 状態のため実行できません")]
    WorkerLifecycle { worker: String, state: WorkerState },

    #[error("エンジンは既に起動済みです")]
    AlreadyLaunched,

    #[error("コンシューマ番号が範囲外です: index {index} (登録数 {len})")]
    ConsumerIndexOutOfBounds { index: usize, len: usize },

    #[error("スレッド起動エラー: {name} - {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("タスクエラー: {source}")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },
}

impl StreamError {
    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// ストリーム未設定エラーの作成
    pub fn missing_stream(consumer: usize) -> Self {
        Self::MissingStream { consumer }
    }

    /// 消費エラーの作成
    pub fn consume(consumer: usize, source: anyhow::Error) -> Self {
        Self::Consume { consumer, source }
    }

    /// 消費パニックの作成
    pub fn consumer_panicked(consumer: usize, message: impl Into<String>) -> Self {
        Self::ConsumerPanicked {
            consumer,
            message: message.into(),
        }
    }

    /// ワーカー状態エラーの作成
    pub fn worker_lifecycle(worker: impl Into<String>, state: WorkerState) -> Self {
        Self::WorkerLifecycle {
            worker: worker.into(),
            state,
        }
    }

    /// 範囲外アクセスエラーの作成
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Self::ConsumerIndexOutOfBounds { index, len }
    }

    /// スレッド起動エラーの作成
    pub fn thread_spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::ThreadSpawn {
            name: name.into(),
            source,
        }
    }

    /// タスクエラーの作成
    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::Task { source }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Configuration { .. } | Self::AlreadyLaunched => ErrorSeverity::High,
            Self::WorkerLifecycle { .. } | Self::ConsumerIndexOutOfBounds { .. } => {
                ErrorSeverity::High
            }
            Self::Consume { .. } | Self::MissingStream { .. } => {
                ErrorSeverity::Medium
            }
            Self::ChannelClosed => ErrorSeverity::Low,
            Self::ConsumerPanicked { .. } | Self::Task { .. } => ErrorSeverity::High,
            Self::ThreadSpawn { .. } => ErrorSeverity::Critical,
        }
    }

    /// エラーが回復可能かどうかを判定
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Configuration { .. } => false,
            Self::WorkerLifecycle { .. } | Self::AlreadyLaunched => false,
            Self::ThreadSpawn { .. } => false,
            Self::ChannelClosed => true,
            Self::MissingStream { .. } => true,
            Self::Consume { .. } | Self::ConsumerPanicked { .. } => true,
            Self::ConsumerIndexOutOfBounds { .. } => true,
            Self::Task { .. } => true,
        }
    }

    /// エラーコンテキストを取得
    pub fn context(&self) -> ErrorContext {
        match self {
            Self::Configuration { message } => ErrorContext::new("configuration")
                .with_suggestion(format!("設定を確認してください: {message}")),
            Self::MissingStream { consumer } => ErrorContext::new("consume")
                .with_resource(format!("consumer #{consumer}"))
                .with_suggestion("run() の前に provide() でストリームを渡してください"),
            Self::Consume { consumer, .. } | Self::ConsumerPanicked { consumer, .. } => {
                ErrorContext::new("consume").with_resource(format!("consumer #{consumer}"))
            }
            Self::WorkerLifecycle { worker, .. } => ErrorContext::new("worker_lifecycle")
                .with_resource(worker.clone())
                .with_suggestion("ワーカーは一度だけ実行できます"),
            Self::ConsumerIndexOutOfBounds { len, .. } => ErrorContext::new("consumer_lookup")
                .with_suggestion(format!("0..{len} の範囲で指定してください")),
            _ => ErrorContext::new("unknown"),
        }
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低重要度 - ログ出力程度
    Low,
    /// 中重要度 - 警告レベル
    Medium,
    /// 高重要度 - 要対応
    High,
    /// 致命的 - システム停止レベル
    Critical,
}

impl ErrorSeverity {
    /// 重要度の数値表現を取得
    pub const fn as_level(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// 重要度の文字列表現を取得
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// エラーコンテキスト情報
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// 実行していた操作
    pub operation: String,
    /// 関連するリソース（ワーカー名等）
    pub resource: Option<String>,
    /// エラー解決のための提案
    pub suggestion: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            resource: None,
            suggestion: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// ストリーム処理の結果型
pub type StreamResult<T> = std::result::Result<T, StreamError>;

impl From<tokio::task::JoinError> for StreamError {
    fn from(error: tokio::task::JoinError) -> Self {
        StreamError::Task { source: error }
    }
}
