// エンジン層 - ワーカーとオーケストレーション
// Producer 1つ・Consumer 複数をスレッドで並行実行する

pub mod api;
pub mod consumer;
pub mod producer;
pub mod producer_engine;

use std::any::Any;

// 公開API - 主要エンジンクラス
pub use api::{create_default_engine, create_quiet_engine, fan_out_iter};
pub use consumer::{ConsumerHandle, ConsumerTask, ConsumerWorker};
pub use producer::{ProducerWorker, DEFAULT_CHANNEL_DEPTH};
pub use producer_engine::{ProducerEngine, StreamFactory};

/// パニックのペイロードからメッセージを取り出す
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
