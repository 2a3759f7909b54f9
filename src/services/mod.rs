// サービス層 - エンジンを取り巻く機能
// 設定・進行監視・データ供給元をそれぞれ独立して提供する

pub mod config;
pub mod monitoring;
pub mod sources;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use config::DefaultEngineConfig;
pub use monitoring::{NoOpLaunchObserver, TracingLaunchObserver};
pub use sources::{IterProducer, LineProducer};
