// 進行監視機能
// 起動・生産終了・Consumer終了・完了の通知

pub mod implementations;

// 公開API
pub use implementations::{NoOpLaunchObserver, TracingLaunchObserver};
