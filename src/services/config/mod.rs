// 設定管理
// エンジンのバッファ深さ・スレッド命名の既定値とファイル読み込み

pub mod implementations;

// 公開API
pub use implementations::DefaultEngineConfig;
