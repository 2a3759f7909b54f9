// 設定管理の具象実装

use crate::core::{EngineConfig, StreamError, StreamResult};
use crate::engine::producer::DEFAULT_CHANNEL_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// デフォルト設定実装
///
/// JSON ファイルからも読み込める。省略したキーは既定値になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultEngineConfig {
    channel_depth: usize,
    thread_name_prefix: String,
}

impl DefaultEngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel_depth(mut self, channel_depth: usize) -> Self {
        self.channel_depth = channel_depth;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// JSON ファイルから読み込み、検証まで行う
    pub fn from_json_file(path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StreamError::configuration(format!(
                "設定ファイルを読み込めません: {} ({e})",
                path.display()
            ))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            StreamError::configuration(format!(
                "設定ファイルの形式が不正です: {} ({e})",
                path.display()
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StreamResult<()> {
        if self.channel_depth == 0 {
            return Err(StreamError::configuration(
                "channel_depth は1以上である必要があります",
            ));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err(StreamError::configuration(
                "thread_name_prefix は空にできません",
            ));
        }
        Ok(())
    }
}

impl Default for DefaultEngineConfig {
    fn default() -> Self {
        Self {
            channel_depth: DEFAULT_CHANNEL_DEPTH,
            thread_name_prefix: "fanout".to_string(),
        }
    }
}

impl EngineConfig for DefaultEngineConfig {
    fn channel_depth(&self) -> usize {
        self.channel_depth
    }

    fn thread_name_prefix(&self) -> String {
        self.thread_name_prefix.clone()
    }
}
