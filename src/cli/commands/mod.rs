pub mod grep;
pub mod stats;

pub use grep::*;
pub use stats::*;

use crate::{
    core::{ProductionOutcome, ProductionReport},
    services::{DefaultEngineConfig, LineProducer},
};
use anyhow::Result;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 入力の読み込み元（ファイルまたは標準入力）
pub type InputReader = Box<dyn BufRead + Send>;

/// 入力ファイルを開く。指定が無ければ標準入力
pub fn open_input(input: Option<&Path>) -> Result<LineProducer<InputReader>> {
    let reader: InputReader = match input {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Input file does not exist: {}", path.display());
            }
            Box::new(BufReader::new(std::fs::File::open(path)?))
        }
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    Ok(LineProducer::new(reader))
}

/// 設定ファイルとコマンドライン指定を合成する
pub fn resolve_config(config: Option<&Path>, depth: Option<usize>) -> Result<DefaultEngineConfig> {
    let mut resolved = match config {
        Some(path) => DefaultEngineConfig::from_json_file(path)?,
        None => DefaultEngineConfig::default(),
    };
    if let Some(depth) = depth {
        resolved = resolved.with_channel_depth(depth);
    }
    resolved.validate()?;
    Ok(resolved)
}

/// 読み込み失敗で終わった場合はエラーにする
fn ensure_input_consumed(production: Option<&ProductionReport>) -> Result<()> {
    match production.map(|report| &report.outcome) {
        Some(ProductionOutcome::Exhausted) => Ok(()),
        Some(ProductionOutcome::Failed(reason)) => anyhow::bail!("Failed to read input: {reason}"),
        None => anyhow::bail!("Input reader did not run"),
    }
}
