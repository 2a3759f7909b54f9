use super::{ensure_input_consumed, open_input, resolve_config};
use crate::{
    core::ObjectStream,
    services::{DefaultEngineConfig, LineProducer, TracingLaunchObserver},
    stream::ChannelStream,
    ProducerEngine,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;

/// stats コマンドの集計結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub generated_at: String,
    pub lines: usize,
    /// 行末を除いたUTF-8バイト数
    pub bytes: usize,
    /// 最長行の文字数
    pub longest_line: usize,
    pub distinct_words: usize,
    pub elapsed_ms: u64,
}

/// 入力を1回だけ読み、4つの集計Consumerへ同時に配る
pub async fn collect_stats<R>(
    producer: LineProducer<R>,
    config: DefaultEngineConfig,
) -> Result<StatsSummary>
where
    R: BufRead + Send + 'static,
{
    let mut engine = ProducerEngine::fallible(producer, LineProducer::next_line)
        .with_config(config)?
        .with_observer(TracingLaunchObserver::new());

    let lines = engine.subscribe(|stream| stream.count())?;
    let bytes = engine.subscribe(|stream| stream.map(|line| line.len()).sum::<usize>())?;
    let longest = engine.subscribe(|stream| {
        stream
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
    })?;
    let words = engine.subscribe(count_distinct_words)?;

    let (_engine, report) = engine.launch_async().await?;
    ensure_input_consumed(report.production.as_ref())?;

    Ok(StatsSummary {
        generated_at: report.started_at.to_rfc3339(),
        lines: lines.result().context("line counter did not finish")?,
        bytes: bytes.result().context("byte counter did not finish")?,
        longest_line: longest.result().context("longest-line tracker did not finish")?,
        distinct_words: words.result().context("word counter did not finish")?,
        elapsed_ms: report.elapsed_ms,
    })
}

fn count_distinct_words(stream: &mut ChannelStream<String>) -> usize {
    let mut words = HashSet::new();
    while let Some(line) = stream.next_item() {
        for word in line.split_whitespace() {
            words.insert(word.to_string());
        }
    }
    words.len()
}

/// Compute statistics for a file or stdin
pub async fn execute_stats(
    input: Option<PathBuf>,
    depth: Option<usize>,
    json: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config.as_deref(), depth)?;
    let producer = open_input(input.as_deref())?;

    let summary = collect_stats(producer, config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let source = input
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string());
    println!("📄 入力: {source}");
    println!("📊 集計結果:");
    println!("   - 行数: {}", summary.lines);
    println!("   - バイト数: {}", summary.bytes);
    println!("   - 最長行: {}文字", summary.longest_line);
    println!("   - 異なる単語数: {}", summary.distinct_words);
    println!("   - 処理時間: {}ms", summary.elapsed_ms);
    Ok(())
}
