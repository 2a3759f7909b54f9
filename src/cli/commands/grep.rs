use super::{ensure_input_consumed, open_input, resolve_config};
use crate::{
    core::ObjectStream,
    engine::ConsumerHandle,
    services::{DefaultEngineConfig, LineProducer, TracingLaunchObserver},
    stream::ChannelStream,
    ProducerEngine,
};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::PathBuf;

/// パターンごとの一致行数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCount {
    pub pattern: String,
    pub matching_lines: usize,
}

/// パターンごとに1つのConsumerを立て、入力は1回だけ読む
pub async fn count_matches<R>(
    producer: LineProducer<R>,
    patterns: &[String],
    ignore_case: bool,
    config: DefaultEngineConfig,
) -> Result<Vec<PatternCount>>
where
    R: BufRead + Send + 'static,
{
    let mut engine = ProducerEngine::fallible(producer, LineProducer::next_line)
        .with_config(config)?
        .with_observer(TracingLaunchObserver::quiet());

    let handles = patterns
        .iter()
        .map(|pattern| {
            let needle = if ignore_case {
                pattern.to_lowercase()
            } else {
                pattern.clone()
            };
            engine.subscribe(move |stream: &mut ChannelStream<String>| {
                let mut matching = 0;
                while let Some(line) = stream.next_item() {
                    let hit = if ignore_case {
                        line.to_lowercase().contains(&needle)
                    } else {
                        line.contains(&needle)
                    };
                    if hit {
                        matching += 1;
                    }
                }
                matching
            })
        })
        .collect::<Result<Vec<ConsumerHandle<usize>>, _>>()?;

    let (_engine, report) = engine.launch_async().await?;
    ensure_input_consumed(report.production.as_ref())?;

    patterns
        .iter()
        .zip(handles)
        .map(|(pattern, handle)| {
            let matching_lines = handle
                .result()
                .with_context(|| format!("matcher for '{pattern}' did not finish"))?;
            Ok(PatternCount {
                pattern: pattern.clone(),
                matching_lines,
            })
        })
        .collect()
}

/// Count matching lines for each pattern
pub async fn execute_grep(
    patterns: Vec<String>,
    input: Option<PathBuf>,
    depth: Option<usize>,
    ignore_case: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config.as_deref(), depth)?;
    let producer = open_input(input.as_deref())?;

    let counts = count_matches(producer, &patterns, ignore_case, config).await?;

    println!("🔍 {}個のパターンを同時に検索しました", counts.len());
    for count in counts {
        println!("{}\t{}", count.matching_lines, count.pattern);
    }
    Ok(())
}
