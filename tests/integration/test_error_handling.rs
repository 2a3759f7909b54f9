// エラーハンドリングの統合テスト
use crate::fixtures::{concat_items, CountingProducer, FailingProducer};
use fanout_stream::{
    ChannelStream, ConsumerWorker, ErrorSeverity, ObjectProducer, ObjectStream, ProducerEngine,
    ProductionOutcome, StreamError, WorkerState,
};
use std::sync::atomic::Ordering;

#[test]
fn test_production_failure_terminates_every_consumer() {
    let producer = FailingProducer::after(3);
    let releases = producer.release_counter();
    let mut engine = ProducerEngine::fallible(producer, FailingProducer::next_item);

    let collected = engine
        .subscribe(|stream: &mut ChannelStream<u64>| stream.collect::<Vec<_>>())
        .unwrap();
    let counted = engine.subscribe(|stream| stream.count()).unwrap();

    let report = engine.launch().unwrap();

    // 失敗前のアイテムは届き、その後は終端になる
    assert_eq!(collected.result(), Some(vec![2, 1, 0]));
    assert_eq!(counted.result(), Some(3));

    let production = report.production.clone().unwrap();
    assert_eq!(production.items_produced, 3);
    assert_eq!(
        production.outcome,
        ProductionOutcome::Failed("upstream connection reset".to_string())
    );
    assert!(!report.is_clean());
    // 解放の失敗はログのみで、解放自体は1回
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_consumer_failures_are_isolated() {
    let mut engine = ProducerEngine::new(CountingProducer::new(50), CountingProducer::next_item);

    let failing = engine
        .try_subscribe(|stream: &mut ChannelStream<String>| -> anyhow::Result<String> {
            let first = stream.next_item().unwrap_or_default();
            anyhow::bail!("rejected {first}")
        })
        .unwrap();
    let panicking = engine
        .subscribe(|stream: &mut ChannelStream<String>| -> usize {
            let _ = stream.next_item();
            let _ = stream.next_item();
            panic!("index out of range")
        })
        .unwrap();
    let healthy = engine.subscribe(|stream| stream.count()).unwrap();

    let report = engine.launch().unwrap();

    assert_eq!(healthy.result(), Some(50));
    assert_eq!(report.consumers_failed, 2);
    assert_eq!(report.consumers_succeeded, 1);

    assert!(failing.result().is_none());
    assert_eq!(
        failing.failure().as_deref(),
        Some("消費エラー: consumer #0 - rejected item0")
    );

    let error = panicking.take_outcome().unwrap().unwrap_err();
    assert!(matches!(error, StreamError::ConsumerPanicked { consumer: 1, .. }));
    assert!(error.to_string().contains("index out of range"));
    assert_eq!(error.severity(), ErrorSeverity::High);
}

#[test]
fn test_engine_rejects_second_launch_and_late_subscribe() {
    let mut engine = ProducerEngine::new(CountingProducer::new(1), CountingProducer::next_item);
    engine.subscribe(concat_items).unwrap();
    engine.launch().unwrap();

    let error = engine.launch().unwrap_err();
    assert!(matches!(error, StreamError::AlreadyLaunched));
    assert!(!error.is_recoverable());
    assert!(engine.subscribe(concat_items).is_err());
}

#[test]
fn test_consumer_lookup_out_of_bounds() {
    let mut engine = ProducerEngine::new(CountingProducer::new(1), CountingProducer::next_item);
    engine.subscribe(concat_items).unwrap();

    let error = engine.consumer(5).err().unwrap();
    assert!(matches!(
        error,
        StreamError::ConsumerIndexOutOfBounds { index: 5, len: 1 }
    ));
    assert_eq!(engine.consumer(0).unwrap().state(), WorkerState::Idle);
}

#[test]
fn test_consumer_without_stream_reports_missing_stream() {
    let mut worker = ConsumerWorker::<ChannelStream<String>, String>::new(concat_items);
    worker.run().unwrap();

    assert!(worker.result().is_none());
    let error = worker.take_outcome().unwrap().unwrap_err();
    assert!(matches!(error, StreamError::MissingStream { consumer: 0 }));
    assert!(worker.take_outcome().is_none());
}

#[test]
fn test_zero_depth_configuration_is_rejected() {
    let result = ProducerEngine::new(CountingProducer::new(1), CountingProducer::next_item)
        .with_config(fanout_stream::DefaultEngineConfig::new().with_channel_depth(0));

    let error = result.err().unwrap();
    assert!(matches!(error, StreamError::Configuration { .. }));
    assert!(error.context().suggestion.is_some());
}

struct ExplodingRelease {
    remaining: u32,
}

impl ObjectProducer for ExplodingRelease {
    fn close(&mut self) -> anyhow::Result<()> {
        panic!("release exploded")
    }
}

#[test]
fn test_release_panic_keeps_production_report() {
    let mut engine = ProducerEngine::new(ExplodingRelease { remaining: 2 }, |p| {
        (p.remaining > 0).then(|| {
            p.remaining -= 1;
            p.remaining
        })
    });
    let counted = engine.subscribe(|stream| stream.count()).unwrap();

    let report = engine.launch().unwrap();

    assert_eq!(counted.result(), Some(2));
    let production = report.production.clone().unwrap();
    assert_eq!(production.items_produced, 2);
    assert_eq!(production.outcome, ProductionOutcome::Exhausted);
    assert!(report.is_clean());
    assert_eq!(engine.producer_report(), Some(production));
}
