// バックプレッシャーと並行性の統合テスト
use crate::fixtures::{expected_items, wait_until, CountingProducer};
use fanout_stream::{Channel, ChannelStream, ObjectStream, ProducerEngine, Signal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PATIENCE: Duration = Duration::from_secs(5);
const GRACE: Duration = Duration::from_millis(20);

#[test]
fn test_depth_one_blocks_until_first_next() {
    let mut channel = Channel::new(1).unwrap();
    let mut stream = ChannelStream::new(channel.subscribe());
    let completed = Arc::new(AtomicUsize::new(0));

    let producer = {
        let completed = Arc::clone(&completed);
        thread::spawn(move || {
            for item in ["item0", "item1", "item2"] {
                channel.offer(item).unwrap();
                completed.fetch_add(1, Ordering::SeqCst);
            }
            channel.close();
        })
    };

    // 1件目だけがバッファに入り、以降の offer はブロックしている
    assert!(wait_until(PATIENCE, || completed.load(Ordering::SeqCst) == 1));
    thread::sleep(GRACE);
    assert_eq!(completed.load(Ordering::SeqCst), 1);

    // next() は1件消費して1件先読みするため、残りの offer が完了する
    assert_eq!(stream.next_item(), Some("item0"));
    assert!(wait_until(PATIENCE, || completed.load(Ordering::SeqCst) == 3));

    assert_eq!(stream.next_item(), Some("item1"));
    assert_eq!(stream.next_item(), Some("item2"));
    assert_eq!(stream.next_item(), None);
    producer.join().unwrap();
}

#[test]
fn test_slowest_consumer_sets_the_pace() {
    let producer = CountingProducer::new(10);
    let produced = producer.produced_counter();
    let mut engine = ProducerEngine::new(producer, CountingProducer::next_item);

    let fast = engine.subscribe(|stream| stream.count()).unwrap();
    let observed = Arc::clone(&produced);
    let slow = engine
        .subscribe(move |stream: &mut ChannelStream<String>| {
            // 深さ1の購読が満杯なので生産は2件で止まっている
            let reached = wait_until(PATIENCE, || observed.load(Ordering::SeqCst) == 2);
            thread::sleep(GRACE);
            let stalled_at = observed.load(Ordering::SeqCst);
            let rest = stream.count();
            (reached, stalled_at, rest)
        })
        .unwrap();

    engine.launch().unwrap();

    assert_eq!(fast.result(), Some(10));
    let (reached, stalled_at, rest) = slow.result().unwrap();
    assert!(reached);
    assert_eq!(stalled_at, 2, "producer ran ahead");
    assert_eq!(rest, 10);
}

#[test]
fn test_consumer_that_stops_early_is_detached() {
    let producer = CountingProducer::new(500);
    let releases = producer.release_counter();
    let mut engine = ProducerEngine::new(producer, CountingProducer::next_item);

    let first_only = engine
        .subscribe(|stream: &mut ChannelStream<String>| stream.next_item())
        .unwrap();
    let everything = engine
        .subscribe(|stream: &mut ChannelStream<String>| stream.collect::<Vec<_>>())
        .unwrap();

    let report = engine.launch().unwrap();

    assert_eq!(first_only.result(), Some(Some("item0".to_string())));
    assert_eq!(everything.result(), Some(expected_items(500)));
    assert!(report.is_clean());
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_raw_subscription_polling() {
    let mut channel = Channel::new(4).unwrap();
    let subscription = channel.subscribe();

    assert!(subscription.poll().is_none());
    channel.offer(7u32).unwrap();
    channel.offer(8u32).unwrap();
    assert_eq!(subscription.len(), 2);
    assert_eq!(subscription.poll(), Some(Signal::Item(7)));
    assert_eq!(
        subscription.poll_timeout(Duration::from_millis(10)),
        Some(Signal::Item(8))
    );

    channel.close();
    assert_eq!(subscription.take(), Signal::End);
}

#[test]
fn test_closed_state_is_monotonic_under_concurrency() {
    let mut channel = Channel::new(2).unwrap();
    let mut stream = ChannelStream::new(channel.subscribe());

    let producer = thread::spawn(move || {
        for i in 0..100u32 {
            channel.offer(i).unwrap();
        }
        channel.close();
    });

    let mut seen = Vec::new();
    let mut was_closed = false;
    loop {
        let closed = stream.is_closed();
        assert!(!was_closed || closed, "stream reopened");
        was_closed = closed;

        match stream.next_item() {
            Some(item) => seen.push(item),
            None => break,
        }
    }

    assert_eq!(seen, (0..100).collect::<Vec<_>>());
    assert!(stream.is_closed());
    for _ in 0..3 {
        assert_eq!(stream.next_item(), None);
    }
    producer.join().unwrap();
}
