// ProducerEngine - 1つのProducerと複数のConsumerを束ねるファンアウトエンジン
// 依存関係（設定・監視・ストリーム生成）はビルダーで注入する

use super::consumer::{ConsumerHandle, ConsumerTask, ConsumerWorker};
use super::producer::ProducerWorker;
use crate::{
    channel::Subscription,
    core::{
        EngineConfig, LaunchObserver, LaunchReport, ObjectProducer, ProductionReport, StreamError,
        StreamResult,
    },
    services::{DefaultEngineConfig, NoOpLaunchObserver},
    stream::ChannelStream,
};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// 購読からConsumer用ストリームを作る関数
pub type StreamFactory<T, S> = Box<dyn Fn(Subscription<T>) -> S + Send>;

/// ファンアウト型ストリーミングエンジン
///
/// 登録された全Consumerは、Producerが生産したアイテムを同じ順序で
/// 全件受け取る。`launch()` は全ワーカーの合流後に戻り、一度しか呼べない。
///
/// ```no_run
/// use fanout_stream::{ObjectProducer, ObjectStream, ProducerEngine};
///
/// struct Counter(u32);
/// impl ObjectProducer for Counter {}
///
/// let mut engine = ProducerEngine::new(Counter(0), |c: &mut Counter| {
///     c.0 += 1;
///     (c.0 <= 3).then_some(c.0)
/// });
/// let sum = engine
///     .subscribe(|stream| {
///         let mut sum = 0;
///         while let Some(n) = stream.next_item() {
///             sum += n;
///         }
///         sum
///     })
///     .unwrap();
/// engine.launch().unwrap();
/// assert_eq!(sum.result(), Some(6));
/// ```
pub struct ProducerEngine<P, T, S = ChannelStream<T>> {
    producer: ProducerWorker<P, T>,
    consumers: Vec<Box<dyn ConsumerTask>>,
    stream_factory: StreamFactory<T, S>,
    config: Box<dyn EngineConfig>,
    observer: Arc<dyn LaunchObserver>,
    launched: bool,
}

impl<P, T> ProducerEngine<P, T, ChannelStream<T>>
where
    P: ObjectProducer + 'static,
    T: Clone + Send + 'static,
{
    /// None を返すとデータ終了とみなす生産関数でエンジンを作成
    pub fn new<F>(producer: P, produce: F) -> Self
    where
        F: FnMut(&mut P) -> Option<T> + Send + 'static,
    {
        Self::from_worker(
            ProducerWorker::new(producer, produce),
            Box::new(ChannelStream::<T, Subscription<T>>::new),
        )
    }

    /// 失敗しうる生産関数でエンジンを作成
    pub fn fallible<F>(producer: P, produce: F) -> Self
    where
        F: FnMut(&mut P) -> anyhow::Result<Option<T>> + Send + 'static,
    {
        Self::from_worker(
            ProducerWorker::fallible(producer, produce),
            Box::new(ChannelStream::<T, Subscription<T>>::new),
        )
    }
}

impl<P, T, S> ProducerEngine<P, T, S>
where
    P: ObjectProducer + 'static,
    T: Clone + Send + 'static,
    S: Send + 'static,
{
    /// 購読を任意のストリーム型へ包むエンジンを作成
    pub fn with_stream_factory<F, G>(producer: P, produce: F, factory: G) -> Self
    where
        F: FnMut(&mut P) -> Option<T> + Send + 'static,
        G: Fn(Subscription<T>) -> S + Send + 'static,
    {
        Self::from_worker(ProducerWorker::new(producer, produce), Box::new(factory))
    }

    fn from_worker(producer: ProducerWorker<P, T>, stream_factory: StreamFactory<T, S>) -> Self {
        Self {
            producer,
            consumers: Vec::new(),
            stream_factory,
            config: Box::new(DefaultEngineConfig::default()),
            observer: Arc::new(NoOpLaunchObserver),
            launched: false,
        }
    }

    /// 設定を注入（以降に登録するConsumerへ適用）
    pub fn with_config<C>(mut self, config: C) -> StreamResult<Self>
    where
        C: EngineConfig + 'static,
    {
        self.producer.set_default_depth(config.channel_depth())?;
        self.config = Box::new(config);
        Ok(self)
    }

    /// 進行状況の通知先を注入
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: LaunchObserver + 'static,
    {
        self.observer = Arc::new(observer);
        self
    }

    /// Consumerを登録し、結果ハンドルを返す
    ///
    /// 購読は登録時点で作られるため、生産開始前の全アイテムを受け取れる。
    pub fn subscribe<K, F>(&mut self, transform: F) -> StreamResult<ConsumerHandle<K>>
    where
        K: Send + 'static,
        F: FnOnce(&mut S) -> K + Send + 'static,
    {
        self.register(ConsumerWorker::new(transform))
    }

    /// 失敗しうる変換関数でConsumerを登録
    pub fn try_subscribe<K, F>(&mut self, transform: F) -> StreamResult<ConsumerHandle<K>>
    where
        K: Send + 'static,
        F: FnOnce(&mut S) -> anyhow::Result<K> + Send + 'static,
    {
        self.register(ConsumerWorker::fallible(transform))
    }

    fn register<K>(&mut self, worker: ConsumerWorker<S, K>) -> StreamResult<ConsumerHandle<K>>
    where
        K: Send + 'static,
    {
        if self.launched {
            return Err(StreamError::AlreadyLaunched);
        }

        let subscription = self.producer.new_channel()?;
        let mut worker = worker.with_index(self.consumers.len());
        worker.provide((self.stream_factory)(subscription))?;

        let handle = worker.handle();
        tracing::debug!(consumer = handle.index(), "consumer registered");
        self.consumers.push(Box::new(worker));
        Ok(handle)
    }

    /// 全Consumerを起動してからProducerを起動し、全員の終了を待つ
    ///
    /// 個々のワーカーの失敗は戻り値の `LaunchReport` に集計される。
    /// Err になるのは二重起動の場合だけ。
    pub fn launch(&mut self) -> StreamResult<LaunchReport> {
        if self.launched {
            return Err(StreamError::AlreadyLaunched);
        }
        self.launched = true;

        let started_at = chrono::Utc::now();
        let timer = Instant::now();
        let prefix = self.config.thread_name_prefix();

        self.observer.on_launch(self.consumers.len());
        tracing::info!(consumers = self.consumers.len(), "launching fan-out engine");

        let consumer_threads: Vec<JoinHandle<()>> = self
            .consumers
            .iter_mut()
            .filter_map(|consumer| {
                let name = format!("{prefix}-consumer-{}", consumer.index());
                consumer
                    .spawn(name)
                    .inspect_err(|error| tracing::error!(%error, "failed to start consumer"))
                    .ok()
            })
            .collect();

        let production = match self.producer.spawn(format!("{prefix}-producer")) {
            Ok(thread) => match thread.join() {
                Ok(report) => Some(report),
                Err(_) => {
                    tracing::error!("producer thread terminated abnormally");
                    None
                }
            },
            Err(error) => {
                tracing::error!(%error, "failed to start producer");
                None
            }
        };
        if let Some(report) = &production {
            self.observer.on_production_finished(report);
        }

        for thread in consumer_threads {
            if thread.join().is_err() {
                tracing::error!("consumer thread terminated abnormally");
            }
        }

        let mut consumers_succeeded = 0;
        for consumer in &self.consumers {
            let status = consumer.status();
            if status.succeeded {
                consumers_succeeded += 1;
            }
            self.observer.on_consumer_finished(&status);
        }

        let report = LaunchReport {
            started_at,
            consumers_launched: self.consumers.len(),
            consumers_succeeded,
            consumers_failed: self.consumers.len() - consumers_succeeded,
            production,
            elapsed_ms: timer.elapsed().as_millis() as u64,
        };

        tracing::info!(
            succeeded = report.consumers_succeeded,
            failed = report.consumers_failed,
            elapsed_ms = report.elapsed_ms,
            "fan-out engine completed"
        );
        self.observer.on_completed(&report);
        Ok(report)
    }

    /// 非同期コンテキストから起動（ブロッキングスレッドで launch を実行）
    pub async fn launch_async(mut self) -> StreamResult<(Self, LaunchReport)> {
        tokio::task::spawn_blocking(move || -> StreamResult<(Self, LaunchReport)> {
            let report = self.launch()?;
            Ok((self, report))
        })
        .await?
    }

    /// 登録順のConsumer一覧
    pub fn consumers(&self) -> &[Box<dyn ConsumerTask>] {
        &self.consumers
    }

    /// 登録番号でConsumerを取得
    pub fn consumer(&self, index: usize) -> StreamResult<&dyn ConsumerTask> {
        self.consumers
            .get(index)
            .map(|consumer| consumer.as_ref())
            .ok_or_else(|| StreamError::index_out_of_bounds(index, self.consumers.len()))
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Producerの実行結果（launch 完了前は None）
    pub fn producer_report(&self) -> Option<ProductionReport> {
        self.producer.report()
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn config(&self) -> &dyn EngineConfig {
        self.config.as_ref()
    }
}
