// Producer - 生産関数を回して全購読へ配信するワーカー

use super::panic_message;
use crate::channel::{Channel, Subscription};
use crate::core::{
    ObjectProducer, ProductionOutcome, ProductionReport, StreamError, StreamResult, WorkerState,
};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// 購読の既定バッファ深さ
pub const DEFAULT_CHANNEL_DEPTH: usize = 1;

type ProduceFn<P, T> = Box<dyn FnMut(&mut P) -> anyhow::Result<Option<T>> + Send>;

/// 単発のProducerワーカー
///
/// `new_channel()` で購読を登録してから `run()` か `spawn()` を一度だけ呼ぶ。
/// 生産関数が None・エラー・パニックのいずれで終わっても、全購読へ終端を
/// 一度だけ送り、その後 Producer を解放する。
pub struct ProducerWorker<P, T> {
    producer: Option<P>,
    produce: Option<ProduceFn<P, T>>,
    channel: Option<Channel<T>>,
    default_depth: usize,
    state: WorkerState,
    report: Arc<Mutex<Option<ProductionReport>>>,
}

impl<P, T> ProducerWorker<P, T>
where
    P: ObjectProducer + 'static,
    T: Clone + Send + 'static,
{
    /// None を返すとデータ終了とみなす生産関数で作成
    pub fn new<F>(producer: P, mut produce: F) -> Self
    where
        F: FnMut(&mut P) -> Option<T> + Send + 'static,
    {
        Self::fallible(producer, move |p| Ok(produce(p)))
    }

    /// 失敗しうる生産関数で作成（Err はデータ終了と同じく扱う）
    pub fn fallible<F>(producer: P, produce: F) -> Self
    where
        F: FnMut(&mut P) -> anyhow::Result<Option<T>> + Send + 'static,
    {
        Self {
            producer: Some(producer),
            produce: Some(Box::new(produce)),
            channel: Some(Channel::synchronous()),
            default_depth: DEFAULT_CHANNEL_DEPTH,
            state: WorkerState::Idle,
            report: Arc::new(Mutex::new(None)),
        }
    }

    /// new_channel() が使う既定深さを変更
    pub fn set_default_depth(&mut self, depth: usize) -> StreamResult<()> {
        if depth == 0 {
            return Err(StreamError::configuration(
                "チャンネル深さは1以上である必要があります",
            ));
        }
        self.default_depth = depth;
        Ok(())
    }

    pub fn default_depth(&self) -> usize {
        self.default_depth
    }

    /// 既定深さで配信先を1つ追加
    pub fn new_channel(&mut self) -> StreamResult<Subscription<T>> {
        self.new_channel_with_depth(self.default_depth)
    }

    /// 深さを指定して配信先を1つ追加
    pub fn new_channel_with_depth(&mut self, depth: usize) -> StreamResult<Subscription<T>> {
        let state = self.state();
        match self.channel.as_mut() {
            Some(channel) if state == WorkerState::Idle => channel.subscribe_with_depth(depth),
            _ => Err(StreamError::worker_lifecycle("producer", state)),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.as_ref().map_or(0, Channel::subscriber_count)
    }

    pub fn state(&self) -> WorkerState {
        if self.report.lock().is_some() {
            WorkerState::Done
        } else {
            self.state
        }
    }

    /// 実行結果（終了前は None）
    pub fn report(&self) -> Option<ProductionReport> {
        self.report.lock().clone()
    }

    /// 呼び出しスレッド上で生産ループを実行
    pub fn run(&mut self) -> StreamResult<ProductionReport> {
        let job = self.begin()?;
        let report = job.execute();
        Ok(report)
    }

    /// 名前付きスレッドで生産ループを開始
    ///
    /// 起動に失敗した場合、チャンネルは破棄され購読側は終端として観測する。
    pub fn spawn(&mut self, name: impl Into<String>) -> StreamResult<JoinHandle<ProductionReport>> {
        let name = name.into();
        let job = self.begin()?;
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || job.execute())
            .map_err(|source| StreamError::thread_spawn(name, source))
    }

    fn begin(&mut self) -> StreamResult<ProductionJob<P, T>> {
        let state = self.state();
        if state != WorkerState::Idle {
            return Err(StreamError::worker_lifecycle("producer", state));
        }

        let (Some(producer), Some(produce), Some(channel)) =
            (self.producer.take(), self.produce.take(), self.channel.take())
        else {
            return Err(StreamError::worker_lifecycle("producer", state));
        };

        self.state = WorkerState::Running;
        Ok(ProductionJob {
            producer,
            produce,
            channel,
            report: Arc::clone(&self.report),
        })
    }
}

/// スレッドへ移動する生産ループ一式
struct ProductionJob<P, T> {
    producer: P,
    produce: ProduceFn<P, T>,
    channel: Channel<T>,
    report: Arc<Mutex<Option<ProductionReport>>>,
}

impl<P, T> ProductionJob<P, T>
where
    P: ObjectProducer,
    T: Clone + Send,
{
    fn execute(mut self) -> ProductionReport {
        let subscribers = self.channel.subscriber_count();
        let mut items_produced = 0;
        tracing::debug!(subscribers, "producer started");

        let outcome = loop {
            let produce = &mut self.produce;
            let producer = &mut self.producer;
            let step = panic::catch_unwind(AssertUnwindSafe(|| produce(producer)));

            match step {
                Ok(Ok(Some(item))) => {
                    items_produced += 1;
                    if let Err(error) = self.channel.offer(item) {
                        break ProductionOutcome::Failed(error.to_string());
                    }
                }
                Ok(Ok(None)) => break ProductionOutcome::Exhausted,
                Ok(Err(error)) => {
                    let reason = format!("{error:#}");
                    tracing::warn!(%reason, "production function failed");
                    break ProductionOutcome::Failed(reason);
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::warn!(%message, "production function panicked");
                    break ProductionOutcome::Failed(message);
                }
            }
        };

        // 終端は全購読へ必ず一度だけ
        self.channel.close();

        // 解放の失敗やパニックはログのみ。レポートは必ず残す
        let producer = &mut self.producer;
        match panic::catch_unwind(AssertUnwindSafe(|| producer.close())) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => tracing::warn!(error = ?error, "failed to release producer"),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(%message, "producer release panicked");
            }
        }

        let report = ProductionReport {
            items_produced,
            subscribers,
            outcome,
        };
        tracing::debug!(items = report.items_produced, "producer finished");

        *self.report.lock() = Some(report.clone());
        report
    }
}
