// Consumer - ストリームを1本受け取り結果を1つ計算するワーカー

use super::panic_message;
use crate::core::{ConsumerStatus, StreamError, StreamResult, WorkerState};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type TransformFn<S, K> = Box<dyn FnOnce(&mut S) -> anyhow::Result<K> + Send>;

/// ワーカーとハンドルで共有する結果スロット
struct OutcomeSlot<K> {
    state: WorkerState,
    outcome: Option<StreamResult<K>>,
}

impl<K> OutcomeSlot<K> {
    fn failure(&self) -> Option<String> {
        match &self.outcome {
            Some(Err(error)) => Some(error.to_string()),
            _ => None,
        }
    }
}

type SharedSlot<K> = Arc<Mutex<OutcomeSlot<K>>>;

/// 単発のConsumerワーカー
///
/// `provide()` でストリームを渡し、`run()` か `spawn()` を一度だけ呼ぶ。
/// 変換関数の失敗・パニックはこのワーカーの結果に閉じ込められ、
/// 他のConsumerや Producer には影響しない。
pub struct ConsumerWorker<S, K> {
    index: usize,
    stream: Option<S>,
    transform: Option<TransformFn<S, K>>,
    slot: SharedSlot<K>,
}

impl<S, K> ConsumerWorker<S, K>
where
    S: Send + 'static,
    K: Send + 'static,
{
    pub fn new<F>(transform: F) -> Self
    where
        F: FnOnce(&mut S) -> K + Send + 'static,
    {
        Self::fallible(move |stream| Ok(transform(stream)))
    }

    /// 失敗しうる変換関数で作成
    pub fn fallible<F>(transform: F) -> Self
    where
        F: FnOnce(&mut S) -> anyhow::Result<K> + Send + 'static,
    {
        Self {
            index: 0,
            stream: None,
            transform: Some(Box::new(transform)),
            slot: Arc::new(Mutex::new(OutcomeSlot {
                state: WorkerState::Idle,
                outcome: None,
            })),
        }
    }

    /// エンジン内での登録番号（ログとエラーに使う）
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 入力ストリームを設定（最後の呼び出しが有効）
    pub fn provide(&mut self, stream: S) -> StreamResult<()> {
        let state = self.state();
        if state != WorkerState::Idle {
            return Err(StreamError::worker_lifecycle(self.worker_name(), state));
        }
        if self.stream.replace(stream).is_some() {
            tracing::debug!(consumer = self.index, "stream replaced before run");
        }
        Ok(())
    }

    /// 設定済みのストリーム（実行開始後は None）
    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub fn state(&self) -> WorkerState {
        self.slot.lock().state
    }

    /// 結果を読むためのハンドル
    pub fn handle(&self) -> ConsumerHandle<K> {
        ConsumerHandle {
            index: self.index,
            slot: Arc::clone(&self.slot),
        }
    }

    /// 呼び出しスレッド上で変換関数を実行
    ///
    /// 変換関数の失敗はここでは返さず、結果スロットに記録される。
    /// Err になるのはライフサイクル違反の場合だけ。
    pub fn run(&mut self) -> StreamResult<()> {
        let job = self.begin()?;
        job.execute();
        Ok(())
    }

    /// 名前付きスレッドで変換関数を開始
    pub fn spawn(&mut self, name: impl Into<String>) -> StreamResult<JoinHandle<()>> {
        let name = name.into();
        let job = self.begin()?;
        let slot = Arc::clone(&self.slot);

        match thread::Builder::new()
            .name(name.clone())
            .spawn(move || job.execute())
        {
            Ok(handle) => Ok(handle),
            Err(source) => {
                // ジョブは破棄済みなのでストリームも解放されている
                let mut slot = slot.lock();
                slot.state = WorkerState::Done;
                slot.outcome = Some(Err(StreamError::thread_spawn(
                    name.clone(),
                    std::io::Error::new(source.kind(), source.to_string()),
                )));
                Err(StreamError::thread_spawn(name, source))
            }
        }
    }

    /// 成功した結果のコピー（未完了・失敗時は None）
    pub fn result(&self) -> Option<K>
    where
        K: Clone,
    {
        self.handle().result()
    }

    pub fn failure(&self) -> Option<String> {
        self.slot.lock().failure()
    }

    /// 結果を取り出す（2回目以降は None）
    pub fn take_outcome(&self) -> Option<StreamResult<K>> {
        self.slot.lock().outcome.take()
    }

    fn worker_name(&self) -> String {
        format!("consumer #{}", self.index)
    }

    fn begin(&mut self) -> StreamResult<ConsumerJob<S, K>> {
        let mut slot = self.slot.lock();
        if slot.state != WorkerState::Idle {
            return Err(StreamError::worker_lifecycle(self.worker_name(), slot.state));
        }
        let Some(transform) = self.transform.take() else {
            return Err(StreamError::worker_lifecycle(self.worker_name(), slot.state));
        };
        slot.state = WorkerState::Running;

        Ok(ConsumerJob {
            index: self.index,
            stream: self.stream.take(),
            transform,
            slot: Arc::clone(&self.slot),
        })
    }
}

/// スレッドへ移動する変換処理一式
struct ConsumerJob<S, K> {
    index: usize,
    stream: Option<S>,
    transform: TransformFn<S, K>,
    slot: SharedSlot<K>,
}

impl<S, K> ConsumerJob<S, K> {
    fn execute(self) {
        let index = self.index;
        let transform = self.transform;

        let outcome = match self.stream {
            Some(mut stream) => {
                let step = panic::catch_unwind(AssertUnwindSafe(|| transform(&mut stream)));
                // 戻った時点でストリームを手放し、Producer 側から切り離す
                drop(stream);
                match step {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(error)) => Err(StreamError::consume(index, error)),
                    Err(payload) => Err(StreamError::consumer_panicked(
                        index,
                        panic_message(payload.as_ref()),
                    )),
                }
            }
            None => Err(StreamError::missing_stream(index)),
        };

        match &outcome {
            Ok(_) => tracing::debug!(consumer = index, "consumer finished"),
            Err(error) => tracing::warn!(consumer = index, %error, "consumer failed"),
        }

        let mut slot = self.slot.lock();
        slot.state = WorkerState::Done;
        slot.outcome = Some(outcome);
    }
}

/// Consumer の結果を読むための共有ハンドル
///
/// ワーカーがスレッドへ移った後でも結果を参照できる。
pub struct ConsumerHandle<K> {
    index: usize,
    slot: SharedSlot<K>,
}

impl<K> Clone for ConsumerHandle<K> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<K> ConsumerHandle<K> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> WorkerState {
        self.slot.lock().state
    }

    pub fn is_finished(&self) -> bool {
        self.state() == WorkerState::Done
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.slot.lock().outcome, Some(Ok(_)))
    }

    pub fn result(&self) -> Option<K>
    where
        K: Clone,
    {
        match &self.slot.lock().outcome {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<String> {
        self.slot.lock().failure()
    }

    pub fn take_outcome(&self) -> Option<StreamResult<K>> {
        self.slot.lock().outcome.take()
    }
}

/// 結果型を隠した Consumer の操作面
///
/// エンジンは結果型の異なるConsumerをこのトレイト越しに一括管理する。
pub trait ConsumerTask: Send {
    fn index(&self) -> usize;

    fn state(&self) -> WorkerState;

    fn status(&self) -> ConsumerStatus;

    fn run(&mut self) -> StreamResult<()>;

    fn spawn(&mut self, name: String) -> StreamResult<JoinHandle<()>>;
}

impl<S, K> ConsumerTask for ConsumerWorker<S, K>
where
    S: Send + 'static,
    K: Send + 'static,
{
    fn index(&self) -> usize {
        self.index
    }

    fn state(&self) -> WorkerState {
        ConsumerWorker::state(self)
    }

    fn status(&self) -> ConsumerStatus {
        let slot = self.slot.lock();
        ConsumerStatus {
            index: self.index,
            state: slot.state,
            succeeded: matches!(slot.outcome, Some(Ok(_))),
            failure: slot.failure(),
        }
    }

    fn run(&mut self) -> StreamResult<()> {
        ConsumerWorker::run(self)
    }

    fn spawn(&mut self, name: String) -> StreamResult<JoinHandle<()>> {
        ConsumerWorker::spawn(self, name)
    }
}
