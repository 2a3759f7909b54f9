// Channel - 有界ブロードキャストチャンネル
// 1つの生産系列を全購読者に同じ順序で配信する

mod subscription;

pub use subscription::Subscription;

use crate::core::{Signal, StreamError, StreamResult};
use crossbeam_channel::{bounded, Select, Sender};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// 1購読分の送信口
struct Lane<T> {
    tx: Sender<Signal<T>>,
    attached: Weak<()>,
}

impl<T> Lane<T> {
    fn is_attached(&self) -> bool {
        self.attached.strong_count() > 0
    }
}

/// 有界マルチコンシューマ・ブロードキャストチャンネル
///
/// 購読ごとに独立したキューを持ち、最も遅い購読者が生産ペースを決める。
/// 購読の登録は `&mut self` を要するため、生産スレッドへ移動した後に
/// 購読者が増えることはない。
///
/// `try_offer` と `offer_timeout` は全購読に空きがある場合だけ配信する
/// （全員に届くか誰にも届かないか）。
pub struct Channel<T> {
    depth: usize,
    lanes: Vec<Lane<T>>,
    closed: bool,
}

impl<T> Channel<T>
where
    T: Clone + Send,
{
    /// 指定した既定深さでチャンネルを作成（depth >= 1）
    pub fn new(depth: usize) -> StreamResult<Self> {
        validate_depth(depth)?;
        Ok(Self {
            depth,
            lanes: Vec::new(),
            closed: false,
        })
    }

    /// 深さ1（完全な同期受け渡し）のチャンネル
    pub fn synchronous() -> Self {
        Self {
            depth: 1,
            lanes: Vec::new(),
            closed: false,
        }
    }

    /// 既定深さで購読を追加
    ///
    /// 購読前に送信されたアイテムは受け取れない
    pub fn subscribe(&mut self) -> Subscription<T> {
        self.register(self.depth)
    }

    /// 深さを指定して購読を追加
    pub fn subscribe_with_depth(&mut self, depth: usize) -> StreamResult<Subscription<T>> {
        validate_depth(depth)?;
        Ok(self.register(depth))
    }

    fn register(&mut self, depth: usize) -> Subscription<T> {
        let (tx, rx) = bounded(depth);
        let attached = Arc::new(());
        self.lanes.push(Lane {
            tx,
            attached: Arc::downgrade(&attached),
        });
        tracing::trace!(subscribers = self.lanes.len(), depth, "subscription registered");
        Subscription::new(attached, rx, depth)
    }

    /// 全購読者へアイテムを配信（満杯の購読があればブロック）
    ///
    /// 受信側が破棄された購読は取り除く。配信できた購読数を返す。
    pub fn offer(&mut self, item: T) -> StreamResult<usize> {
        self.ensure_open()?;
        Ok(self.deliver(item))
    }

    /// 待たずに配信を試みる
    ///
    /// いずれかの購読が満杯なら誰にも配信せず `Ok(false)` を返す。
    pub fn try_offer(&mut self, item: T) -> StreamResult<bool> {
        self.ensure_open()?;
        self.detach_dropped();
        if self.lanes.iter().any(|lane| lane.tx.is_full()) {
            return Ok(false);
        }
        self.deliver(item);
        Ok(true)
    }

    /// 全購読に空きができるまで最大 `timeout` 待って配信する
    ///
    /// 期限内に空かなければ誰にも配信せず `Ok(false)` を返す。
    pub fn offer_timeout(&mut self, item: T, timeout: Duration) -> StreamResult<bool> {
        self.ensure_open()?;
        let deadline = Instant::now() + timeout;

        loop {
            self.detach_dropped();
            let full = self.lanes.iter().position(|lane| lane.tx.is_full());
            let Some(index) = full else {
                self.deliver(item);
                return Ok(true);
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }

            // 空きか切断で起床する
            let mut select = Select::new();
            select.send(&self.lanes[index].tx);
            if select.ready_timeout(remaining).is_err() {
                return Ok(false);
            }
        }
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.closed {
            return Err(StreamError::ChannelClosed);
        }
        Ok(())
    }

    fn deliver(&mut self, item: T) -> usize {
        let count = self.lanes.len();
        let mut item = Some(item);
        let mut delivered = 0;
        let mut detached = Vec::new();

        for (index, lane) in self.lanes.iter().enumerate() {
            // 最後の購読者にはクローンせず所有権ごと渡す
            let payload = if index + 1 == count {
                item.take()
            } else {
                item.clone()
            };
            let Some(payload) = payload else { break };

            match lane.tx.send(Signal::Item(payload)) {
                Ok(()) => delivered += 1,
                Err(_) => detached.push(index),
            }
        }

        self.prune(&detached);
        delivered
    }

    /// 全購読者へ終端を一度だけ配信する（冪等）
    ///
    /// 通知できた購読数を返す。2回目以降は 0。
    pub fn close(&mut self) -> usize {
        if self.closed {
            return 0;
        }
        self.closed = true;

        let notified = self
            .lanes
            .iter()
            .filter(|lane| lane.tx.send(Signal::End).is_ok())
            .count();
        self.lanes.clear();

        tracing::trace!(notified, "channel closed");
        notified
    }

    fn prune(&mut self, detached: &[usize]) {
        for &index in detached.iter().rev() {
            self.lanes.remove(index);
            tracing::debug!(
                subscription = index,
                remaining = self.lanes.len(),
                "subscription dropped by consumer, detaching"
            );
        }
    }

    fn detach_dropped(&mut self) {
        let detached: Vec<usize> = self
            .lanes
            .iter()
            .enumerate()
            .filter(|(_, lane)| !lane.is_attached())
            .map(|(index, _)| index)
            .collect();
        self.prune(&detached);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn validate_depth(depth: usize) -> StreamResult<()> {
    if depth == 0 {
        return Err(StreamError::configuration(
            "チャンネル深さは1以上である必要があります",
        ));
    }
    Ok(())
}
