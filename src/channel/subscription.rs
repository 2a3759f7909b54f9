// Subscription - 購読側ハンドル

use crate::core::{ItemSource, Signal};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// 1購読分の受信キュー
///
/// 送信側が消えた（切断された）場合は全操作で `Signal::End` を返す。
/// 待機の中断はデータ無しと同じ扱いで、エラーにはならない。
pub struct Subscription<T> {
    // rx より先に破棄される
    _attached: Arc<()>,
    rx: Receiver<Signal<T>>,
    depth: usize,
}

impl<T> Subscription<T> {
    pub(crate) fn new(attached: Arc<()>, rx: Receiver<Signal<T>>, depth: usize) -> Self {
        Self {
            _attached: attached,
            rx,
            depth,
        }
    }

    /// 次の信号をブロッキングで取得
    pub fn take(&self) -> Signal<T> {
        self.rx.recv().unwrap_or(Signal::End)
    }

    /// 次の信号を待たずに取得（空なら None）
    pub fn poll(&self) -> Option<Signal<T>> {
        match self.rx.try_recv() {
            Ok(signal) => Some(signal),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Signal::End),
        }
    }

    /// タイムアウト付きで次の信号を取得
    pub fn poll_timeout(&self, timeout: Duration) -> Option<Signal<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(signal) => Some(signal),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Signal::End),
        }
    }

    /// バッファ済みの信号を破棄し、破棄した件数を返す
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.depth
    }
}

impl<T: Send + 'static> ItemSource<T> for Subscription<T> {
    fn pull(&mut self) -> Signal<T> {
        self.take()
    }
}
