// Stream - 単一Consumer向けのブロッキングカーソル
// 終端信号を呼び出し側から隠し、1件先読みを提供する

mod iter_source;

pub use iter_source::{iter_stream, IterSource};

use crate::channel::Subscription;
use crate::core::{ItemSource, ObjectStream, Signal};
use std::iter::FusedIterator;

/// 購読1つを包む遅延初期化ストリーム
///
/// 状態遷移: 未初期化 → (最初の取得) → 開 / 閉 → … → 閉。
/// 閉は終端状態で、以降 `next_item()` はブロックせず常に None を返す。
///
/// `next_item()` は現在のアイテムを返すと同時に次の信号を1件だけ先読みする。
/// そのため最後のアイテムを消費した時点で `is_closed()` は既に true になる。
pub struct ChannelStream<T, S = Subscription<T>> {
    source: Option<S>,
    lookahead: Option<T>,
    initialized: bool,
    closed: bool,
}

impl<T, S> ChannelStream<T, S>
where
    T: Send + 'static,
    S: ItemSource<T>,
{
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            lookahead: None,
            initialized: false,
            closed: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&mut self) {
        if !self.initialized {
            self.initialized = true;
            self.lookahead = self.pull();
        }
    }

    fn pull(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }

        let signal = match self.source.as_mut() {
            Some(source) => source.pull(),
            None => Signal::End,
        };

        match signal {
            Signal::Item(item) => Some(item),
            Signal::End => {
                self.closed = true;
                None
            }
        }
    }

    fn release(&mut self) {
        if self.source.take().is_some() {
            tracing::trace!(closed = self.closed, "stream released");
        }
    }
}

impl<T, S> ObjectStream<T> for ChannelStream<T, S>
where
    T: Send + 'static,
    S: ItemSource<T>,
{
    fn next_item(&mut self) -> Option<T> {
        self.ensure_initialized();
        let current = self.lookahead.take()?;
        self.lookahead = self.pull();
        Some(current)
    }

    /// 最初の呼び出しだけは `next_item()` と同じく初期化のためにブロックしうる
    fn peek_next(&mut self) -> Option<&T> {
        self.ensure_initialized();
        self.lookahead.as_ref()
    }

    fn has_next(&self) -> bool {
        !self.initialized || self.lookahead.is_some()
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn close(&mut self) {
        self.initialized = true;
        self.closed = true;
        self.lookahead = None;
        self.release();
    }
}

impl<T, S> Iterator for ChannelStream<T, S>
where
    T: Send + 'static,
    S: ItemSource<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.next_item()
    }
}

impl<T, S> FusedIterator for ChannelStream<T, S>
where
    T: Send + 'static,
    S: ItemSource<T>,
{
}

impl<T, S> Drop for ChannelStream<T, S> {
    fn drop(&mut self) {
        // 解放処理は後始末の経路で走るため、何があっても伝播させない
        if self.source.take().is_some() {
            tracing::trace!("stream dropped");
        }
    }
}
