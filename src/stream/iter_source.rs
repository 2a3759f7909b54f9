// IterSource - イテレータを信号源として扱うアダプタ
// スレッドやチャンネル無しで変換関数を検証・再利用するために使う

use super::ChannelStream;
use crate::core::{ItemSource, Signal};

/// 任意のイテレータを `ItemSource` にする
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> ItemSource<I::Item> for IterSource<I>
where
    I: Iterator + Send,
    I::Item: Send + 'static,
{
    fn pull(&mut self) -> Signal<I::Item> {
        self.iter.next().map_or(Signal::End, Signal::Item)
    }
}

/// メモリ上のアイテム列からストリームを作る
pub fn iter_stream<I>(items: I) -> ChannelStream<I::Item, IterSource<I::IntoIter>>
where
    I: IntoIterator,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    ChannelStream::new(IterSource::new(items.into_iter()))
}
