// メモリ上のデータを供給する Producer

use crate::core::ObjectProducer;

/// イテレータを ObjectProducer として使う
pub struct IterProducer<I> {
    iter: Option<I>,
}

impl<I> IterProducer<I>
where
    I: Iterator + Send,
{
    pub fn new<C>(items: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: Some(items.into_iter()),
        }
    }

    pub fn next_item(&mut self) -> Option<I::Item> {
        self.iter.as_mut()?.next()
    }
}

impl<I> ObjectProducer for IterProducer<I>
where
    I: Iterator + Send,
{
    fn close(&mut self) -> anyhow::Result<()> {
        self.iter = None;
        Ok(())
    }
}
