// テスト用の Producer 実装

use fanout_stream::ObjectProducer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// "item{n}" を指定件数だけ生産し、解放回数を記録する Producer
pub struct CountingProducer {
    total: usize,
    current: usize,
    produced: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl CountingProducer {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            produced: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn next_item(&mut self) -> Option<String> {
        if self.current >= self.total {
            return None;
        }
        let item = format!("item{}", self.current);
        self.current += 1;
        self.produced.fetch_add(1, Ordering::SeqCst);
        Some(item)
    }

    /// 生産済み件数の共有カウンタ
    pub fn produced_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.produced)
    }

    /// close() 呼び出し回数の共有カウンタ
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

impl ObjectProducer for CountingProducer {
    fn close(&mut self) -> anyhow::Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 指定件数の後に失敗する Producer
pub struct FailingProducer {
    remaining: usize,
    releases: Arc<AtomicUsize>,
}

impl FailingProducer {
    pub fn after(items: usize) -> Self {
        Self {
            remaining: items,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn next_item(&mut self) -> anyhow::Result<Option<u64>> {
        if self.remaining == 0 {
            anyhow::bail!("upstream connection reset");
        }
        self.remaining -= 1;
        Ok(Some(self.remaining as u64))
    }

    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

impl ObjectProducer for FailingProducer {
    fn close(&mut self) -> anyhow::Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("release after failure also failed")
    }
}
