// 高レベル公開API
// ProducerEngineを簡単に使用できるようにするための便利な関数

use super::ProducerEngine;
use crate::{
    core::ObjectProducer,
    services::{IterProducer, NoOpLaunchObserver, TracingLaunchObserver},
};

/// ProducerEngine作成のヘルパー関数
///
/// デフォルト設定・tracing への進行出力付き
pub fn create_default_engine<P, T, F>(producer: P, produce: F) -> ProducerEngine<P, T>
where
    P: ObjectProducer + 'static,
    T: Clone + Send + 'static,
    F: FnMut(&mut P) -> Option<T> + Send + 'static,
{
    ProducerEngine::new(producer, produce).with_observer(TracingLaunchObserver::new())
}

/// ProducerEngine作成のヘルパー関数（静音版）
///
/// テストやバックグラウンド処理用
pub fn create_quiet_engine<P, T, F>(producer: P, produce: F) -> ProducerEngine<P, T>
where
    P: ObjectProducer + 'static,
    T: Clone + Send + 'static,
    F: FnMut(&mut P) -> Option<T> + Send + 'static,
{
    ProducerEngine::new(producer, produce).with_observer(NoOpLaunchObserver::new())
}

/// メモリ上のアイテム列を全Consumerへ配る静音エンジン
pub fn fan_out_iter<I>(items: I) -> ProducerEngine<IterProducer<I::IntoIter>, I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Clone + Send + 'static,
{
    create_quiet_engine(IterProducer::new(items), IterProducer::next_item)
}
