// データ供給元
// よく使う入力をそのまま ObjectProducer として使えるようにする

pub mod iter_producer;
pub mod line_producer;

// 公開API
pub use iter_producer::IterProducer;
pub use line_producer::LineProducer;
