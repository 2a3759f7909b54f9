// fanout_stream - 1つの生産系列を複数のConsumerへ配るストリーミングエンジン

pub mod channel;
pub mod cli;
pub mod core;
pub mod engine;
pub mod services;
pub mod stream;

#[cfg(test)]
mod testing;

// 公開API
pub use crate::channel::{Channel, Subscription};
pub use crate::core::{
    ConsumerStatus, EngineConfig, ErrorContext, ErrorSeverity, ItemSource, LaunchObserver,
    LaunchReport, ObjectProducer, ObjectStream, ProductionOutcome, ProductionReport, Signal,
    StreamError, StreamResult, WorkerState,
};
pub use crate::engine::{
    create_default_engine, create_quiet_engine, fan_out_iter, ConsumerHandle, ConsumerTask,
    ConsumerWorker, ProducerEngine, ProducerWorker, DEFAULT_CHANNEL_DEPTH,
};
pub use crate::services::{
    DefaultEngineConfig, IterProducer, LineProducer, NoOpLaunchObserver, TracingLaunchObserver,
};
pub use crate::stream::{iter_stream, ChannelStream, IterSource};
