pub mod accumulator;
pub mod epoch_stats;
pub mod eval_scope;
pub mod loop_fn;
pub mod train_config;

pub use accumulator::{Accumulator, BatchObservation, Phase};
pub use epoch_stats::{EpochStats, RunReport};
pub use eval_scope::EvalScope;
pub use loop_fn::Monitor;
pub use train_config::{EvalAccounting, MonitorConfig, SampleCounting};
