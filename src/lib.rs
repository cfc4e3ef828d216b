pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod device;
pub mod data;
pub mod datasets;
pub mod report;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use network::{Mode, Model, Network};
pub use loss::{Criterion, CrossEntropyLoss};
pub use optim::{Optimizer, Sgd, SgdConfig};
pub use device::{DeviceClock, DeviceId, HostClock, HostProbe, ResourceProbe};
pub use data::{Batch, DataLoader, DataSource, Dataset};
pub use datasets::{DatasetKind, Split};
pub use report::{MetricLine, MetricSink, OutputFormat, TextSink};
pub use train::{EpochStats, EvalAccounting, Monitor, MonitorConfig, RunReport, SampleCounting};
pub use error::{MonitorError, Result};
