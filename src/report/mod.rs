pub mod metric;
pub mod sink;

pub use metric::{LineKind, MetricLine, PhaseMetrics};
pub use sink::{create_run_sink, run_file_name, JsonLinesSink, MetricSink, OutputFormat, TextSink};
