use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::datasets::registry::DatasetKind;
use crate::error::Result;
use crate::report::metric::MetricLine;

/// Destination for monitoring events. Implementations flush every line so an
/// aborted run still leaves a readable trace.
pub trait MetricSink {
    fn emit(&mut self, line: &MetricLine) -> Result<()>;
}

impl<S: MetricSink + ?Sized> MetricSink for Box<S> {
    fn emit(&mut self, line: &MetricLine) -> Result<()> {
        (**self).emit(line)
    }
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn emit(&mut self, line: &MetricLine) -> Result<()> {
        (**self).emit(line)
    }
}

/// Writes the human-readable line format.
pub struct TextSink<W: Write> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        TextSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricSink for TextSink<W> {
    fn emit(&mut self, line: &MetricLine) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricSink for JsonLinesSink<W> {
    fn emit(&mut self, line: &MetricLine) -> Result<()> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "csv",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

/// `run_ferrite_<dataset>_<run_id>.<ext>`
pub fn run_file_name(dataset: DatasetKind, run_id: &str, format: OutputFormat) -> String {
    format!("run_ferrite_{}_{}.{}", dataset.name(), run_id, format.extension())
}

/// Creates `dir` if needed and opens the per-run output file inside it.
pub fn create_run_sink(
    dir: &Path,
    dataset: DatasetKind,
    run_id: &str,
    format: OutputFormat,
) -> Result<(PathBuf, Box<dyn MetricSink>)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(run_file_name(dataset, run_id, format));
    let writer = BufWriter::new(File::create(&path)?);
    let sink: Box<dyn MetricSink> = match format {
        OutputFormat::Text => Box::new(TextSink::new(writer)),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
    };
    Ok((path, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::metric::{LineKind, PhaseMetrics};

    fn line() -> MetricLine {
        MetricLine {
            epoch: 0,
            kind: LineKind::Eval,
            metrics: PhaseMetrics {
                avg_loss: 0.0,
                accuracy: 100.0,
                avg_sample_time_ms: 1.0,
                avg_used_mem_mb: 2.0,
                util_percent: 3,
                samples: 32,
                batches: 1,
            },
        }
    }

    #[test]
    fn text_sink_writes_one_line_per_event() {
        let mut sink = TextSink::new(Vec::new());
        sink.emit(&line()).unwrap();
        sink.emit(&line()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.starts_with("[EVAL] epoch: 0")));
    }

    #[test]
    fn run_file_is_flushed_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let (path, mut sink) = create_run_sink(dir.path(), DatasetKind::Mnist, "7", OutputFormat::Text).unwrap();
        assert_eq!(path.file_name().unwrap(), "run_ferrite_mnist_7.csv");

        sink.emit(&line()).unwrap();
        // Still open: the line must already be on disk.
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("accuracy: 100.000000%"));
    }

    #[test]
    fn jsonl_sink_round_trips_through_serde() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(&line()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let parsed: MetricLine = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed, line());
    }
}
