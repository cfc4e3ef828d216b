use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use ferrite_monitor::device::{DeviceId, HostClock, ResourceProbe};
use ferrite_monitor::report::create_run_sink;
use ferrite_monitor::{
    CrossEntropyLoss, DatasetKind, EvalAccounting, Monitor, MonitorConfig, Network, OutputFormat,
    Result, SampleCounting, Sgd, SgdConfig, Split,
};

/// Trains a classifier on one dataset and writes per-batch and per-epoch
/// performance figures to `<output-dir>/run_ferrite_<dataset>_<run-id>.csv`.
#[derive(Parser, Debug)]
#[command(name = "ferrite-monitor", version)]
struct Cli {
    /// Dataset to train on: cifar10, mnist or pascal
    dataset: String,
    /// Free-form identifier, used in the output file name
    run_id: String,
    /// Index of the device to train and profile on
    #[arg(long, env = "DEVICE")]
    device: u32,
    #[arg(long, default_value_t = 100)]
    epochs: usize,
    #[arg(long, default_value_t = 32)]
    batch_size: usize,
    /// Batches between progress lines
    #[arg(long, default_value_t = 20)]
    monitoring_interval: usize,
    #[arg(long, default_value_t = 0.001)]
    learning_rate: f64,
    #[arg(long, default_value_t = 0.9)]
    momentum: f64,
    /// Hidden layer widths of the default classifier
    #[arg(long, value_delimiter = ',', default_value = "128")]
    hidden: Vec<usize>,
    #[arg(long, default_value = "../data")]
    data_root: PathBuf,
    #[arg(long, default_value = "profiles")]
    output_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[arg(long, value_enum, default_value_t = EvalAccounting::Isolated)]
    eval_accounting: EvalAccounting,
    /// Count a short last batch as a full one (nominal) or by its size (exact)
    #[arg(long, value_enum, default_value_t = SampleCounting::Nominal)]
    sample_counting: SampleCounting,
}

#[cfg(feature = "nvml")]
fn bind_probe(device: DeviceId) -> Result<Box<dyn ResourceProbe>> {
    Ok(Box::new(ferrite_monitor::device::NvmlProbe::bind(device)?))
}

#[cfg(not(feature = "nvml"))]
fn bind_probe(device: DeviceId) -> Result<Box<dyn ResourceProbe>> {
    info!("built without nvml; probing host process for {}", device);
    Ok(Box::new(ferrite_monitor::device::HostProbe::new()?))
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Reject bad input before touching the device or the data.
    let dataset: DatasetKind = cli.dataset.parse()?;
    let device = DeviceId::new(cli.device);
    let config = MonitorConfig::new(cli.epochs, cli.batch_size, cli.monitoring_interval, device)
        .with_eval_accounting(cli.eval_accounting)
        .with_sample_counting(cli.sample_counting);
    config.validate()?;
    info!("running {} {} on {}", dataset, cli.run_id, device);

    let mut train_loader = dataset.loader(&cli.data_root, Split::Train, cli.batch_size)?;
    let mut test_loader = dataset.loader(&cli.data_root, Split::Test, cli.batch_size)?;

    let mut model = Network::classifier(
        dataset.input_features(),
        &cli.hidden,
        dataset.num_classes(),
        &mut rand::thread_rng(),
    );
    let mut optimizer = Sgd::new(SgdConfig {
        learning_rate: cli.learning_rate,
        momentum: cli.momentum,
    });

    let probe = bind_probe(device)?;
    let (path, sink) = create_run_sink(&cli.output_dir, dataset, &cli.run_id, cli.format)?;
    info!("writing metrics to {}", path.display());

    let mut monitor = Monitor::new(config, HostClock::new(), probe, sink)?;
    let report = monitor.run(
        &mut model,
        &mut train_loader,
        &mut test_loader,
        &mut optimizer,
        &CrossEntropyLoss,
    )?;

    if let Some(last) = report.epochs.last() {
        info!(
            "finished {} epochs; final eval accuracy {:.2}%",
            report.epochs.len(),
            last.eval.accuracy
        );
    }
    Ok(())
}
