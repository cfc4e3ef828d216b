use std::time::{Duration, Instant};

use crate::error::{MonitorError, Result};

/// Times a bounded span of device work.
///
/// `elapsed_ms` must not return until the work issued between `start` and
/// `stop` has actually finished on the device.
pub trait DeviceClock {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    /// Milliseconds between the last `start`/`stop` pair.
    fn elapsed_ms(&mut self) -> Result<f64>;
}

impl<C: DeviceClock + ?Sized> DeviceClock for Box<C> {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn elapsed_ms(&mut self) -> Result<f64> {
        (**self).elapsed_ms()
    }
}

/// Wall clock for models that execute synchronously on the host.
///
/// Host work has completed by the time `stop` is called, so `stop` itself is
/// the synchronization point.
#[derive(Debug, Default)]
pub struct HostClock {
    started: Option<Instant>,
    span: Option<Duration>,
}

impl HostClock {
    pub fn new() -> HostClock {
        HostClock::default()
    }
}

impl DeviceClock for HostClock {
    fn start(&mut self) -> Result<()> {
        self.span = None;
        self.started = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let started = self
            .started
            .take()
            .ok_or_else(|| MonitorError::Device("clock stopped before it was started".into()))?;
        self.span = Some(started.elapsed());
        Ok(())
    }

    fn elapsed_ms(&mut self) -> Result<f64> {
        self.span
            .map(|d| d.as_secs_f64() * 1000.0)
            .ok_or_else(|| MonitorError::Device("elapsed time requested for an unfinished span".into()))
    }
}
