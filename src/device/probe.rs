use sysinfo::{Pid, ProcessExt, System, SystemExt};

use crate::error::{MonitorError, Result};

/// Live memory and utilization readings for one bound device.
///
/// Every call is a real query; callers that want a per-batch figure call it
/// once per batch.
pub trait ResourceProbe {
    /// Memory currently in use, in megabytes.
    fn used_memory_mb(&mut self) -> Result<f64>;
    /// Utilization over the driver's most recent sample period, 0-100.
    fn utilization_percent(&mut self) -> Result<u32>;
}

impl<P: ResourceProbe + ?Sized> ResourceProbe for Box<P> {
    fn used_memory_mb(&mut self) -> Result<f64> {
        (**self).used_memory_mb()
    }

    fn utilization_percent(&mut self) -> Result<u32> {
        (**self).utilization_percent()
    }
}

/// Probe for host-executed models: resident memory and CPU share of this process.
pub struct HostProbe {
    system: System,
    pid: Pid,
    cpu_count: usize,
}

impl HostProbe {
    pub fn new() -> Result<HostProbe> {
        let pid = sysinfo::get_current_pid().map_err(|e| MonitorError::Device(e.to_string()))?;
        let mut system = System::new();
        system.refresh_cpu();
        let cpu_count = system.cpus().len().max(1);
        if !system.refresh_process(pid) {
            return Err(MonitorError::Device(format!("process {} is not visible to the probe", pid)));
        }
        Ok(HostProbe { system, pid, cpu_count })
    }

    fn refreshed(&mut self) -> Result<&sysinfo::Process> {
        if !self.system.refresh_process(self.pid) {
            return Err(MonitorError::Device(format!("lost track of process {}", self.pid)));
        }
        self.system
            .process(self.pid)
            .ok_or_else(|| MonitorError::Device(format!("lost track of process {}", self.pid)))
    }
}

impl ResourceProbe for HostProbe {
    fn used_memory_mb(&mut self) -> Result<f64> {
        let bytes = self.refreshed()?.memory();
        Ok(bytes as f64 / 1024.0 / 1024.0)
    }

    fn utilization_percent(&mut self) -> Result<u32> {
        let cpu_count = self.cpu_count as f32;
        let usage = self.refreshed()?.cpu_usage() / cpu_count;
        Ok(usage.round().clamp(0.0, 100.0) as u32)
    }
}
