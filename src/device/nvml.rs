use nvml_wrapper::{Device, Nvml};

use crate::device::device_id::DeviceId;
use crate::device::probe::ResourceProbe;
use crate::error::{MonitorError, Result};

/// NVML-backed probe for one NVIDIA GPU.
///
/// The handle is validated once in `bind`; each query then re-resolves it by
/// index because NVML device handles borrow the library instance.
pub struct NvmlProbe {
    nvml: Nvml,
    device: DeviceId,
}

fn driver_error(e: nvml_wrapper::error::NvmlError) -> MonitorError {
    MonitorError::Device(format!("nvml: {}", e))
}

impl NvmlProbe {
    pub fn bind(device: DeviceId) -> Result<NvmlProbe> {
        let nvml = Nvml::init().map_err(driver_error)?;
        let name = nvml
            .device_by_index(device.index())
            .and_then(|d| d.name())
            .map_err(driver_error)?;
        log::info!("bound {} ({})", device, name);
        Ok(NvmlProbe { nvml, device })
    }

    fn handle(&self) -> Result<Device<'_>> {
        self.nvml.device_by_index(self.device.index()).map_err(driver_error)
    }
}

impl ResourceProbe for NvmlProbe {
    fn used_memory_mb(&mut self) -> Result<f64> {
        let info = self.handle()?.memory_info().map_err(driver_error)?;
        Ok(info.used as f64 / 1024.0 / 1024.0)
    }

    fn utilization_percent(&mut self) -> Result<u32> {
        let rates = self.handle()?.utilization_rates().map_err(driver_error)?;
        Ok(rates.gpu)
    }
}
