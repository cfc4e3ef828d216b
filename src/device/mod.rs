pub mod device_id;
pub mod clock;
pub mod probe;
#[cfg(feature = "nvml")]
pub mod nvml;

pub use device_id::{DeviceId, Placement};
pub use clock::{DeviceClock, HostClock};
pub use probe::{HostProbe, ResourceProbe};
#[cfg(feature = "nvml")]
pub use nvml::NvmlProbe;
