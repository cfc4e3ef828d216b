use std::fmt;

use serde::{Serialize, Deserialize};

/// Index of the accelerator a run is bound to.
///
/// Chosen once at startup (the `DEVICE` environment variable for the binary)
/// and then passed explicitly to the monitor, the model and the resource probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl DeviceId {
    pub fn new(index: u32) -> DeviceId {
        DeviceId(index)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cuda:{}", self.0)
    }
}

/// Where a tensor currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    Host,
    Device(DeviceId),
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Host => f.write_str("host"),
            Placement::Device(id) => id.fmt(f),
        }
    }
}

impl From<DeviceId> for Placement {
    fn from(id: DeviceId) -> Self {
        Placement::Device(id)
    }
}
