pub mod cifar;
pub mod mnist;
pub mod pascal;
pub mod registry;
pub mod transform;

pub use registry::{DatasetKind, Split};
