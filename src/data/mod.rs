pub mod batch;
pub mod dataset;
pub mod loader;

pub use batch::Batch;
pub use dataset::{Dataset, TensorDataset};
pub use loader::{DataLoader, DataSource};
