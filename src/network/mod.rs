pub mod model;
pub mod network;

pub use model::{Mode, Model, Param};
pub use network::Network;
