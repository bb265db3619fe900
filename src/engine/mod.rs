pub mod controller;
pub mod lifecycle;

pub use controller::{SessionEngine, StartRequest};
pub use lifecycle::Applied;
