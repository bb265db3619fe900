pub mod display;

pub use display::{DisplaySnapshot, DisplayStatus, TimerSync};
