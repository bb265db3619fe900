pub mod pause;
pub mod session;
pub mod stats;

pub use pause::Pause;
pub use session::{Session, SessionInfo, SessionStatus, DEFAULT_LABEL};
pub use stats::FocusStats;
