pub mod breaks;
pub mod clock;
pub mod db;
pub mod engine;
pub mod error;
pub mod events;
pub mod models;
pub mod settings;
pub mod sync;
pub mod utils;

pub use breaks::{BreakConfig, BreakKind, BreakPlan, BreakScheduler, BreakTimer};
pub use db::{Database, StoreError};
pub use engine::{SessionEngine, StartRequest};
pub use error::EngineError;
pub use events::{EngineEvent, EventBroadcaster};
pub use models::{FocusStats, Pause, Session, SessionInfo, SessionStatus};
pub use settings::{SettingsStore, TimerSettings};
pub use sync::{DisplaySnapshot, DisplayStatus, TimerSync};
