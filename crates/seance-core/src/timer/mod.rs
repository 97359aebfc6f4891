mod config;
mod engine;
mod service;
mod state;
mod summary;

pub use config::{AutomationFlags, SessionConfig};
pub use engine::{break_type_after, Stopped, TimerEngine};
pub use service::{TimerService, TICK_PERIOD};
pub use state::{format_hms, BreakType, Phase, TimerState};
pub use summary::{SessionSummary, ENDED_STATUS};
