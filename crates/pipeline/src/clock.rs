//! Wall clock used to stamp windows
//!
//! The publisher asks the clock for the start of every new window. Tests swap
//! in a fixed clock so published windows land on known calendar days.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Clock backed by `Utc::now`
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Clock that always returns `at`
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}
