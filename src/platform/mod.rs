// Platform-specific code module

pub mod limits;
pub mod time;

// Re-exports for cleaner imports
pub use limits::{effective_user_id, max_pid, parse_pid_max, DEFAULT_MAX_PID};
pub use time::monotonic_ms;
