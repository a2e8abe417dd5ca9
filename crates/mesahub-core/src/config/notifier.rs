//! Notification orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Settings for the notification orchestrator.
///
/// All intervals are coarse-grained wall-clock ticks; there is no backoff
/// logic, a failed tick is simply retried on the next one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Inbox polling interval in seconds (fallback when no push signal arrives).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Temporal scheduler interval in seconds.
    #[serde(default = "default_scheduler_interval")]
    pub scheduler_interval_seconds: u64,
    /// Delay before the scheduler's first run, so it does not fire during
    /// the initial data load.
    #[serde(default = "default_scheduler_delay")]
    pub scheduler_startup_delay_seconds: u64,
    /// Window for the "upcoming reservation" temporal check, in minutes.
    #[serde(default = "default_upcoming_window")]
    pub upcoming_window_minutes: i64,
    /// Minutes an occupied table may hold before it counts as overstayed.
    #[serde(default = "default_allotted_minutes")]
    pub table_allotted_minutes: i64,
    /// Maximum number of entities returned per temporal check.
    #[serde(default = "default_max_results")]
    pub max_temporal_results: i64,
    /// Window within which two notifications of the same type and related
    /// entities count as duplicates, in minutes.
    #[serde(default = "default_dedup_window")]
    pub dedup_window_minutes: i64,
    /// How many scheduler ticks between duplicate-cleanup passes.
    #[serde(default = "default_cleanup_every")]
    pub cleanup_every_ticks: u64,
    /// Buffer size of the high-priority interrupt broadcast channel.
    #[serde(default = "default_interrupt_buffer")]
    pub interrupt_buffer_size: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            scheduler_interval_seconds: default_scheduler_interval(),
            scheduler_startup_delay_seconds: default_scheduler_delay(),
            upcoming_window_minutes: default_upcoming_window(),
            table_allotted_minutes: default_allotted_minutes(),
            max_temporal_results: default_max_results(),
            dedup_window_minutes: default_dedup_window(),
            cleanup_every_ticks: default_cleanup_every(),
            interrupt_buffer_size: default_interrupt_buffer(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

fn default_scheduler_interval() -> u64 {
    60
}

fn default_scheduler_delay() -> u64 {
    5
}

fn default_upcoming_window() -> i64 {
    15
}

fn default_allotted_minutes() -> i64 {
    120
}

fn default_max_results() -> i64 {
    50
}

fn default_dedup_window() -> i64 {
    1440
}

fn default_cleanup_every() -> u64 {
    60
}

fn default_interrupt_buffer() -> usize {
    32
}
