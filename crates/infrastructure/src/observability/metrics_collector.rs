//! Metrics collector for the reminder scheduler
//!
//! Handles are registered once against the global `metrics` recorder. When no
//! recorder is installed every call is a no-op, so tests and embedded use pay
//! nothing.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};

/// Metrics collector for reminder lifecycle and execution
pub struct MetricsCollector {
    reminders_created_total: Counter,
    reminders_deleted_total: Counter,
    reminder_fires_total: Counter,
    lock_skips_total: Counter,
    dispatch_failures_total: Counter,
    task_duration: Histogram,
    lock_hold_duration: Histogram,
    active_timers: Gauge,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            reminders_created_total: counter!("reminder_created_total"),
            reminders_deleted_total: counter!("reminder_deleted_total"),
            reminder_fires_total: counter!("reminder_fires_total"),
            lock_skips_total: counter!("reminder_lock_skips_total"),
            dispatch_failures_total: counter!("reminder_dispatch_failures_total"),
            task_duration: histogram!("reminder_task_duration_seconds"),
            lock_hold_duration: histogram!("reminder_lock_hold_duration_seconds"),
            active_timers: gauge!("reminder_active_timers"),
        }
    }

    pub fn record_reminder_created(&self, task_type: &str) {
        self.reminders_created_total.increment(1);
        counter!("reminder_created_by_type_total", "task_type" => task_type.to_string())
            .increment(1);
    }

    pub fn record_reminder_deleted(&self) {
        self.reminders_deleted_total.increment(1);
    }

    /// Record a timer firing, before the lock is attempted
    pub fn record_fire(&self) {
        self.reminder_fires_total.increment(1);
    }

    /// Record an occurrence skipped because another instance holds the lock
    pub fn record_lock_skip(&self) {
        self.lock_skips_total.increment(1);
    }

    /// Record the end of a locked execution
    pub fn record_dispatch(&self, task_type: &str, success: bool, duration_seconds: f64) {
        let outcome = if success { "success" } else { "failure" };
        counter!(
            "reminder_dispatch_total",
            "task_type" => task_type.to_string(),
            "outcome" => outcome
        )
        .increment(1);

        if !success {
            self.dispatch_failures_total.increment(1);
        }
        self.task_duration.record(duration_seconds);
    }

    pub fn record_lock_hold(&self, duration_seconds: f64) {
        self.lock_hold_duration.record(duration_seconds);
    }

    pub fn update_active_timers(&self, count: usize) {
        self.active_timers.set(count as f64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_without_recorder_is_noop() {
        let collector = MetricsCollector::new();
        collector.record_reminder_created("HTTP_POST");
        collector.record_fire();
        collector.record_lock_skip();
        collector.record_dispatch("EVENT", false, 0.25);
        collector.record_lock_hold(1.0);
        collector.update_active_timers(3);
        collector.record_reminder_deleted();
    }
}
