//! Structured logging utilities
//!
//! Every helper emits a single event carrying an `event` field and dotted
//! `reminder.*` / `lock.*` / `task.*` fields so log pipelines can filter on them.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Structured logging utilities
pub struct StructuredLogger;

impl StructuredLogger {
    /// Log reminder creation
    pub fn log_reminder_created(reminder_id: &str, task_type: &str, schedule: &str) {
        info!(
            event = "reminder_created",
            reminder.id = reminder_id,
            reminder.task_type = task_type,
            reminder.schedule = schedule,
            "Reminder created"
        );
    }

    /// Log reminder deletion
    pub fn log_reminder_deleted(reminder_id: &str) {
        info!(
            event = "reminder_deleted",
            reminder.id = reminder_id,
            "Reminder deleted"
        );
    }

    /// Log a timer being armed for a reminder
    pub fn log_timer_scheduled(reminder_id: &str, next_fire: Option<DateTime<Utc>>) {
        debug!(
            event = "timer_scheduled",
            reminder.id = reminder_id,
            timer.next_fire = ?next_fire,
            "Timer scheduled"
        );
    }

    /// Log a timer firing
    pub fn log_reminder_fired(reminder_id: &str) {
        debug!(
            event = "reminder_fired",
            reminder.id = reminder_id,
            "Reminder timer fired"
        );
    }

    /// Log an occurrence skipped because the lock was not acquired
    pub fn log_lock_skipped(reminder_id: &str, error_message: Option<&str>) {
        match error_message {
            Some(message) => warn!(
                event = "reminder_skipped",
                reminder.id = reminder_id,
                lock.acquired = false,
                lock.error = message,
                "Lock backend failed, skipping occurrence"
            ),
            None => debug!(
                event = "reminder_skipped",
                reminder.id = reminder_id,
                lock.acquired = false,
                "Lock held by another instance, skipping occurrence"
            ),
        }
    }

    /// Log a locked execution finding the reminder gone
    pub fn log_reminder_missing(reminder_id: &str) {
        info!(
            event = "reminder_missing",
            reminder.id = reminder_id,
            "Reminder no longer exists, nothing to dispatch"
        );
    }

    /// Log dispatch completion
    pub fn log_dispatch_complete(
        reminder_id: &str,
        task_type: &str,
        success: bool,
        duration_ms: u64,
        error_message: Option<&str>,
    ) {
        if success {
            info!(
                event = "dispatch_complete",
                reminder.id = reminder_id,
                reminder.task_type = task_type,
                task.success = success,
                task.duration_ms = duration_ms,
                "Reminder dispatched"
            );
        } else {
            error!(
                event = "dispatch_failed",
                reminder.id = reminder_id,
                reminder.task_type = task_type,
                task.success = success,
                task.duration_ms = duration_ms,
                task.error = error_message.unwrap_or("Unknown error"),
                "Reminder dispatch failed"
            );
        }
    }

    /// Log a one-shot reminder being consumed after firing
    pub fn log_one_shot_retired(reminder_id: &str) {
        info!(
            event = "one_shot_retired",
            reminder.id = reminder_id,
            "One-shot reminder retired"
        );
    }

    /// Log lock release
    pub fn log_lock_released(reminder_id: &str, held_ms: u64, released: bool) {
        debug!(
            event = "lock_released",
            reminder.id = reminder_id,
            lock.held_ms = held_ms,
            lock.released = released,
            "Lock released"
        );
    }

    /// Log timers restored from the repository at startup
    pub fn log_timers_restored(count: usize) {
        info!(
            event = "timers_restored",
            timer.count = count,
            "Timers restored from repository"
        );
    }

    /// Log a system error
    pub fn log_system_error(component: &str, operation: &str, error: &dyn std::error::Error) {
        error!(
            event = "system_error",
            component = component,
            operation = operation,
            error = %error,
            "System error occurred"
        );
    }
}
