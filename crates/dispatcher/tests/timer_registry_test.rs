mod common;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::FutureExt;
    use reminder_core::models::ReminderSchedule;
    use reminder_dispatcher::{TimerCallback, TimerRegistry};

    use crate::common::ManualTimerDriver;

    fn counting_callback(counter: Arc<AtomicUsize>) -> TimerCallback {
        Arc::new(move |_id| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    fn hourly() -> ReminderSchedule {
        ReminderSchedule::Cron("0 0 * * * *".to_string())
    }

    #[tokio::test]
    async fn test_set_and_fire() {
        let driver = Arc::new(ManualTimerDriver::new());
        let mut registry = TimerRegistry::new(driver.clone());
        let counter = Arc::new(AtomicUsize::new(0));

        registry.set("a", &hourly(), counting_callback(counter.clone()));

        assert!(registry.contains("a"));
        assert_eq!(registry.len(), 1);
        assert!(driver.fire("a").await);
        assert!(driver.fire("a").await);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stop_then_remove() {
        let driver = Arc::new(ManualTimerDriver::new());
        let mut registry = TimerRegistry::new(driver.clone());
        let counter = Arc::new(AtomicUsize::new(0));
        registry.set("a", &hourly(), counting_callback(counter.clone()));

        registry.stop("a");
        // 停止后映射仍然存在，直到显式移除
        assert!(registry.contains("a"));
        assert!(!driver.fire("a").await);

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(registry.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_unknown_id_is_noop() {
        let driver = Arc::new(ManualTimerDriver::new());
        let registry = TimerRegistry::new(driver);
        registry.stop("missing");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_set_overwrites_without_stopping() {
        let driver = Arc::new(ManualTimerDriver::new());
        let mut registry = TimerRegistry::new(driver.clone());
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        registry.set("a", &hourly(), counting_callback(first.clone()));
        registry.set("a", &hourly(), counting_callback(second.clone()));

        assert_eq!(registry.len(), 1);
        assert_eq!(driver.started_count(), 2);
        assert!(driver.fire("a").await);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_all() {
        let driver = Arc::new(ManualTimerDriver::new());
        let mut registry = TimerRegistry::new(driver.clone());
        let counter = Arc::new(AtomicUsize::new(0));
        for id in ["a", "b", "c"] {
            registry.set(id, &hourly(), counting_callback(counter.clone()));
        }

        registry.stop_all();

        let mut ids = registry.ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
        for id in ["a", "b", "c"] {
            assert!(!driver.is_running(id));
        }
    }
}
