#[cfg(test)]
mod cron_utils_tests {
    use reminder_core::models::ReminderSchedule;
    use reminder_dispatcher::cron_utils::*;

    use chrono::{Duration, TimeZone, Timelike, Utc};

    #[test]
    fn test_cron_scheduler_creation() {
        assert!(CronScheduler::new("0 0 0 * * *", chrono_tz::UTC).is_ok());
        assert!(CronScheduler::new("invalid", chrono_tz::UTC).is_err());
        assert!(CronScheduler::new("0 0 0 32 * *", chrono_tz::UTC).is_err());
    }

    #[test]
    fn test_next_execution_time_is_strictly_after() {
        let scheduler = CronScheduler::new("0 0 * * * *", chrono_tz::UTC).unwrap();

        let on_the_hour = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let next = scheduler.next_execution_time(on_the_hour).unwrap();
        assert_eq!(next.hour(), 13);
    }

    #[test]
    fn test_next_execution_time_in_time_zone() {
        // 上海09:00 = UTC 01:00
        let scheduler = CronScheduler::new("0 0 9 * * *", chrono_tz::Asia::Shanghai).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let next = scheduler.next_execution_time(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_next_fire_time_for_one_shot() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let future = now + Duration::minutes(5);
        let past = now - Duration::minutes(5);

        assert_eq!(
            next_fire_time(&ReminderSchedule::Once(future), chrono_tz::UTC, now),
            Some(future)
        );
        // 已过期的一次性提醒立即触发
        assert_eq!(
            next_fire_time(&ReminderSchedule::Once(past), chrono_tz::UTC, now),
            Some(now)
        );
    }

    #[test]
    fn test_next_fire_time_for_cron() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let schedule = ReminderSchedule::Cron("0 30 * * * *".to_string());
        assert_eq!(
            next_fire_time(&schedule, chrono_tz::UTC, now),
            Some(now + Duration::minutes(30))
        );
        assert_eq!(
            next_fire_time(
                &ReminderSchedule::Cron("garbage".to_string()),
                chrono_tz::UTC,
                now
            ),
            None
        );
    }
}
