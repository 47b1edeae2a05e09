use std::collections::HashMap;
use std::sync::Arc;

use reminder_core::models::ReminderSchedule;

use crate::timer::{TimerCallback, TimerDriver, TimerHandle};

/// 提醒id到定时执行句柄的映射
///
/// 注册表没有内部锁，所有修改都在引擎的单一控制路径上进行。
pub struct TimerRegistry<D: TimerDriver + ?Sized = dyn TimerDriver> {
    driver: Arc<D>,
    handles: HashMap<String, Box<dyn TimerHandle>>,
}

impl<D: TimerDriver + ?Sized> TimerRegistry<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self {
            driver,
            handles: HashMap::new(),
        }
    }

    /// 为 `id` 安装定时器
    ///
    /// 同一id已有的句柄会被覆盖但不会被停止，需要取消旧定时器时调用方应先 `stop`。
    pub fn set(&mut self, id: &str, schedule: &ReminderSchedule, callback: TimerCallback) {
        let handle = self.driver.start(id, schedule, callback);
        self.handles.insert(id.to_string(), handle);
    }

    /// 取消 `id` 的后续触发，没有对应句柄时什么也不做
    pub fn stop(&self, id: &str) {
        if let Some(handle) = self.handles.get(id) {
            handle.stop();
        }
    }

    /// 移除映射，应在 `stop` 之后调用
    pub fn remove(&mut self, id: &str) -> bool {
        self.handles.remove(id).is_some()
    }

    pub fn stop_all(&self) {
        for handle in self.handles.values() {
            handle.stop();
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.handles.keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
