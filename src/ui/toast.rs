use std::collections::VecDeque;
use std::time::{Duration, Instant};

const INFO_DURATION: Duration = Duration::from_secs(3);
/// Errors stay up longer; they usually need reading.
const ERROR_DURATION: Duration = Duration::from_secs(6);
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Info,    // Cyan
    Success, // Green
    Warning, // Yellow
    Error,   // Red
}

impl ToastType {
    fn duration(self) -> Duration {
        match self {
            ToastType::Info | ToastType::Success => INFO_DURATION,
            ToastType::Warning | ToastType::Error => ERROR_DURATION,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub toast_type: ToastType,
    created_at: Instant,
    duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, toast_type: ToastType) -> Self {
        Self {
            message: message.into(),
            toast_type,
            created_at: Instant::now(),
            duration: toast_type.duration(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

/// Queue of transient messages, newest last.
pub struct ToastManager {
    queue: VecDeque<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, toast_type: ToastType) {
        let toast = Toast::new(message, toast_type);
        // The same message twice in a row only needs showing once.
        if let Some(last) = self.queue.back_mut() {
            if last.message == toast.message && last.toast_type == toast.toast_type {
                *last = toast;
                return;
            }
        }
        self.queue.push_back(toast);
        while self.queue.len() > MAX_VISIBLE {
            self.queue.pop_front();
        }
    }

    /// Drop expired toasts.
    pub fn update(&mut self) {
        self.queue.retain(|t| !t.is_expired());
    }

    pub fn visible_toasts(&self) -> Vec<&Toast> {
        self.queue.iter().collect()
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_keeps_newest() {
        let mut toasts = ToastManager::new();
        for i in 0..6 {
            toasts.push(format!("message {}", i), ToastType::Info);
        }
        let visible = toasts.visible_toasts();
        assert_eq!(visible.len(), MAX_VISIBLE);
        assert_eq!(visible[0].message, "message 2");
        assert_eq!(visible[3].message, "message 5");
    }

    #[test]
    fn repeated_message_is_collapsed() {
        let mut toasts = ToastManager::new();
        toasts.push("session s1 is gone; refresh the list", ToastType::Warning);
        toasts.push("session s1 is gone; refresh the list", ToastType::Warning);
        assert_eq!(toasts.visible_toasts().len(), 1);
    }

    #[test]
    fn fresh_toasts_survive_update() {
        let mut toasts = ToastManager::new();
        toasts.push("Closed s1", ToastType::Success);
        toasts.update();
        assert_eq!(toasts.visible_toasts().len(), 1);
    }

    #[test]
    fn errors_outlast_info() {
        assert!(ToastType::Error.duration() > ToastType::Info.duration());
    }
}
