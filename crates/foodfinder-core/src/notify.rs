//! Transient notices that dismiss themselves.

use std::time::{Duration, Instant};

use crate::config::{DEFAULT_NOTICE_DISPLAY_MS, DEFAULT_NOTICE_EXIT_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    Visible,
    /// Inside the exit transition, about to be detached.
    Leaving,
    Expired,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub text: String,
    shown_at: Instant,
}

/// Stack of independent notices, each with its own timer.
#[derive(Debug, Clone)]
pub struct Notifications {
    items: Vec<Notice>,
    next_id: u64,
    display: Duration,
    exit: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_NOTICE_DISPLAY_MS),
            Duration::from_millis(DEFAULT_NOTICE_EXIT_MS),
        )
    }
}

impl Notifications {
    pub fn new(display: Duration, exit: Duration) -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            display,
            exit,
        }
    }

    pub fn notify(&mut self, text: &str) -> u64 {
        self.notify_at(text, Instant::now())
    }

    pub fn notify_at(&mut self, text: &str, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notice {
            id,
            text: text.to_string(),
            shown_at: now,
        });
        id
    }

    pub fn phase(&self, notice: &Notice, now: Instant) -> NoticePhase {
        let age = now.saturating_duration_since(notice.shown_at);
        if age < self.display {
            NoticePhase::Visible
        } else if age < self.display + self.exit {
            NoticePhase::Leaving
        } else {
            NoticePhase::Expired
        }
    }

    /// Detach every notice whose display time and exit delay have both passed.
    pub fn prune(&mut self, now: Instant) {
        let display = self.display;
        let exit = self.exit;
        self.items
            .retain(|n| now.saturating_duration_since(n.shown_at) < display + exit);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notices() -> Notifications {
        Notifications::new(Duration::from_millis(3000), Duration::from_millis(300))
    }

    #[test]
    fn notice_goes_visible_leaving_expired() {
        let mut n = notices();
        let t0 = Instant::now();
        n.notify_at("Đang xử lý", t0);
        let notice = n.iter().next().unwrap().clone();

        assert_eq!(n.phase(&notice, t0), NoticePhase::Visible);
        assert_eq!(n.phase(&notice, t0 + Duration::from_millis(3100)), NoticePhase::Leaving);
        assert_eq!(n.phase(&notice, t0 + Duration::from_millis(3300)), NoticePhase::Expired);
    }

    #[test]
    fn prune_detaches_only_expired() {
        let mut n = notices();
        let t0 = Instant::now();
        n.notify_at("first", t0);
        n.notify_at("second", t0 + Duration::from_millis(2000));

        n.prune(t0 + Duration::from_millis(3200));
        assert_eq!(n.len(), 2);

        n.prune(t0 + Duration::from_millis(3400));
        let left: Vec<_> = n.iter().map(|x| x.text.as_str()).collect();
        assert_eq!(left, vec!["second"]);

        n.prune(t0 + Duration::from_secs(10));
        assert!(n.is_empty());
    }

    #[test]
    fn rapid_calls_stack_independently() {
        let mut n = notices();
        let t0 = Instant::now();
        for _ in 0..50 {
            n.notify_at("same", t0);
        }
        assert_eq!(n.len(), 50);
        let ids: std::collections::HashSet<u64> = n.iter().map(|x| x.id).collect();
        assert_eq!(ids.len(), 50);
    }
}
