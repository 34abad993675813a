use chrono::{
    DateTime,
    Utc,
};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// A toast shown in the footer until `duration` has passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub duration: Duration,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        severity: Severity,
        title: impl Into<String>,
        body: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            severity,
            title: title.into(),
            body: body.into(),
            duration,
            issued_at: Utc::now(),
        }
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, body, Duration::from_secs(5))
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, body, Duration::from_secs(5))
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, body, Duration::from_secs(5))
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, body, Duration::from_secs(5))
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.issued_at);
        age.to_std().map(|age| age >= self.duration).unwrap_or(false)
    }

    fn log(&self) {
        let title = self.title.as_str();
        let body = self.body.as_str();
        match self.severity {
            Severity::Success | Severity::Info => tracing::info!(%title, %body, "notification"),
            Severity::Warning => tracing::warn!(%title, %body, "notification"),
            Severity::Error => tracing::error!(%title, %body, "notification"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    const MAX_VISIBLE: usize = 5;

    pub fn push(&mut self, notification: Notification) {
        notification.log();
        self.items.push(notification);
        if self.items.len() > Self::MAX_VISIBLE {
            let drain = self.items.len() - Self::MAX_VISIBLE;
            self.items.drain(0..drain);
        }
    }

    /// Drops expired toasts; returns whether anything changed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before != self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
