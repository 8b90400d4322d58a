//! Notification permission and delivery.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// `Unknown -> {Granted, Denied}`. Once decided, nothing re-asks
/// automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Unknown => "unknown",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "unknown" | "default" => Some(Permission::Unknown),
            "granted" => Some(Permission::Granted),
            "denied" => Some(Permission::Denied),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

/// Host notification capability (browser Notification API, desktop toast,
/// terminal).
pub trait Notifier: Send + Sync {
    fn permission(&self) -> Permission;

    /// Ask the user. Returns the resulting permission.
    fn request_permission(&self) -> Permission;

    fn notify(&self, notification: Notification);
}

/// Session-start request: asks only while the permission is still unknown.
pub fn request_on_start(notifier: &dyn Notifier) -> Permission {
    match notifier.permission() {
        Permission::Unknown => {
            let permission = notifier.request_permission();
            tracing::debug!(permission = permission.as_str(), "notification permission requested");
            permission
        }
        decided => decided,
    }
}

/// Explicit user action: ask, and confirm with a notification when granted.
pub fn enable_reminders(notifier: &dyn Notifier) -> Permission {
    let permission = notifier.request_permission();
    if permission == Permission::Granted {
        notifier.notify(Notification::new("System Online", "Reminders are active."));
    }
    permission
}

/// Notifier that records deliveries in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    permission: Mutex<Permission>,
    /// Answer given by `request_permission` while unknown.
    answer: Mutex<Permission>,
    requests: Mutex<usize>,
    delivered: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            answer: Mutex::new(Permission::Granted),
            ..Self::default()
        }
    }

    /// What the simulated user answers when asked.
    pub fn answering(self, answer: Permission) -> Self {
        if let Ok(mut a) = self.answer.lock() {
            *a = answer;
        }
        self
    }

    pub fn set_permission(&self, permission: Permission) {
        if let Ok(mut p) = self.permission.lock() {
            *p = permission;
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.lock().map(|r| *r).unwrap_or(0)
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn permission(&self) -> Permission {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(Permission::Unknown)
    }

    fn request_permission(&self) -> Permission {
        if let Ok(mut r) = self.requests.lock() {
            *r += 1;
        }
        let current = self.permission();
        if current != Permission::Unknown {
            return current;
        }
        let answer = self.answer.lock().map(|a| *a).unwrap_or(Permission::Denied);
        self.set_permission(answer);
        answer
    }

    fn notify(&self, notification: Notification) {
        if let Ok(mut d) = self.delivered.lock() {
            d.push(notification);
        }
    }
}
