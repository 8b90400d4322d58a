//! Terminal host: a surface and notifier that write JSON lines to stdout.

use std::sync::Arc;

use habitdeck_core::feedback::Particle;
use habitdeck_core::reminders::{Notification, Notifier, Permission};
use habitdeck_core::storage::{keys, Database, PreferenceStore};
use habitdeck_core::{
    Config, DocumentState, EngagementSession, Event, SharedClock, Surface, SurfaceOp, SystemClock,
};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub type CliSession = EngagementSession<Arc<Database>, JsonLinesSurface>;

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "unprintable output"),
    }
}

pub fn print_events(events: &[Event]) {
    for event in events {
        print_json(event);
    }
}

/// Echoes every presentation op and folds it into a document model.
#[derive(Debug, Default)]
pub struct JsonLinesSurface {
    doc: DocumentState,
    expand_bursts: bool,
}

impl JsonLinesSurface {
    pub fn document(&self) -> &DocumentState {
        &self.doc
    }

    /// Also print each burst's particles, for terminals that draw them.
    pub fn expand_bursts(&mut self, on: bool) {
        self.expand_bursts = on;
    }
}

#[derive(Serialize)]
struct ParticlesLine {
    particles: Vec<Particle>,
}

impl Surface for JsonLinesSurface {
    fn apply(&mut self, op: SurfaceOp) {
        print_json(&op);
        match &op {
            SurfaceOp::Burst { burst } if self.expand_bursts => print_json(&ParticlesLine {
                particles: burst.particles(&mut rand::thread_rng()),
            }),
            _ => {}
        }
        self.doc.apply(op);
    }
}

#[derive(Serialize)]
struct NotificationLine<'a> {
    notification: &'a Notification,
}

/// Terminal notifier. The terminal cannot prompt, so a request is answered
/// from `notifications.auto_grant` and the decision persists in the store.
pub struct CliNotifier {
    db: Arc<Database>,
    auto_grant: bool,
}

impl CliNotifier {
    pub fn new(db: Arc<Database>, auto_grant: bool) -> Self {
        Self { db, auto_grant }
    }

    pub fn set_permission(&self, permission: Permission) -> CliResult {
        match permission {
            Permission::Unknown => self.db.remove(keys::NOTIFICATION_PERMISSION)?,
            decided => self.db.set(keys::NOTIFICATION_PERMISSION, decided.as_str())?,
        }
        Ok(())
    }
}

impl Notifier for CliNotifier {
    fn permission(&self) -> Permission {
        match self.db.get(keys::NOTIFICATION_PERMISSION) {
            Ok(raw) => raw
                .and_then(|raw| Permission::parse(&raw))
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "permission read failed");
                Permission::Unknown
            }
        }
    }

    fn request_permission(&self) -> Permission {
        let current = self.permission();
        if current != Permission::Unknown {
            return current;
        }
        let answer = if self.auto_grant {
            Permission::Granted
        } else {
            Permission::Denied
        };
        if let Err(e) = self.set_permission(answer) {
            tracing::warn!(error = %e, "permission not persisted");
        }
        answer
    }

    fn notify(&self, notification: Notification) {
        print_json(&NotificationLine {
            notification: &notification,
        });
    }
}

pub struct Host {
    pub config: Config,
    pub db: Arc<Database>,
    pub clock: SharedClock,
    pub notifier: Arc<CliNotifier>,
}

impl Host {
    pub fn open() -> CliResult<Self> {
        let config = Config::load()?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> CliResult<Self> {
        let db = Arc::new(Database::open()?);
        let notifier = Arc::new(CliNotifier::new(
            Arc::clone(&db),
            config.notifications.auto_grant,
        ));
        Ok(Self {
            config,
            db,
            clock: Arc::new(SystemClock),
            notifier,
        })
    }

    /// A started session.
    pub fn session(&self) -> CliSession {
        let notifier: Arc<dyn Notifier> = self.notifier.clone();
        let mut session = EngagementSession::with_config(
            Arc::clone(&self.db),
            JsonLinesSurface::default(),
            notifier,
            Arc::clone(&self.clock),
            &self.config,
        );
        session.start();
        session
    }
}

pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
