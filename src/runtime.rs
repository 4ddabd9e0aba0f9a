//! Live conversation sessions
//!
//! One controller per open dialog, each with a broadcast notifier that the
//! SSE stream subscribes to.

use crate::controller::{BroadcastNotifier, ConversationController, SessionContext};
use crate::deal::DealSource;
use crate::state_machine::StateValidator;
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Controller with the boxed production collaborators
pub type ProductionController = ConversationController<Arc<dyn Transport>, Arc<dyn DealSource>>;

/// Buffered events per session before slow subscribers start lagging
const EVENT_CAPACITY: usize = 64;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Upper bound on how often the sweeper wakes
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("dealId is required")]
    MissingDeal,
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Handle to interact with an open session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: String,
    pub controller: Arc<ProductionController>,
    pub notifier: Arc<BroadcastNotifier>,
    pub created_at: DateTime<Utc>,
    last_active: Arc<Mutex<Instant>>,
}

impl SessionHandle {
    fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Untouched for `limit`, with no turn in flight and nobody streaming
    fn is_abandoned(&self, limit: Duration) -> bool {
        self.idle_for() >= limit
            && self.notifier.subscriber_count() == 0
            && !self.controller.is_loading()
    }
}

/// Manager for all open sessions
pub struct RuntimeManager {
    transport: Arc<dyn Transport>,
    deals: Arc<dyn DealSource>,
    validator: Arc<dyn StateValidator>,
    turn_timeout: Option<Duration>,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl RuntimeManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        deals: Arc<dyn DealSource>,
        validator: Arc<dyn StateValidator>,
        turn_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            deals,
            validator,
            turn_timeout,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Open a fresh, empty session for a deal
    pub async fn open(
        &self,
        deal_id: &str,
        user_id: Option<String>,
    ) -> Result<SessionHandle, RuntimeError> {
        let deal_id = deal_id.trim();
        if deal_id.is_empty() {
            return Err(RuntimeError::MissingDeal);
        }

        let notifier = Arc::new(BroadcastNotifier::new(EVENT_CAPACITY));
        let controller = ConversationController::new(
            SessionContext::new(user_id, deal_id),
            self.transport.clone(),
            self.deals.clone(),
        )
        .with_validator(self.validator.clone())
        .with_notifier(notifier.clone())
        .with_turn_timeout(self.turn_timeout);

        let handle = SessionHandle {
            id: uuid::Uuid::new_v4().to_string(),
            controller: Arc::new(controller),
            notifier,
            created_at: Utc::now(),
            last_active: Arc::new(Mutex::new(Instant::now())),
        };

        self.sessions
            .write()
            .await
            .insert(handle.id.clone(), handle.clone());
        tracing::info!(session_id = %handle.id, deal_id, "Opened session");
        Ok(handle)
    }

    /// Look up a session and mark it active
    pub async fn get(&self, session_id: &str) -> Result<SessionHandle, RuntimeError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(session_id.to_string()))?;
        handle.touch();
        Ok(handle)
    }

    /// Drop a session. An in-flight turn finishes against the detached controller.
    pub async fn close(&self, session_id: &str) -> Result<(), RuntimeError> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(_) => {
                tracing::info!(session_id, "Closed session");
                Ok(())
            }
            None => Err(RuntimeError::NotFound(session_id.to_string())),
        }
    }

    /// Drop sessions nobody has touched within the idle timeout.
    ///
    /// A reloaded page abandons its dialog without closing it. Sessions with
    /// a turn in flight or an open event stream are kept.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, handle| {
            if handle.is_abandoned(self.idle_timeout) {
                tracing::info!(
                    session_id = %id,
                    idle_secs = handle.idle_for().as_secs(),
                    "Evicting idle session"
                );
                return false;
            }
            true
        });
        before - sessions.len()
    }

    /// Evict idle sessions in the background until the manager is dropped
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let period = self.idle_timeout.min(SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let evicted = manager.evict_idle().await;
                if evicted > 0 {
                    let remaining = manager.session_count().await;
                    tracing::debug!(evicted, remaining, "Session sweep");
                }
            }
        })
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
