//! Visitors' sessions, keyed by the id handed out when they start the form.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, o, Logger};
use tokio::sync::{Mutex, RwLock};
use tokio::time::interval;
use uuid::Uuid;

use crate::errors::GiftError;
use crate::handoff::Handoff;
use crate::intake::IntakeSession;
use crate::results::ResultsSession;

const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// One visitor's state across both views.
pub struct Session {
    pub(crate) intake: Option<IntakeSession>,
    pub(crate) handoff: Handoff,
    pub(crate) results: Option<ResultsSession>,
}

impl Session {
    fn new(logger: Logger) -> Self {
        Session {
            intake: Some(IntakeSession::new(logger)),
            handoff: Handoff::new(),
            results: None,
        }
    }

    pub fn intake(&self) -> Option<&IntakeSession> {
        self.intake.as_ref()
    }

    pub fn handoff(&self) -> &Handoff {
        &self.handoff
    }

    pub fn results(&self) -> Option<&ResultsSession> {
        self.results.as_ref()
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    touched: Instant,
}

impl Entry {
    fn new(session: SharedSession) -> Self {
        Entry {
            session,
            touched: Instant::now(),
        }
    }

    fn idle_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.touched)
    }
}

#[derive(Default)]
pub struct Sessions {
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session on the first step of the form.
    pub async fn create(&self, logger: &Logger) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(
            logger.new(o!("session" => id.to_string())),
        )));

        self.sessions
            .write()
            .await
            .insert(id, Entry::new(session.clone()));

        (id, session)
    }

    /// Finds a session and marks it as just used.
    pub async fn get(&self, id: &Uuid) -> Result<SharedSession, GiftError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id).ok_or(GiftError::SessionNotFound)?;

        entry.touched = Instant::now();

        Ok(entry.session.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> Result<SharedSession, GiftError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|entry| entry.session)
            .ok_or(GiftError::SessionNotFound)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every session left alone for longer than `max_idle` and
    /// returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(Instant::now(), max_idle).await
    }

    async fn evict_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;

        let idle = sessions
            .iter()
            .filter(|(_, entry)| entry.idle_at(now) > max_idle)
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();

        for id in &idle {
            if let Some(entry) = sessions.remove(id) {
                // Busy sessions are dropped as they are.
                if let Ok(mut session) = entry.session.try_lock() {
                    if let Some(intake) = session.intake.take() {
                        intake.abandon();
                    }
                }
            }
        }

        idle.len()
    }

    /// Evicts idle sessions every so often, forever.
    pub async fn sweep(&self, max_idle: Duration, logger: &Logger) {
        let period = std::cmp::max(max_idle / 2, MIN_SWEEP_PERIOD);
        let mut ticks = interval(period);

        loop {
            ticks.tick().await;

            let evicted = self.evict_idle(max_idle).await;

            if evicted > 0 {
                let remaining = self.len().await;
                info!(logger, "Evicted idle sessions"; "evicted" => evicted, "remaining" => remaining);
            }
        }
    }
}

/// Parses a session id taken from a path.
pub fn parse_session_id(id: &str) -> Result<Uuid, GiftError> {
    Uuid::parse_str(id).map_err(|_| GiftError::InvalidSessionId { id: id.to_owned() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_sessions_can_be_found_and_removed() {
        let sessions = Sessions::new();
        let (id, _) = sessions.create(&log::discard()).await;

        assert!(sessions.get(&id).await.is_ok());
        assert_eq!(sessions.len().await, 1);

        assert!(sessions.remove(&id).await.is_ok());
        assert!(matches!(sessions.get(&id).await, Err(GiftError::SessionNotFound)));
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn new_sessions_start_on_the_form() {
        let sessions = Sessions::new();
        let (_, session) = sessions.create(&log::discard()).await;
        let session = session.lock().await;

        assert!(session.intake().is_some());
        assert!(!session.handoff().is_pending());
        assert!(session.results().is_none());
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let sessions = Sessions::new();
        let logger = log::discard();

        let (abandoned, _) = sessions.create(&logger).await;
        let (revisited, _) = sessions.create(&logger).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        let (fresh, _) = sessions.create(&logger).await;
        assert!(sessions.get(&revisited).await.is_ok());

        let evicted = sessions
            .evict_idle_at(Instant::now(), Duration::from_millis(25))
            .await;

        assert_eq!(evicted, 1);
        assert!(matches!(
            sessions.get(&abandoned).await,
            Err(GiftError::SessionNotFound)
        ));
        assert!(sessions.get(&revisited).await.is_ok());
        assert!(sessions.get(&fresh).await.is_ok());
        assert_eq!(sessions.len().await, 2);
    }

    #[tokio::test]
    async fn evicting_a_form_drops_its_intake() {
        let sessions = Sessions::new();
        let (id, session) = sessions.create(&log::discard()).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sessions.evict_idle(Duration::from_millis(1)).await, 1);

        assert!(sessions.is_empty().await);
        assert!(session.lock().await.intake().is_none());
        assert!(matches!(sessions.remove(&id).await, Err(GiftError::SessionNotFound)));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(matches!(
            parse_session_id("not-a-uuid"),
            Err(GiftError::InvalidSessionId { .. })
        ));
        assert!(parse_session_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
