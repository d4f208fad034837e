//! Shared application state: judge catalog, collaborator handles, and the
//! registry of live pitch sessions.

pub mod judges;
pub mod session;
pub mod state_machine;

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    ai::AiGateway,
    config::AppConfig,
    dao::leaderboard_store::LeaderboardStore,
    error::ServiceError,
    state::{
        judges::JudgeCatalog,
        session::{Bench, PitchSession},
        state_machine::{
            Plan, PlanId, SessionEvent, SessionPhase, SessionStateMachine, Snapshot,
        },
    },
};

/// Cheaply clonable handle to the shared application state.
pub type SharedState = Arc<AppState>;

/// Upper bound on how long a single transition (and the external calls it
/// wraps) may run before it is aborted. The AI endpoints have no timeout of
/// their own.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(60);

/// What the transition driver does with the session when the wrapped work
/// fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the plan and move the session to the error phase. Used for the
    /// draw and feedback pipelines.
    PoisonSession,
    /// Abort the plan and stay in the prior phase so the user can retry.
    /// Used for report-card generation and leaderboard submission.
    Revert,
}

/// Central application state shared across request handlers.
pub struct AppState {
    catalog: JudgeCatalog,
    ai: Arc<dyn AiGateway>,
    leaderboard_store: RwLock<Option<Arc<dyn LeaderboardStore>>>,
    degraded: watch::Sender<bool>,
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
    // Draws never cross an await point, so a std mutex is enough here.
    rng: StdMutex<StdRng>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct the shared state wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a leaderboard store is
    /// installed by the storage supervisor.
    pub fn new(config: AppConfig, ai: Arc<dyn AiGateway>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let rng = match config.rng_seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Arc::new(Self {
            catalog: config.into_catalog(),
            ai,
            leaderboard_store: RwLock::new(None),
            degraded: degraded_tx,
            sessions: DashMap::new(),
            rng: StdMutex::new(rng),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// The immutable judge catalog.
    pub fn catalog(&self) -> &JudgeCatalog {
        &self.catalog
    }

    /// Handle to the AI gateway collaborator.
    pub fn ai(&self) -> &Arc<dyn AiGateway> {
        &self.ai
    }

    /// Run a closure against the shared seedable RNG.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut dyn rand::RngCore) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(|poisoned| {
            // A panic while holding the lock cannot corrupt an RNG.
            poisoned.into_inner()
        });
        f(&mut *guard)
    }

    /// Draw a Bernoulli sample from the shared RNG.
    pub fn roll(&self, probability: f64) -> bool {
        self.with_rng(|rng| rng.random_bool(probability))
    }

    /// Obtain the installed leaderboard store, or a degraded-mode error.
    pub async fn require_leaderboard_store(
        &self,
    ) -> Result<Arc<dyn LeaderboardStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        let guard = self.leaderboard_store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Install a leaderboard store and leave degraded mode.
    pub async fn install_leaderboard_store(&self, store: Arc<dyn LeaderboardStore>) {
        {
            let mut guard = self.leaderboard_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Whether the backend currently refuses persistence operations.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag when the value changes. The store stays
    /// installed while degraded so the supervisor can keep probing it.
    pub fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() != value {
            // send_replace stores the value even with no subscribers.
            self.degraded.send_replace(value);
        }
    }

    /// Register a fresh session around an initial bench draw.
    pub fn create_session(&self, bench: Bench) -> Arc<SessionHandle> {
        let session = PitchSession::new(bench);
        let id = session.id;
        let handle = Arc::new(SessionHandle::new(session, self.transition_timeout));
        self.sessions.insert(id, handle.clone());
        handle
    }

    /// Look up a live session.
    pub fn session(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.get(&id).map(|entry| entry.clone())
    }

    /// Drop a session from the registry.
    pub fn remove_session(&self, id: Uuid) {
        self.sessions.remove(&id);
    }

    /// Remove sessions that have been idle longer than `ttl`, returning how
    /// many were dropped.
    pub async fn reap_idle_sessions(&self, ttl: Duration) -> usize {
        // Snapshot the handles first so no shard lock is held across an
        // await point.
        let handles: Vec<(Uuid, Arc<SessionHandle>)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut reaped = 0;
        for (id, handle) in handles {
            if handle.idle_for().await >= ttl {
                self.sessions.remove(&id);
                reaped += 1;
            }
        }
        reaped
    }

    /// Number of live sessions, for logging.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// One live session's machine and data, owned by this handle alone.
pub struct SessionHandle {
    machine: RwLock<SessionStateMachine>,
    session: RwLock<PitchSession>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
    last_activity: RwLock<Instant>,
}

impl SessionHandle {
    fn new(session: PitchSession, transition_timeout: Option<Duration>) -> Self {
        Self {
            machine: RwLock::new(SessionStateMachine::new()),
            session: RwLock::new(session),
            transition_gate: Mutex::new(()),
            transition_timeout,
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Current resting phase of the machine.
    pub async fn phase(&self) -> SessionPhase {
        self.machine.read().await.phase()
    }

    /// Snapshot of the machine, including any pending transition.
    pub async fn machine_snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Read a projection of the session data.
    pub async fn read_session<T>(&self, f: impl FnOnce(&PitchSession) -> T) -> T {
        let guard = self.session.read().await;
        f(&guard)
    }

    /// Mutate the session data.
    pub async fn with_session_mut<T>(&self, f: impl FnOnce(&mut PitchSession) -> T) -> T {
        let mut guard = self.session.write().await;
        f(&mut guard)
    }

    /// Mark the session as recently used so the reaper leaves it alone.
    pub async fn touch(&self) {
        let mut guard = self.last_activity.write().await;
        *guard = Instant::now();
    }

    /// How long the session has gone without an intent.
    pub async fn idle_for(&self) -> Duration {
        self.last_activity.read().await.elapsed()
    }

    async fn plan_transition(&self, event: SessionEvent) -> Result<Plan, ServiceError> {
        let mut machine = self.machine.write().await;
        machine.plan(event).map_err(Into::into)
    }

    async fn apply_transition(&self, plan_id: PlanId) -> Result<SessionPhase, ServiceError> {
        let mut machine = self.machine.write().await;
        machine.apply(plan_id).map_err(Into::into)
    }

    async fn abort_transition(&self, plan_id: PlanId) {
        let mut machine = self.machine.write().await;
        if let Err(err) = machine.abort(plan_id) {
            warn!(error = ?err, "failed to abort pending transition");
        }
    }

    /// Move the session to the error phase after a failed pipeline.
    async fn poison(&self) {
        let mut machine = self.machine.write().await;
        match machine.plan(SessionEvent::Fail) {
            Ok(plan) => {
                if let Err(err) = machine.apply(plan.id) {
                    warn!(error = ?err, "failed to apply failure transition");
                }
            }
            Err(err) => warn!(error = ?err, "failed to plan failure transition"),
        }
    }

    /// Drive one transition: plan it, run the wrapped work under the bounded
    /// timeout, then apply on success or abort (and optionally poison) on
    /// failure. Only one transition per session runs at a time.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: SessionEvent,
        on_failure: FailurePolicy,
        work: F,
    ) -> Result<(T, SessionPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let _gate = self.transition_gate.lock().await;
        self.touch().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout),
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_transition(plan_id).await?;
                Ok((value, next))
            }
            Err(err) => {
                self.abort_transition(plan_id).await;
                if on_failure == FailurePolicy::PoisonSession {
                    self.poison().await;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ai::testing::StubGateway,
        config::{AppConfig, default_judges},
        services::leaderboard_service::testing::RecordingStore,
    };

    fn test_state() -> SharedState {
        let config = AppConfig {
            judges: default_judges(),
            rng_seed: Some(1),
        };
        AppState::new(config, Arc::new(StubGateway::default()))
    }

    #[tokio::test]
    async fn installing_a_store_clears_degraded_mode() {
        let state = test_state();
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_leaderboard_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .install_leaderboard_store(Arc::new(RecordingStore::default()))
            .await;
        assert!(!state.is_degraded());
        assert!(state.require_leaderboard_store().await.is_ok());
    }

    #[tokio::test]
    async fn degraded_flag_flips_without_any_subscriber() {
        let state = test_state();
        state
            .install_leaderboard_store(Arc::new(RecordingStore::default()))
            .await;

        state.update_degraded(true);
        assert!(matches!(
            state.require_leaderboard_store().await,
            Err(ServiceError::Degraded)
        ));

        state.update_degraded(false);
        assert!(state.require_leaderboard_store().await.is_ok());
    }

    #[tokio::test]
    async fn reaper_drops_only_idle_sessions() {
        let state = test_state();
        let judge = state.catalog().all()[0].clone();
        state.create_session(Bench::Single { judge });

        assert_eq!(state.reap_idle_sessions(Duration::from_secs(3600)).await, 0);
        assert_eq!(state.session_count(), 1);
        assert_eq!(state.reap_idle_sessions(Duration::ZERO).await, 1);
        assert_eq!(state.session_count(), 0);
    }
}
