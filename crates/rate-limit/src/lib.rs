//! Per-client admission control: token buckets behind a concurrent registry,
//! with a background sweep that evicts idle clients.
//!
//! State is process-local by design; instances do not share buckets.

mod bucket;
mod registry;

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use config::RateLimitConfig;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub use registry::ClientRegistry;

/// Which registry an admission check consults.
///
/// The global registry sees all traffic; the login registry additionally
/// guards the login endpoint with a stricter budget. They hold independent
/// state: a client blocked by one is not necessarily blocked by the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Login,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Login => f.write_str("login"),
        }
    }
}

/// Owns both client registries and their background sweepers.
///
/// Constructed from configuration, started once, and shut down
/// deterministically: [`shutdown`] cancels the sweep tasks and waits for
/// them to finish. There is no process-wide singleton.
///
/// [`shutdown`]: RateLimitManager::shutdown
pub struct RateLimitManager {
    global: Arc<ClientRegistry>,
    login: Arc<ClientRegistry>,
    shutdown: CancellationToken,
    sweepers: Mutex<Vec<JoinHandle<()>>>,
}

impl RateLimitManager {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            global: Arc::new(ClientRegistry::new(config.global)),
            login: Arc::new(ClientRegistry::new(config.login)),
            shutdown: CancellationToken::new(),
            sweepers: Mutex::new(Vec::new()),
        }
    }

    /// Spawns one sweep task per registry. Requires a tokio runtime.
    pub fn start(&self) {
        let mut sweepers = self.sweepers.lock().expect("sweeper handle list poisoned");

        for (scope, registry) in [(Scope::Global, &self.global), (Scope::Login, &self.login)] {
            sweepers.push(spawn_sweeper(scope, Arc::clone(registry), self.shutdown.child_token()));
        }
    }

    /// Cancels the sweep tasks and waits for them to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handles = std::mem::take(&mut *self.sweepers.lock().expect("sweeper handle list poisoned"));

        for handle in handles {
            // A sweeper that panicked surfaces here as a JoinError; admission
            // checks keep working off the shared registry either way.
            if let Err(error) = handle.await {
                log::error!("rate limit sweeper ended abnormally: {error}");
            }
        }
    }

    /// Admission check against the wall clock.
    pub fn admit(&self, scope: Scope, key: &str) -> bool {
        self.admit_at(scope, key, Instant::now())
    }

    /// Admission check at an explicit point in time.
    pub fn admit_at(&self, scope: Scope, key: &str, now: Instant) -> bool {
        let allowed = self.registry(scope).allow_at(key, now);

        if !allowed {
            log::debug!("rate limited client {key} in the {scope} registry");
        }

        allowed
    }

    /// Back-off hint surfaced to rejected callers.
    pub fn retry_after(&self, scope: Scope) -> Duration {
        self.registry(scope).retry_after()
    }

    pub fn registry(&self, scope: Scope) -> &ClientRegistry {
        match scope {
            Scope::Global => &self.global,
            Scope::Login => &self.login,
        }
    }
}

fn spawn_sweeper(scope: Scope, registry: Arc<ClientRegistry>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(registry.sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately; skip it so a freshly started
        // service does not sweep an empty registry right away.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = registry.sweep_at(Instant::now());

                    if evicted > 0 {
                        log::debug!("evicted {evicted} idle client(s) from the {scope} rate limit registry");
                    }
                }
            }
        }
    })
}
