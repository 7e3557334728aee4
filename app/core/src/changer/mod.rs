//! Automatic wallpaper rotation scheduling.
//!
//! The changer owns the on/off state and interval of the recurring
//! rotation job. Platform schedulers fix their period at registration
//! time, so changing the interval while the job runs means restarting it;
//! the return value of [`WallpaperChanger::set_interval`] tells the caller
//! which message to show. A generation counter invalidates superseded
//! loops so a restart never leaves two of them ticking.

mod autostart;
mod rotation;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub use autostart::AutostartQuirks;
use parking_lot::Mutex;
pub use rotation::CollectionRotation;

use crate::settings::{ChangerInterval, ChangerSettings, SettingsError, SettingsStore};

/// What a completed interval update means for the caller's messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalOutcome {
    /// The interval was stored; the running job (if any) was untouched.
    IntervalUpdated,
    /// The rotation job was restarted to pick up the new period.
    ServiceRestarted,
}

/// Whether changing the interval requires restarting the rotation job.
///
/// Restart only when the job is running and the value actually changed;
/// in particular, the first enable never reports a restart.
#[must_use]
pub fn restart_decision(
    enabled: bool,
    old: ChangerInterval,
    new: ChangerInterval,
) -> IntervalOutcome {
    if enabled && old != new {
        IntervalOutcome::ServiceRestarted
    } else {
        IntervalOutcome::IntervalUpdated
    }
}

/// The work performed at each rotation tick.
///
/// Implementations advance to the next collection image and apply it;
/// failures are theirs to log, a tick never stops the job.
pub trait Rotation: Send + Sync + 'static {
    fn advance(&self);
}

/// Owns rotation state and the background job driving it.
pub struct WallpaperChanger {
    state: Mutex<ChangerSettings>,
    generation: Arc<AtomicU64>,
    rotation: Arc<dyn Rotation>,
    settings: Arc<SettingsStore>,
    quirks: AutostartQuirks,
}

impl WallpaperChanger {
    /// Creates a changer over the persisted settings and a rotation
    /// implementation. The persisted state is loaded but the job is not
    /// started; call [`Self::resume`] for the boot path.
    #[must_use]
    pub fn new(
        settings: Arc<SettingsStore>,
        rotation: Arc<dyn Rotation>,
        quirks: AutostartQuirks,
    ) -> Self {
        let state = settings.changer();
        Self {
            state: Mutex::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            rotation,
            settings,
            quirks,
        }
    }

    /// Whether rotation is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool { self.state.lock().enabled }

    /// The configured interval.
    #[must_use]
    pub fn interval(&self) -> ChangerInterval { self.state.lock().interval }

    /// Starts the job if the persisted state says rotation is on.
    /// Used after process start (the original motivation: surviving a
    /// device reboot).
    pub fn resume(&self) {
        let state = *self.state.lock();
        if state.enabled {
            self.spawn_rotation(state.interval.duration());
        }
    }

    /// Turns rotation on or off, persisting the new state.
    ///
    /// Must be called from within a tokio runtime when enabling.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when persisting fails; the job is not
    /// touched in that case.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        let snapshot = {
            let mut state = self.state.lock();
            state.enabled = enabled;
            *state
        };
        self.settings.set_changer(snapshot)?;
        if enabled {
            tracing::info!(interval_secs = snapshot.interval.as_secs(), "rotation enabled");
            self.spawn_rotation(snapshot.interval.duration());
        } else {
            tracing::info!("rotation disabled");
            self.stop_rotation();
        }
        Ok(())
    }

    /// Stores a new interval, restarting the job when it is running and
    /// the value changed.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when persisting fails; the job keeps
    /// its old period in that case.
    pub fn set_interval(
        &self,
        interval: ChangerInterval,
    ) -> Result<IntervalOutcome, SettingsError> {
        let (snapshot, outcome) = {
            let mut state = self.state.lock();
            let outcome = restart_decision(state.enabled, state.interval, interval);
            state.interval = interval;
            (*state, outcome)
        };
        self.settings.set_changer(snapshot)?;
        if outcome == IntervalOutcome::ServiceRestarted {
            tracing::info!(interval_secs = interval.as_secs(), "rotation restarted");
            self.spawn_rotation(interval.duration());
        }
        Ok(outcome)
    }

    /// Whether `manufacturer` needs the one-time autostart guidance dialog
    /// right after enabling rotation.
    #[must_use]
    pub fn requires_autostart_hint(&self, manufacturer: &str) -> bool {
        self.quirks.affects(manufacturer)
    }

    /// Spawns a rotation loop for `period`, superseding any running loop.
    fn spawn_rotation(&self, period: Duration) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let liveness = Arc::clone(&self.generation);
        let rotation = Arc::clone(&self.rotation);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if liveness.load(Ordering::SeqCst) != generation {
                    // A restart or disable superseded this loop.
                    break;
                }
                rotation.advance();
            }
        });
    }

    /// Invalidates the running loop, if any.
    fn stop_rotation(&self) { self.generation.fetch_add(1, Ordering::SeqCst); }
}

impl std::fmt::Debug for WallpaperChanger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = *self.state.lock();
        f.debug_struct("WallpaperChanger")
            .field("enabled", &state.enabled)
            .field("interval", &state.interval)
            .finish()
    }
}
