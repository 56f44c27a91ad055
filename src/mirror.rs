use crate::config::XInputSettings;
use crate::device::{Buttons, GamepadState, StateMask};
use crate::platform::VirtualPad;
use crate::xinput::Gamepad;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Mirrors a physical pad onto the virtual controller.
///
/// Only the left stick is passed through, unless Back is held on the physical
/// pad, in which case everything is. Each snapshot is replayed after a fixed
/// delay so chat commands and the local player share the controller.
pub struct Mirror {
    running: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

/// What to push for a given physical report.
pub fn mask_for(state: &GamepadState) -> StateMask {
    if state.pressed(Buttons::BACK) {
        StateMask::ALL
    } else {
        StateMask::AXIS_L
    }
}

/// Snapshots in flight during one delay, plus slack. Beyond that the
/// applier has fallen behind and new snapshots are dropped.
pub fn queue_capacity(settings: &XInputSettings) -> usize {
    let in_flight = settings.mirror_delay_ms / settings.poll_interval_ms.max(1);
    usize::try_from(in_flight).unwrap_or(usize::MAX).saturating_add(2)
}

impl Mirror {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            tasks: Vec::new(),
        }
    }

    /// Start polling `gamepad`. Must be called from within a tokio runtime.
    pub fn start(
        &mut self,
        mut gamepad: Gamepad,
        pad: Arc<dyn VirtualPad>,
        settings: &XInputSettings,
    ) {
        if self.running.load(Ordering::SeqCst) {
            return;
        }
        self.running.store(true, Ordering::SeqCst);

        let poll_interval = Duration::from_millis(settings.poll_interval_ms.max(1));
        let delay = Duration::from_millis(settings.mirror_delay_ms);
        let (tx, mut rx) =
            mpsc::channel::<(Instant, GamepadState, StateMask)>(queue_capacity(settings));

        let running = self.running.clone();
        let poller = tokio::spawn(async move {
            log::info!("Mirroring {:?} every {:?}", gamepad, poll_interval);
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut was_connected = true;

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if let Err(e) = gamepad.update() {
                    log::warn!("Failed to read {:?}: {}", gamepad, e);
                    continue;
                }
                if gamepad.is_connected() != was_connected {
                    was_connected = gamepad.is_connected();
                    log::info!(
                        "{:?} {}",
                        gamepad,
                        if was_connected { "reconnected" } else { "disconnected" }
                    );
                }
                let state = gamepad.state();
                match tx.try_send((Instant::now() + delay, state, mask_for(&state))) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        log::debug!("Mirror is behind, dropping a snapshot")
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            log::info!("Mirror stopped");
        });

        let applier = tokio::spawn(async move {
            while let Some((due, state, mask)) = rx.recv().await {
                tokio::time::sleep_until(due).await;
                if let Err(e) = pad.set_state(&state, mask) {
                    log::warn!("Failed to mirror state: {}", e);
                }
            }
        });

        self.tasks = vec![poller, applier];
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Mirror {
    fn drop(&mut self) {
        self.stop();
    }
}
