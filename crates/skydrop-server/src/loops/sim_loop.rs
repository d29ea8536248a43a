//! Mission simulation loop.
//!
//! Advances the active simulation on a fixed cadence using real elapsed
//! time, and publishes each fix to WebSocket subscribers. A fix computed
//! under an older generation (the mission was aborted or restarted while
//! the tick was in flight) is discarded instead of being broadcast.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::state::AppState;
use skydrop_core::MissionStatus;

pub async fn run_sim_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(Duration::from_millis(state.config().sim_tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();
    let mut last_status = MissionStatus::Idle;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Simulation loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed_ms = now.duration_since(last_tick).as_secs_f64() * 1000.0;
                last_tick = now;

                let Some((generation, fix)) = state.tick_sim(elapsed_ms) else {
                    last_status = MissionStatus::Idle;
                    continue;
                };
                if generation != state.sim_generation() {
                    continue;
                }

                if fix.status == MissionStatus::Completed && last_status != MissionStatus::Completed {
                    tracing::info!("Mission completed at 100% progress");
                }

                // A non-running machine produces the same fix every frame;
                // broadcast it once on the transition and then go quiet.
                let status_changed = fix.status != last_status;
                last_status = fix.status;
                if fix.status != MissionStatus::Running && !status_changed {
                    continue;
                }

                match serde_json::to_string(&fix) {
                    Ok(payload) => {
                        // Send fails only when no subscriber is connected.
                        let _ = state.fix_tx.send(payload);
                    }
                    Err(err) => {
                        tracing::error!("Failed to serialize mission fix: {}", err);
                    }
                }
            }
        }
    }
}
