//! ---
//! fz_section: "04-engine-orchestration"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Dashboard engine lifecycle, scheduling and preferences."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::errors::{EngineError, Result};

/// Outcome of one scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The owner no longer wants ticks from this ticker.
    Stop,
}

/// Counters reported by a finished ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    pub ticks: u64,
    pub max_jitter: Duration,
}

/// Fixed-period task that invokes a callback until killed or told to stop.
/// The first tick fires one period after spawn; missed ticks are delayed.
#[derive(Debug)]
pub struct SimulationTicker {
    epoch: u64,
    kill_tx: watch::Sender<bool>,
    task: Option<JoinHandle<TickStats>>,
}

impl SimulationTicker {
    pub fn spawn<F>(period: Duration, epoch: u64, mut on_tick: F) -> Result<Self>
    where
        F: FnMut() -> TickOutcome + Send + 'static,
    {
        if period.is_zero() {
            return Err(EngineError::ZeroPeriod);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (kill_tx, mut kill_rx) = watch::channel(false);

        let task = runtime.spawn(async move {
            let mut stats = TickStats::default();
            let mut expected = Instant::now() + period;
            let mut ticker = interval_at(expected, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = kill_rx.changed() => {
                        match changed {
                            Ok(()) if *kill_rx.borrow() => {
                                debug!(epoch, "simulation ticker kill switch triggered");
                                break;
                            }
                            Ok(()) => {}
                            Err(_) => break,
                        }
                    }
                    fired = ticker.tick() => {
                        let jitter = fired.saturating_duration_since(expected);
                        stats.max_jitter = stats.max_jitter.max(jitter);
                        expected = fired + period;
                        stats.ticks += 1;
                        if on_tick() == TickOutcome::Stop {
                            debug!(epoch, ticks = stats.ticks, "simulation ticker no longer current");
                            break;
                        }
                    }
                }
            }
            debug!(
                epoch,
                ticks = stats.ticks,
                max_jitter_ms = stats.max_jitter.as_secs_f64() * 1_000.0,
                "simulation ticker exited"
            );
            stats
        });

        debug!(epoch, period_ms = period.as_millis() as u64, "simulation ticker started");
        Ok(Self {
            epoch,
            kill_tx,
            task: Some(task),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Flip the kill switch and abort the task without waiting for it.
    pub fn cancel(&mut self) {
        let _ = self.kill_tx.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Flip the kill switch and wait for the loop to exit.
    pub async fn shutdown(mut self) -> TickStats {
        let _ = self.kill_tx.send(true);
        let Some(task) = self.task.take() else {
            return TickStats::default();
        };
        match task.await {
            Ok(stats) => stats,
            Err(err) if err.is_cancelled() => TickStats::default(),
            Err(err) => {
                warn!(epoch = self.epoch, error = %err, "simulation ticker join error");
                TickStats::default()
            }
        }
    }
}

impl Drop for SimulationTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn spawn_outside_runtime_fails() {
        let result = SimulationTicker::spawn(Duration::from_millis(10), 0, || TickOutcome::Continue);
        assert!(matches!(result, Err(EngineError::NoRuntime)));
    }

    #[tokio::test]
    async fn zero_period_is_rejected() {
        let result = SimulationTicker::spawn(Duration::ZERO, 0, || TickOutcome::Continue);
        assert!(matches!(result, Err(EngineError::ZeroPeriod)));
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let ticker = SimulationTicker::spawn(Duration::from_millis(2_000), 1, move || {
            seen.fetch_add(1, Ordering::SeqCst);
            TickOutcome::Continue
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(1_999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(6_002)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);

        let stats = ticker.shutdown().await;
        assert_eq!(stats.ticks, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_outcome_ends_the_loop() {
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let ticker = SimulationTicker::spawn(Duration::from_millis(100), 2, move || {
            if seen.fetch_add(1, Ordering::SeqCst) >= 2 {
                TickOutcome::Stop
            } else {
                TickOutcome::Continue
            }
        })
        .unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(ticker.is_finished());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_further_ticks() {
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let mut ticker = SimulationTicker::spawn(Duration::from_millis(100), 3, move || {
            seen.fetch_add(1, Ordering::SeqCst);
            TickOutcome::Continue
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        let before = count.load(Ordering::SeqCst);
        assert_eq!(before, 2);
        ticker.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);
        assert!(ticker.is_finished());
    }
}
