//! Study timer
//!
//! A countdown driven by a detached Tokio task that sends one [`TimerTick`]
//! per second. The shell applies ticks on its own thread through
//! [`StudyTimer::tick`]; the countdown state never leaves this struct.
//!
//! Every start bumps a generation number. Ticks carry the generation they
//! were produced under, so ticks still queued after a pause or stop are
//! ignored and completion fires exactly once.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::CoreError;
use crate::Result;

pub const DEFAULT_STUDY_MINUTES: u32 = 25;
/// Longest accepted preset, one day.
pub const MAX_STUDY_MINUTES: u32 = 24 * 60;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Stale tick from an earlier run
    Ignored,
    /// Seconds left after this tick
    Running(u32),
    /// Countdown reached zero; the timer is reset and idle again
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickerControl {
    Run,
    Stop,
}

struct Ticker {
    control: watch::Sender<TickerControl>,
    task: JoinHandle<()>,
    generation: u64,
}

impl Ticker {
    fn cancel(self) {
        let _ = self.control.send(TickerControl::Stop);
        self.task.abort();
    }
}

pub struct StudyTimer {
    initial_secs: u32,
    remaining_secs: u32,
    ticker: Option<Ticker>,
    generation: u64,
    tick_tx: UnboundedSender<TimerTick>,
    tick_rx: UnboundedReceiver<TimerTick>,
}

/// Seconds for a preset in `1..=MAX_STUDY_MINUTES`.
fn preset_secs(minutes: u32) -> Option<u32> {
    if minutes == 0 || minutes > MAX_STUDY_MINUTES {
        return None;
    }
    minutes.checked_mul(60)
}

impl StudyTimer {
    pub fn new(minutes: u32) -> Self {
        let secs = preset_secs(minutes.clamp(1, MAX_STUDY_MINUTES))
            .unwrap_or(DEFAULT_STUDY_MINUTES * 60);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        Self {
            initial_secs: secs,
            remaining_secs: secs,
            ticker: None,
            generation: 0,
            tick_tx,
            tick_rx,
        }
    }

    /// Start counting down from the remaining seconds.
    ///
    /// Returns `Ok(false)` if the timer is already running. Needs a Tokio
    /// runtime to spawn the ticker on.
    pub fn start(&mut self) -> Result<bool> {
        if self.ticker.is_some() {
            return Ok(false);
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| CoreError::NoRuntime)?;

        if self.remaining_secs == 0 {
            self.remaining_secs = self.initial_secs;
        }

        self.generation += 1;
        let generation = self.generation;
        let (control, mut control_rx) = watch::channel(TickerControl::Run);
        let tx = self.tick_tx.clone();

        let task = handle.spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = control_rx.changed() => {
                        if changed.is_err() || *control_rx.borrow() == TickerControl::Stop {
                            return;
                        }
                    }
                    _ = interval.tick() => {
                        if tx.send(TimerTick { generation }).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        self.ticker = Some(Ticker {
            control,
            task,
            generation,
        });

        tracing::info!(remaining_secs = self.remaining_secs, "Study timer started");
        Ok(true)
    }

    /// Stop ticking but keep the remaining time. Returns false if idle.
    pub fn pause(&mut self) -> bool {
        match self.ticker.take() {
            Some(ticker) => {
                ticker.cancel();
                tracing::info!(remaining_secs = self.remaining_secs, "Study timer paused");
                true
            }
            None => false,
        }
    }

    /// Stop ticking and reset to the full duration.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.remaining_secs = self.initial_secs;
        tracing::info!(initial_secs = self.initial_secs, "Study timer stopped");
    }

    /// Change the preset. Only allowed while idle; resets the remaining time.
    pub fn set_minutes(&mut self, minutes: u32) -> bool {
        if self.is_running() {
            return false;
        }
        let Some(secs) = preset_secs(minutes) else {
            tracing::debug!(minutes, "Rejected study timer preset");
            return false;
        };
        self.initial_secs = secs;
        self.remaining_secs = self.initial_secs;
        true
    }

    /// Seed the remaining time from a restored session without starting.
    pub fn restore_remaining(&mut self, secs: u32) {
        if self.is_running() {
            return;
        }
        self.remaining_secs = if secs == 0 { self.initial_secs } else { secs };
    }

    pub fn drain_ticks(&mut self) -> Vec<TimerTick> {
        let mut ticks = Vec::new();
        while let Ok(tick) = self.tick_rx.try_recv() {
            ticks.push(tick);
        }
        ticks
    }

    pub fn tick(&mut self, tick: TimerTick) -> TimerOutcome {
        match &self.ticker {
            Some(ticker) if ticker.generation == tick.generation => {}
            _ => return TimerOutcome::Ignored,
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return TimerOutcome::Running(self.remaining_secs);
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.remaining_secs = self.initial_secs;
        tracing::info!("Study session completed");
        TimerOutcome::Completed
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn initial_secs(&self) -> u32 {
        self.initial_secs
    }

    /// `MM:SS`
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}

impl Default for StudyTimer {
    fn default() -> Self {
        Self::new(DEFAULT_STUDY_MINUTES)
    }
}

impl Drop for StudyTimer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_millis(secs * 1000 + 500)).await;
        tokio::task::yield_now().await;
    }

    fn apply_all(timer: &mut StudyTimer) -> Vec<TimerOutcome> {
        timer
            .drain_ticks()
            .into_iter()
            .map(|t| timer.tick(t))
            .collect()
    }

    #[test]
    fn test_start_needs_runtime() {
        let mut timer = StudyTimer::new(1);
        assert!(matches!(timer.start(), Err(CoreError::NoRuntime)));
        assert!(!timer.is_running());
    }

    #[test]
    fn test_oversized_preset_is_clamped() {
        let timer = StudyTimer::new(80_000_000);
        assert_eq!(timer.initial_secs(), MAX_STUDY_MINUTES * 60);
        assert_eq!(StudyTimer::new(0).initial_secs(), 60);
    }

    #[test]
    fn test_presets_only_while_idle() {
        let mut timer = StudyTimer::default();
        assert_eq!(timer.remaining_secs(), 25 * 60);
        assert_eq!(timer.display(), "25:00");

        assert!(timer.set_minutes(50));
        assert_eq!(timer.initial_secs(), 3000);
        assert!(!timer.set_minutes(0));
        assert!(!timer.set_minutes(80_000_000));
        assert!(!timer.set_minutes(MAX_STUDY_MINUTES + 1));
        assert_eq!(timer.initial_secs(), 3000);
        assert!(timer.set_minutes(MAX_STUDY_MINUTES));
        assert_eq!(timer.remaining_secs(), 86_400);

        timer.restore_remaining(61);
        assert_eq!(timer.display(), "01:01");
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_down() {
        let mut timer = StudyTimer::new(1);
        assert!(timer.start().unwrap());
        assert!(!timer.start().unwrap());

        advance(3).await;
        assert_eq!(
            apply_all(&mut timer),
            vec![
                TimerOutcome::Running(59),
                TimerOutcome::Running(58),
                TimerOutcome::Running(57)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_keeps_remaining_and_drops_stale_ticks() {
        let mut timer = StudyTimer::new(1);
        timer.start().unwrap();
        advance(2).await;

        assert!(timer.pause());
        assert!(!timer.pause());
        // ticks queued before the pause no longer count
        assert!(apply_all(&mut timer)
            .iter()
            .all(|o| *o == TimerOutcome::Ignored));
        assert_eq!(timer.remaining_secs(), 60);

        advance(5).await;
        assert!(timer.drain_ticks().is_empty());

        timer.start().unwrap();
        advance(1).await;
        assert_eq!(apply_all(&mut timer), vec![TimerOutcome::Running(59)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_once_and_resets() {
        let mut timer = StudyTimer::new(1);
        timer.restore_remaining(2);
        timer.start().unwrap();

        advance(4).await;
        let outcomes = apply_all(&mut timer);
        assert_eq!(outcomes[0], TimerOutcome::Running(1));
        assert_eq!(outcomes[1], TimerOutcome::Completed);
        assert!(outcomes[2..].iter().all(|o| *o == TimerOutcome::Ignored));

        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets() {
        let mut timer = StudyTimer::new(2);
        timer.start().unwrap();
        advance(3).await;
        for tick in timer.drain_ticks() {
            timer.tick(tick);
        }
        assert_eq!(timer.remaining_secs(), 117);

        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 120);
    }
}
