//! Wall-clock driver for [`BreathingTimer`].
//!
//! Ticks the timer once per second on a tokio interval. The interval only
//! exists while the timer is running: pausing, stopping or completing drops
//! it, and dropping the `drive` future (teardown) drops it too.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use super::session::BreathingSession;
use super::timer::{BreathingTimer, TimerState};
use crate::events::Event;
use crate::haptics::HapticSink;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Commands accepted while a session is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerControl {
    Pause,
    Resume,
    Stop,
}

fn new_ticker() -> Interval {
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Send [`TimerControl::Stop`] once `signal` resolves.
///
/// Spawn this next to [`drive`] to turn an interrupt (Ctrl-C) into a normal
/// stop, so the interrupted session is still finalized and recorded.
pub async fn stop_on(signal: impl Future<Output = ()>, controls: mpsc::Sender<TimerControl>) {
    signal.await;
    if controls.send(TimerControl::Stop).await.is_err() {
        debug!("stop requested after the session ended");
    }
}

/// Run an already-started timer until its session is finalized.
///
/// Every event the timer emits is passed to `on_event`. If the control
/// channel closes, the session keeps running without further commands.
/// Returns the finalized session, or `None` if nothing was running.
pub async fn drive<H: HapticSink>(
    timer: &mut BreathingTimer<H>,
    mut controls: mpsc::Receiver<TimerControl>,
    mut on_event: impl FnMut(&Event),
) -> Option<BreathingSession> {
    let history_before = timer.history().len();
    let mut ticker = (timer.state() == TimerState::Running).then(new_ticker);
    let mut controls_open = true;

    loop {
        match timer.state() {
            TimerState::Paused if !controls_open => {
                // Nobody is left to resume it.
                if let Some(event) = timer.stop() {
                    on_event(&event);
                }
                break;
            }
            TimerState::Running | TimerState::Paused => {}
            TimerState::Idle => break,
        }

        tokio::select! {
            _ = next_tick(&mut ticker) => {
                for event in timer.tick() {
                    on_event(&event);
                }
            }
            cmd = controls.recv(), if controls_open => match cmd {
                Some(TimerControl::Pause) => {
                    if let Some(event) = timer.pause() {
                        ticker = None;
                        on_event(&event);
                    }
                }
                Some(TimerControl::Resume) => {
                    if let Some(event) = timer.resume() {
                        ticker = Some(new_ticker());
                        on_event(&event);
                    }
                }
                Some(TimerControl::Stop) => {
                    ticker = None;
                    if let Some(event) = timer.stop() {
                        on_event(&event);
                    }
                }
                None => controls_open = false,
            },
        }
    }

    if timer.history().len() > history_before {
        timer.history().last().cloned()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breathing::technique::{Phase, PhaseType, Technique};
    use tokio::time::sleep;

    fn in_out(cycles: u32) -> Technique {
        Technique::new(
            "in-out",
            "In/Out",
            vec![Phase::new(PhaseType::Inhale, 4), Phase::new(PhaseType::Exhale, 4)],
            cycles,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion_at_one_tick_per_second() {
        let mut timer = BreathingTimer::default();
        timer.start(in_out(2)).unwrap();
        let (_tx, rx) = mpsc::channel(4);

        let started = Instant::now();
        let mut completions = 0;
        let session = drive(&mut timer, rx, |e| {
            if matches!(e, Event::BreathingCompleted { .. }) {
                completions += 1;
            }
        })
        .await
        .unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(16) && elapsed < Duration::from_secs(17));
        assert_eq!(completions, 1);
        assert!(session.completed);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_suspends_ticking() {
        let mut timer = BreathingTimer::default();
        timer.start(in_out(2)).unwrap();
        let (tx, rx) = mpsc::channel(4);

        tokio::spawn(async move {
            sleep(Duration::from_millis(3_500)).await;
            tx.send(TimerControl::Pause).await.unwrap();
            sleep(Duration::from_secs(10)).await;
            tx.send(TimerControl::Resume).await.unwrap();
        });

        let started = Instant::now();
        let session = drive(&mut timer, rx, |_| {}).await.unwrap();
        assert!(session.completed);
        assert!(started.elapsed() >= Duration::from_secs(26));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_finalizes_incomplete_session() {
        let mut timer = BreathingTimer::default();
        timer.start(in_out(3)).unwrap();
        let (tx, rx) = mpsc::channel(4);

        tokio::spawn(async move {
            sleep(Duration::from_millis(9_500)).await;
            let _ = tx.send(TimerControl::Stop).await;
        });

        let session = drive(&mut timer, rx, |_| {}).await.unwrap();
        assert!(!session.completed);
        assert_eq!(session.completed_cycles, 1);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_stops_and_records_the_session() {
        let mut timer = BreathingTimer::default();
        timer.start(in_out(3)).unwrap();
        let (tx, rx) = mpsc::channel(4);
        // A second handle stays open, as in a long-lived caller.
        let _keep = tx.clone();

        let interrupt = tokio::spawn(stop_on(sleep(Duration::from_millis(9_500)), tx));
        let mut stopped = 0;
        let session = drive(&mut timer, rx, |e| {
            if matches!(e, Event::BreathingStopped { .. }) {
                stopped += 1;
            }
        })
        .await
        .unwrap();
        interrupt.await.unwrap();

        assert_eq!(stopped, 1);
        assert!(!session.completed);
        assert_eq!(session.completed_cycles, 1);
        assert_eq!(timer.history().len(), 1);
        assert_eq!(timer.history()[0].id, session.id);
    }

    #[tokio::test(start_paused = true)]
    async fn late_interrupt_is_harmless() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        stop_on(async {}, tx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timer_returns_immediately() {
        let mut timer = BreathingTimer::default();
        let (_tx, rx) = mpsc::channel(1);
        assert!(drive(&mut timer, rx, |_| {}).await.is_none());
    }
}
