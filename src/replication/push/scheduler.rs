//! Push replication scheduling loop
//!
//! ```text
//! Stopped -> Idle -> Running(pass) -> Idle -> ... -> Stopped
//! ```
//!
//! The loop sleeps until a jittered deadline or until a notification
//! arrives. A deadline runs a pass; a notification is handled immediately.
//! A pass preempted by a notification hands that notification back, and the
//! loop handles it next without sleeping, so no control request is lost.
//! Every notification is acknowledged exactly once, after its effect is
//! applied.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::pass::{run_pass, PassResources};
use super::scratch::ScratchPool;

/// Standard deviation of the pass delay, as a fraction of the interval.
pub const JITTER_STDDEV: f64 = 0.1;

/// Stand-in deadline for delays the monotonic clock cannot represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Control requests understood by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run a pass now, outside the regular schedule.
    RunNow,
    /// Stop the loop.
    Disable,
}

/// An in-flight control request.
#[derive(Debug)]
pub struct Notification {
    action: Action,
    done: oneshot::Sender<()>,
}

impl Notification {
    /// Create a request and the receiver that resolves once it is handled.
    pub fn new(action: Action) -> (Self, oneshot::Receiver<()>) {
        let (done, acknowledged) = oneshot::channel();
        (Self { action, done }, acknowledged)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Signal the requester. Consumes the notification so it can only
    /// happen once.
    pub fn acknowledge(self) {
        let _ = self.done.send(());
    }
}

/// `interval * (1 + N(0, JITTER_STDDEV))`, never negative.
pub fn jittered_interval<R: Rng + ?Sized>(interval: Duration, rng: &mut R) -> Duration {
    let z: f64 = StandardNormal.sample(rng);
    let factor = (1.0 + z * JITTER_STDDEV).max(0.0);
    Duration::try_from_secs_f64(interval.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// `delay` from now, capped at `FAR_FUTURE` when the clock would overflow.
fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or(now + FAR_FUTURE)
}

/// The scheduling loop. Owns the scratch buffers, which are dropped when
/// the loop exits.
pub(crate) async fn run_loop(
    resources: PassResources,
    mut notifications: mpsc::Receiver<Notification>,
) {
    let mut scratch = ScratchPool::new();
    let mut rng = StdRng::from_entropy();
    let interval = resources.config.interval;
    let mut next_run = deadline_after(jittered_interval(interval, &mut rng));
    let mut notification: Option<Notification> = None;

    loop {
        if notification.is_none() {
            if next_run > Instant::now() {
                tokio::select! {
                    received = notifications.recv() => match received {
                        Some(received) => notification = Some(received),
                        None => break,
                    },
                    _ = tokio::time::sleep_until(next_run) => {}
                }
            } else {
                match notifications.try_recv() {
                    Ok(received) => notification = Some(received),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => break,
                }
            }
        }
        next_run = deadline_after(jittered_interval(interval, &mut rng));

        match notification.take() {
            Some(current) => {
                let action = current.action();
                let held = match action {
                    Action::RunNow => run_pass(&resources, &mut scratch, &mut notifications).await,
                    Action::Disable => None,
                };
                current.acknowledge();
                if action == Action::Disable {
                    break;
                }
                notification = held;
            }
            None => {
                notification = run_pass(&resources, &mut scratch, &mut notifications).await;
            }
        }
    }

    scratch.clear();
}
