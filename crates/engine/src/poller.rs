// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interval-with-deadline-and-ctrl-c backoff helper, grounded on the
//! teacher's `cli/src/poll.rs::Poller`, generalized into a library type so
//! both the queue's `WaitTurn` backoff and the CLI's `agent job wait`
//! polling loop share it.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

pub enum Tick {
    Ready,
    Timeout,
    Interrupted,
}

pub struct Poller {
    interval: Duration,
    max_interval: Option<Duration>,
    deadline: Option<Instant>,
    ctrl_c: Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>,
}

impl Poller {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            interval,
            max_interval: None,
            deadline: timeout.map(|t| Instant::now() + t),
            ctrl_c: Box::pin(tokio::signal::ctrl_c()),
        }
    }

    /// A poller whose interval doubles up to `max_interval` after every
    /// tick (20ms doubling to 1s is the queue's default backoff).
    pub fn with_doubling_backoff(initial: Duration, max_interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            interval: initial,
            max_interval: Some(max_interval),
            deadline: timeout.map(|t| Instant::now() + t),
            ctrl_c: Box::pin(tokio::signal::ctrl_c()),
        }
    }

    pub async fn tick(&mut self) -> Tick {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Tick::Timeout;
            }
        }

        tokio::select! {
            _ = &mut self.ctrl_c => Tick::Interrupted,
            _ = tokio::time::sleep(self.interval) => {
                if let Some(max) = self.max_interval {
                    self.interval = (self.interval * 2).min(max);
                }
                if let Some(deadline) = self.deadline {
                    if Instant::now() >= deadline {
                        return Tick::Timeout;
                    }
                }
                Tick::Ready
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
