//! Seconds-left ticker for the current code and the color it is shown in.

use std::fmt;
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

/// Resolution of the countdown.
pub const TICK: Duration = Duration::from_secs(1);

/// Denominator of the color ratio. Fixed, independent of the validity the
/// backend sends with each code.
pub const COLOR_TOTAL_SECONDS: u64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownColor {
    Green,
    Yellow,
    Red,
}

impl CountdownColor {
    pub fn hex(self) -> &'static str {
        match self {
            CountdownColor::Green => "#22c55e",
            CountdownColor::Yellow => "#eab308",
            CountdownColor::Red => "#ef4444",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            CountdownColor::Green => (0x22, 0xc5, 0x5e),
            CountdownColor::Yellow => (0xea, 0xb3, 0x08),
            CountdownColor::Red => (0xef, 0x44, 0x44),
        }
    }
}

impl fmt::Display for CountdownColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

/// Maps `remaining / total` to a color: above 0.6 green, above 0.3 yellow,
/// red otherwise. Compared in integers so the 0.6 and 0.3 boundaries are exact.
pub fn color_for(remaining: u64, total: u64) -> CountdownColor {
    let scaled = remaining.saturating_mul(10);
    if scaled > total.saturating_mul(6) {
        CountdownColor::Green
    } else if scaled > total.saturating_mul(3) {
        CountdownColor::Yellow
    } else {
        CountdownColor::Red
    }
}

pub fn countdown_color(remaining: u64) -> CountdownColor {
    color_for(remaining, COLOR_TOTAL_SECONDS)
}

/// Remaining validity of the displayed code plus the interval that drives it.
///
/// The interval is the only timer the component owns. `start` replaces it,
/// `cancel` drops it, and nothing else can schedule a tick.
#[derive(Debug, Default)]
pub struct Countdown {
    remaining: u64,
    interval: Option<Interval>,
    /// Number of `start` calls so far; identifies the ticks of one run.
    runs: u64,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts the countdown at `seconds`. The first decrement happens one
    /// full tick after this call.
    pub fn start(&mut self, seconds: u64) {
        self.cancel();
        self.remaining = seconds;
        self.runs += 1;

        let mut interval = time::interval_at(Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    /// Stops ticking. Safe to call when no timer is running.
    pub fn cancel(&mut self) {
        self.interval = None;
    }

    /// Stops ticking and forgets the remaining time.
    pub fn reset(&mut self) {
        self.cancel();
        self.remaining = 0;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn run(&self) -> u64 {
        self.runs
    }

    pub fn color(&self) -> CountdownColor {
        countdown_color(self.remaining)
    }

    /// Waits for the next tick. Never resolves while no timer is running.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    /// Counts one second down, stopping at zero. Ignored when no timer is running.
    pub fn decrement(&mut self) {
        if self.is_running() {
            self.remaining = self.remaining.saturating_sub(1);
        }
    }
}
