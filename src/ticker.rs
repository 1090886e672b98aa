use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{Local, NaiveTime};
use tokio::time::{self, Interval, MissedTickBehavior};

pub const OVERDUE_CHECK_PERIOD: Duration = Duration::from_secs(60);

pub fn local_time_of_day() -> NaiveTime {
    Local::now().time()
}

pub struct OverdueTicker {
    interval: Interval,
    shutdown: Pin<Box<dyn Future<Output = ()> + Send>>,
    clock: fn() -> NaiveTime,
    stopped: bool,
}

impl OverdueTicker {
    pub fn new<S>(period: Duration, shutdown: S) -> Self
    where
        S: Future<Output = ()> + Send + 'static,
    {
        Self::with_clock(period, shutdown, local_time_of_day)
    }

    pub fn with_clock<S>(period: Duration, shutdown: S, clock: fn() -> NaiveTime) -> Self
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            interval,
            shutdown: Box::pin(shutdown),
            clock,
            stopped: false,
        }
    }

    pub async fn tick(&mut self) -> Option<NaiveTime> {
        if self.stopped {
            return None;
        }

        tokio::select! {
            biased;
            _ = &mut self.shutdown => {
                self.stopped = true;
                tracing::debug!("overdue ticker stopped");
                None
            }
            _ = self.interval.tick() => Some((self.clock)()),
        }
    }
}
