//! Timing-mode resolution for the scheduling builders.
//!
//! A timing builder accumulates optional `delay`, `interval`, and `timeout`
//! values; at `start()` they resolve into exactly one [`Schedule`] variant:
//!
//! ```text
//! none set            → NoSchedule            (submit immediately)
//! delay only          → Delay                 (one-shot after delay)
//! interval (± delay)  → DelayInterval         (fixed rate from now+delay)
//! timeout  (± delay)  → DelayTimeout          (one-shot, watchdog at delay+timeout)
//! interval + timeout  → whichever was set last wins (one venue only)
//! ```
//!
//! Fixed-rate scheduling enforces [`MIN_SCHEDULE_DELAY`] on both delay and
//! interval so a zero delay never reaches the scheduling primitive; the
//! violation is a [`ConfigError`], surfaced before anything is submitted.

use std::time::Duration;

use crate::error::ConfigError;

/// Minimum delay/interval accepted by fixed-rate scheduling.
pub const MIN_SCHEDULE_DELAY: Duration = Duration::from_millis(1);

/// Resolved timing mode: exactly one is active per submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Schedule {
    /// Submit immediately, one-shot.
    NoSchedule,
    /// One-shot after `delay`.
    Delay(Duration),
    /// Fixed rate: first firing at `delay`, then every `interval`.
    DelayInterval { delay: Duration, interval: Duration },
    /// One-shot after `delay`, cancelled at `delay + timeout` if unfinished.
    DelayTimeout { delay: Duration, timeout: Duration },
}

/// Which repeat venue was configured last when both are present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RepeatVenue {
    Interval,
    Timeout,
}

/// Accumulated timing fields, resolved lazily at submission.
#[derive(Clone, Debug, Default)]
pub(crate) struct TimingConfig {
    delay: Option<Duration>,
    interval: Option<Duration>,
    timeout: Option<Duration>,
    last_venue: Option<RepeatVenue>,
}

impl TimingConfig {
    pub(crate) fn set_delay(&mut self, delay: Duration) {
        self.delay = Some(delay);
    }

    pub(crate) fn set_interval(&mut self, interval: Duration) {
        self.interval = Some(interval);
        self.last_venue = Some(RepeatVenue::Interval);
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
        self.last_venue = Some(RepeatVenue::Timeout);
    }

    /// Resolves the accumulated fields into exactly one [`Schedule`].
    pub(crate) fn resolve(&self) -> Result<Schedule, ConfigError> {
        let schedule = match (self.delay, self.interval, self.timeout) {
            (None, None, None) => Schedule::NoSchedule,
            (Some(delay), None, None) => Schedule::Delay(delay),
            (delay, Some(interval), None) => Schedule::DelayInterval {
                delay: delay.unwrap_or(MIN_SCHEDULE_DELAY),
                interval,
            },
            (delay, None, Some(timeout)) => Schedule::DelayTimeout {
                delay: delay.unwrap_or(Duration::ZERO),
                timeout,
            },
            // Both repeat venues configured: the one set last wins.
            (delay, Some(interval), Some(timeout)) => match self.last_venue {
                Some(RepeatVenue::Timeout) => Schedule::DelayTimeout {
                    delay: delay.unwrap_or(Duration::ZERO),
                    timeout,
                },
                _ => Schedule::DelayInterval {
                    delay: delay.unwrap_or(MIN_SCHEDULE_DELAY),
                    interval,
                },
            },
        };

        if let Schedule::DelayInterval { delay, interval } = schedule {
            if delay < MIN_SCHEDULE_DELAY {
                return Err(ConfigError::DelayBelowMinimum {
                    delay,
                    min: MIN_SCHEDULE_DELAY,
                });
            }
            if interval < MIN_SCHEDULE_DELAY {
                return Err(ConfigError::IntervalBelowMinimum {
                    interval,
                    min: MIN_SCHEDULE_DELAY,
                });
            }
        }

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS50: Duration = Duration::from_millis(50);
    const MS100: Duration = Duration::from_millis(100);

    #[test]
    fn test_nothing_set_resolves_to_no_schedule() {
        assert_eq!(TimingConfig::default().resolve().unwrap(), Schedule::NoSchedule);
    }

    #[test]
    fn test_delay_only() {
        let mut cfg = TimingConfig::default();
        cfg.set_delay(MS50);
        assert_eq!(cfg.resolve().unwrap(), Schedule::Delay(MS50));
    }

    #[test]
    fn test_delay_and_interval() {
        let mut cfg = TimingConfig::default();
        cfg.set_delay(MS50);
        cfg.set_interval(MS100);
        assert_eq!(
            cfg.resolve().unwrap(),
            Schedule::DelayInterval {
                delay: MS50,
                interval: MS100
            }
        );
    }

    #[test]
    fn test_interval_without_delay_gets_minimum_delay() {
        let mut cfg = TimingConfig::default();
        cfg.set_interval(MS100);
        assert_eq!(
            cfg.resolve().unwrap(),
            Schedule::DelayInterval {
                delay: MIN_SCHEDULE_DELAY,
                interval: MS100
            }
        );
    }

    #[test]
    fn test_timeout_without_delay() {
        let mut cfg = TimingConfig::default();
        cfg.set_timeout(MS100);
        assert_eq!(
            cfg.resolve().unwrap(),
            Schedule::DelayTimeout {
                delay: Duration::ZERO,
                timeout: MS100
            }
        );
    }

    #[test]
    fn test_last_set_venue_wins_interval_then_timeout() {
        let mut cfg = TimingConfig::default();
        cfg.set_delay(MS50);
        cfg.set_interval(MS100);
        cfg.set_timeout(MS100);
        assert!(matches!(
            cfg.resolve().unwrap(),
            Schedule::DelayTimeout { .. }
        ));
    }

    #[test]
    fn test_last_set_venue_wins_timeout_then_interval() {
        let mut cfg = TimingConfig::default();
        cfg.set_timeout(MS100);
        cfg.set_interval(MS100);
        cfg.set_delay(MS50);
        assert!(matches!(
            cfg.resolve().unwrap(),
            Schedule::DelayInterval { .. }
        ));
    }

    #[test]
    fn test_zero_delay_with_interval_is_rejected() {
        let mut cfg = TimingConfig::default();
        cfg.set_delay(Duration::ZERO);
        cfg.set_interval(MS100);
        let err = cfg.resolve().err().expect("config error");
        assert_eq!(err.as_label(), "config_delay_below_minimum");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut cfg = TimingConfig::default();
        cfg.set_delay(MS50);
        cfg.set_interval(Duration::ZERO);
        let err = cfg.resolve().err().expect("config error");
        assert_eq!(err.as_label(), "config_interval_below_minimum");
    }
}
