use std::time::Duration;

/// Lower bound on any negative-verification window. A `verify_no_packet`
/// never waits less than this, whatever the configured quiescence.
pub const MIN_QUIESCENCE: Duration = Duration::from_millis(500);

/// Timing knobs for convergence waits and packet verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause after a configuration push before injecting traffic.
    pub settle: Duration,
    /// Pause after a switch reboot before the fabric is usable again.
    pub post_reboot: Duration,
    /// How long a positive verification polls before giving up.
    pub verify_timeout: Duration,
    /// How long a negative verification watches a port.
    pub quiescence: Duration,
    /// Gap between dataplane polls.
    pub poll_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(4),
            post_reboot: Duration::from_secs(180),
            verify_timeout: Duration::from_secs(2),
            quiescence: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl Timing {
    /// Effective negative-verification window.
    pub fn negative_window(&self) -> Duration {
        self.quiescence.max(MIN_QUIESCENCE)
    }

    /// Near-zero waits for tests against in-memory dataplanes.
    pub fn fast() -> Self {
        Self {
            settle: Duration::ZERO,
            post_reboot: Duration::ZERO,
            verify_timeout: Duration::from_millis(200),
            quiescence: MIN_QUIESCENCE,
            poll_interval: Duration::from_millis(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_window_has_floor() {
        let timing = Timing {
            quiescence: Duration::from_millis(10),
            ..Timing::default()
        };
        assert_eq!(timing.negative_window(), MIN_QUIESCENCE);
        assert_eq!(Timing::default().negative_window(), Duration::from_secs(1));
    }
}
