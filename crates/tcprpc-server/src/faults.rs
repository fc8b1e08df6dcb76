//! Artificial delay and response dropping, for exercising client timeouts and retries.

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct FaultInjector {
    delay: Duration,
    drop_rate: f64,
}

impl FaultInjector {
    pub fn new(delay: Duration, drop_rate: f64) -> Self {
        Self { delay, drop_rate }
    }

    /// No delay, no drops.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, 0.0)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn drop_rate(&self) -> f64 {
        self.drop_rate
    }

    /// Sleeps for the configured delay, if any.
    pub async fn apply_delay(&self) {
        if self.delay.is_zero() {
            return;
        }
        tracing::warn!("Artificial delay: sleeping {:?}", self.delay);
        tokio::time::sleep(self.delay).await;
    }

    /// Samples whether this response should be withheld.
    pub fn should_drop(&self) -> bool {
        if self.drop_rate <= 0.0 {
            return false;
        }
        rand::thread_rng().gen::<f64>() < self.drop_rate
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::none()
    }
}
