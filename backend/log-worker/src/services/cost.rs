use std::time::Duration;

/// Simulated processing cost for a message.
///
/// Injected into the batch processor so tests can run with [`NoCost`].
pub trait CostModel: Send + Sync {
    fn delay_for(&self, text: &str) -> Duration;
}

/// Fixed cost per byte of input, capped
#[derive(Debug, Clone, Copy)]
pub struct LinearCost {
    per_byte: Duration,
    cap: Duration,
}

impl LinearCost {
    pub fn new(per_byte: Duration, cap: Duration) -> Self {
        Self { per_byte, cap }
    }
}

impl Default for LinearCost {
    fn default() -> Self {
        Self::new(Duration::from_millis(50), Duration::from_secs(5))
    }
}

impl CostModel for LinearCost {
    fn delay_for(&self, text: &str) -> Duration {
        let units = u32::try_from(text.len()).unwrap_or(u32::MAX);
        self.per_byte
            .checked_mul(units)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoCost;

impl CostModel for NoCost {
    fn delay_for(&self, _text: &str) -> Duration {
        Duration::ZERO
    }
}
