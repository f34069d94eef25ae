//! Per-message failure-cycle bookkeeping

/// Consecutive full-pool failure cycles for the message in flight
///
/// Lives from the first publish attempt of a message until it is delivered
/// or flushed to the spool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    cycles: u32,
    attempts: u32,
    max_cycles: u32,
}

impl RetryState {
    pub fn new(max_cycles: u32) -> Self {
        Self {
            cycles: 0,
            attempts: 0,
            max_cycles: max_cycles.max(1),
        }
    }

    /// Count single-broker publish attempts
    pub fn record_attempts(&mut self, attempts: u32) {
        self.attempts += attempts;
    }

    /// Count a cycle in which every broker failed
    ///
    /// Returns `true` once the limit is reached.
    pub fn record_cycle(&mut self) -> bool {
        self.cycles += 1;
        self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cycles >= self.max_cycles
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Publish attempts across all cycles
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausts_at_limit() {
        let mut retry = RetryState::new(5);
        for _ in 0..4 {
            assert!(!retry.record_cycle());
        }
        assert!(retry.record_cycle());
        assert_eq!(retry.cycles(), 5);
    }

    #[test]
    fn test_zero_limit_means_one_cycle() {
        let mut retry = RetryState::new(0);
        assert!(retry.record_cycle());
    }

    #[test]
    fn test_attempts_accumulate() {
        let mut retry = RetryState::new(3);
        retry.record_attempts(2);
        retry.record_attempts(3);
        assert_eq!(retry.attempts(), 5);
    }
}
