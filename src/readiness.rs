use crate::engine::ViewportRole;

/// Two-stage initialization latch.
///
/// Stage 1 is each viewport reporting that its style loaded; stage 2 (layer
/// population and muting) may start only once both have, and only once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyLatch {
    primary: bool,
    secondary: bool,
    fired: bool,
}

impl ReadyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ready signal. Returns `true` exactly once, on the signal that
    /// completes the pair.
    pub fn mark(&mut self, role: ViewportRole) -> bool {
        match role {
            ViewportRole::Primary => self.primary = true,
            ViewportRole::Secondary => self.secondary = true,
        }
        if self.primary && self.secondary && !self.fired {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn is_ready(&self, role: ViewportRole) -> bool {
        match role {
            ViewportRole::Primary => self.primary,
            ViewportRole::Secondary => self.secondary,
        }
    }

    /// Stage 2 has run
    pub fn is_complete(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_both_in_any_order() {
        for order in [
            [ViewportRole::Primary, ViewportRole::Secondary],
            [ViewportRole::Secondary, ViewportRole::Primary],
        ] {
            let mut latch = ReadyLatch::new();
            assert!(!latch.mark(order[0]));
            assert!(!latch.is_complete());
            assert!(latch.mark(order[1]));
            assert!(latch.is_complete());
            assert!(!latch.mark(order[0]));
            assert!(!latch.mark(order[1]));
        }
    }

    #[test]
    fn test_repeated_signal_from_one_side_never_fires() {
        let mut latch = ReadyLatch::new();
        assert!(!latch.mark(ViewportRole::Primary));
        assert!(!latch.mark(ViewportRole::Primary));
        assert!(latch.is_ready(ViewportRole::Primary));
        assert!(!latch.is_ready(ViewportRole::Secondary));
    }
}
