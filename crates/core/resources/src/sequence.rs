use std::sync::atomic::{AtomicU64, Ordering};

/// Lower half of the counter holds the sequence, upper half the epoch
const EPOCH_SHIFT: u32 = 32;
const SEQUENCE_MASK: u64 = (1 << EPOCH_SHIFT) - 1;

/// Marks one dispatched fetch on a [`SequenceGuard`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SequenceToken(u64);

impl SequenceToken {
    /// Position of this fetch since the guard was created or last reset
    pub fn sequence(&self) -> u64 {
        self.0 & SEQUENCE_MASK
    }
}

/// Latest-wins filter for a single UI surface.
///
/// Call [`begin`](Self::begin) before dispatching a fetch and check the token
/// when it settles. Any later `begin` permanently supersedes earlier tokens,
/// even if their responses arrive last.
#[derive(Debug, Default)]
pub struct SequenceGuard {
    counter: AtomicU64,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch, superseding every fetch started before it
    pub fn begin(&self) -> SequenceToken {
        SequenceToken(self.counter.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, token: SequenceToken) -> bool {
        self.counter.load(Ordering::Acquire) == token.0
    }

    /// Hand back `value` only if `token` is still the latest fetch
    pub fn settle<T>(&self, token: SequenceToken, value: T) -> Option<T> {
        if self.is_current(token) {
            Some(value)
        } else {
            debug!(
                "Discarding stale result #{} (current #{})",
                token.sequence(),
                self.current()
            );

            None
        }
    }

    /// Sequence of the most recent fetch, zero if none since the last reset
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Acquire) & SEQUENCE_MASK
    }

    /// Invalidate every outstanding token.
    ///
    /// Moves to a new epoch so tokens issued before the reset never
    /// become current again.
    pub fn reset(&self) {
        let (Ok(previous) | Err(previous)) = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |counter| {
                Some(((counter >> EPOCH_SHIFT).wrapping_add(1)) << EPOCH_SHIFT)
            });

        debug!(
            "Reset sequence guard, epoch {} ended at #{}",
            previous >> EPOCH_SHIFT,
            previous & SEQUENCE_MASK
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::time::sleep;

    use super::SequenceGuard;

    #[test]
    fn latest_begin_wins() {
        let guard = SequenceGuard::new();
        let t1 = guard.begin();
        let t2 = guard.begin();

        // t1's work finishes after t2's, it still loses
        assert!(guard.is_current(t2));
        assert!(!guard.is_current(t1));
        assert_eq!(guard.settle(t1, "page 1"), None);
        assert_eq!(guard.settle(t2, "page 2"), Some("page 2"));
    }

    #[test]
    fn tokens_are_monotonic() {
        let guard = SequenceGuard::new();
        assert_eq!(guard.current(), 0);

        let tokens: Vec<_> = (0..5).map(|_| guard.begin()).collect();
        assert!(tokens.windows(2).all(|w| w[0].sequence() < w[1].sequence()));
        assert_eq!(guard.current(), 5);
    }

    #[test]
    fn reset_invalidates_outstanding_tokens() {
        let guard = SequenceGuard::new();
        let before = guard.begin();

        guard.reset();
        assert_eq!(guard.current(), 0);
        assert!(!guard.is_current(before));

        let after = guard.begin();
        assert_eq!(after.sequence(), before.sequence());
        assert!(guard.is_current(after));
        assert!(!guard.is_current(before));
    }

    #[test]
    fn repeated_resets_never_revive_tokens() {
        let guard = SequenceGuard::new();
        let mut issued = Vec::new();

        for _ in 0..3 {
            issued.push(guard.begin());
            guard.reset();
        }

        let latest = guard.begin();
        assert_eq!(latest.sequence(), 1);
        assert!(guard.is_current(latest));
        assert!(issued.iter().all(|token| token.sequence() == 1));
        assert!(issued.iter().all(|token| !guard.is_current(*token)));
    }

    #[tokio::test]
    async fn out_of_order_responses() {
        let guard = Arc::new(SequenceGuard::new());
        let applied = Arc::new(std::sync::Mutex::new(Vec::new()));

        let slow = {
            let (guard, applied) = (guard.clone(), applied.clone());
            let token = guard.begin();
            async move {
                sleep(Duration::from_millis(50)).await;
                if let Some(value) = guard.settle(token, 1) {
                    applied.lock().unwrap().push(value);
                }
            }
        };

        let fast = {
            let (guard, applied) = (guard.clone(), applied.clone());
            let token = guard.begin();
            async move {
                sleep(Duration::from_millis(5)).await;
                if let Some(value) = guard.settle(token, 2) {
                    applied.lock().unwrap().push(value);
                }
            }
        };

        tokio::join!(slow, fast);
        assert_eq!(*applied.lock().unwrap(), vec![2]);
    }
}
