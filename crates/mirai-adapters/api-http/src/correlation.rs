//! Correlation tokens for outbound commands.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out a unique `syncId` per outbound command.
///
/// Tokens are decimal strings of a counter starting at 1, so they never
/// collide with the push sentinel `"-1"`.
#[derive(Debug)]
pub struct CorrelationNamespace {
    counter: AtomicU64,
}

impl Default for CorrelationNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationNamespace {
    /// Creates a namespace whose first token is `"1"`.
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Returns the next token.
    pub fn next(&self) -> String {
        self.counter.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::frame::PUSH_SYNC_ID;

    #[test]
    fn test_tokens_are_sequential() {
        let ns = CorrelationNamespace::new();
        assert_eq!(ns.next(), "1");
        assert_eq!(ns.next(), "2");
    }

    #[test]
    fn test_tokens_unique_across_threads() {
        let ns = Arc::new(CorrelationNamespace::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ns = Arc::clone(&ns);
                std::thread::spawn(move || (0..250).map(|_| ns.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert_ne!(token, PUSH_SYNC_ID);
                assert!(seen.insert(token));
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
