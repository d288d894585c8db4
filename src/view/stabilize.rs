// src/view/stabilize.rs
// =============================================================================
// Two-phase stabilization wait for click-driven transitions.
//
// After a row is activated, the widget tears down the old rows and renders
// the new ones. A single "count changed" check fires too early or too late
// because loading states show transient counts, so each attempt waits for:
//   phase 1: the visible row count drops below the pre-transition count
//   phase 2: the count rises above the populated threshold
// Each phase has its own timeout. A failed attempt pauses and retries the
// whole two-phase wait until the attempt budget is spent.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;

use crate::config::StabilizePolicy;
use crate::error::ViewError;
use crate::view::Transition;

/// Anything that can report how many rows are visible right now.
#[async_trait]
pub trait RowProbe: Send {
    async fn row_count(&mut self) -> Result<usize, ViewError>;
}

/// Waits for the drop-then-rise sequence described above.
///
/// A view that drops and then holds at or below the threshold without
/// emptying (only the "return" row is left) is a settled empty level.
pub async fn wait_two_phase<P: RowProbe + ?Sized>(
    probe: &mut P,
    previous: usize,
    policy: &StabilizePolicy,
) -> Transition {
    let mut left_parent = false;

    for attempt in 1..=policy.attempts {
        let dropped = poll_until(probe, policy.phase_timeout, policy.poll_interval, |count| {
            count < previous
        })
        .await;

        if dropped.is_met() {
            left_parent = true;

            match poll_until(probe, policy.phase_timeout, policy.poll_interval, |count| {
                count > policy.populated_threshold
            })
            .await
            {
                Phase::Met => {
                    tokio::time::sleep(policy.settle).await;
                    return Transition::Stabilized;
                }
                Phase::TimedOut { last: Some(last) }
                    if last > 0 && last <= policy.populated_threshold =>
                {
                    tracing::debug!("View settled at {} row(s) with no content", last);
                    return Transition::Stabilized;
                }
                Phase::TimedOut { .. } => {}
            }
        }

        tracing::warn!(
            "Tree view did not stabilize (attempt {}/{}, {} rows before transition)",
            attempt,
            policy.attempts,
            previous
        );

        if attempt < policy.attempts {
            tokio::time::sleep(policy.retry_pause).await;
        }
    }

    Transition::Timeout {
        attempts: policy.attempts,
        left_parent,
    }
}

enum Phase {
    Met,
    /// `last` is the final count read before the timeout, if any read worked.
    TimedOut { last: Option<usize> },
}

impl Phase {
    fn is_met(&self) -> bool {
        matches!(self, Phase::Met)
    }
}

// Polls the probe until `done` holds or the timeout passes.
// Probe errors count as "not yet"; the timeout bounds them.
async fn poll_until<P, F>(probe: &mut P, timeout: Duration, interval: Duration, done: F) -> Phase
where
    P: RowProbe + ?Sized,
    F: Fn(usize) -> bool,
{
    let mut last = None;

    let polling = async {
        loop {
            match probe.row_count().await {
                Ok(count) if done(count) => return,
                Ok(count) => last = Some(count),
                Err(e) => tracing::debug!("Row count unavailable while waiting: {}", e),
            }
            tokio::time::sleep(interval).await;
        }
    };

    let outcome = tokio::time::timeout(timeout, polling).await;
    match outcome {
        Ok(()) => Phase::Met,
        Err(_) => Phase::TimedOut { last },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // Replays a fixed sequence of counts, then repeats the last one
    struct ScriptedProbe {
        counts: VecDeque<usize>,
        last: usize,
        calls: usize,
    }

    impl ScriptedProbe {
        fn new(counts: &[usize]) -> Self {
            Self {
                counts: counts.iter().copied().collect(),
                last: *counts.last().unwrap_or(&0),
                calls: 0,
            }
        }
    }

    #[async_trait]
    impl RowProbe for ScriptedProbe {
        async fn row_count(&mut self) -> Result<usize, ViewError> {
            self.calls += 1;
            if let Some(count) = self.counts.pop_front() {
                self.last = count;
            }
            Ok(self.last)
        }
    }

    fn fast_policy(attempts: u32) -> StabilizePolicy {
        StabilizePolicy {
            attempts,
            phase_timeout: Duration::from_millis(40),
            poll_interval: Duration::from_millis(1),
            retry_pause: Duration::from_millis(1),
            settle: Duration::from_millis(0),
            populated_threshold: 1,
        }
    }

    #[tokio::test]
    async fn test_drop_then_rise_stabilizes() {
        let mut probe = ScriptedProbe::new(&[6, 6, 0, 0, 1, 4]);
        let outcome = wait_two_phase(&mut probe, 6, &fast_policy(3)).await;
        assert_eq!(outcome, Transition::Stabilized);
    }

    #[tokio::test]
    async fn test_no_drop_times_out() {
        let mut probe = ScriptedProbe::new(&[6]);
        let outcome = wait_two_phase(&mut probe, 6, &fast_policy(2)).await;
        assert_eq!(
            outcome,
            Transition::Timeout {
                attempts: 2,
                left_parent: false
            }
        );
    }

    #[tokio::test]
    async fn test_drop_to_nothing_times_out_outside_parent() {
        // Torn down and never repopulated
        let mut probe = ScriptedProbe::new(&[6, 0]);
        let outcome = wait_two_phase(&mut probe, 6, &fast_policy(2)).await;
        assert_eq!(
            outcome,
            Transition::Timeout {
                attempts: 2,
                left_parent: true
            }
        );
    }

    #[tokio::test]
    async fn test_back_row_only_is_an_empty_level() {
        // An empty folder renders just its "return" row
        let mut probe = ScriptedProbe::new(&[6, 0, 1]);
        let outcome = wait_two_phase(&mut probe, 6, &fast_policy(3)).await;
        assert_eq!(outcome, Transition::Stabilized);
    }

    #[tokio::test]
    async fn test_transient_equal_count_is_not_enough() {
        // A loading state that shows the old count again must not pass phase 1
        let mut probe = ScriptedProbe::new(&[6, 6, 6, 3, 5]);
        let outcome = wait_two_phase(&mut probe, 6, &fast_policy(1)).await;
        assert_eq!(outcome, Transition::Stabilized);
        assert!(probe.calls >= 5);
    }

    struct FailingProbe;

    #[async_trait]
    impl RowProbe for FailingProbe {
        async fn row_count(&mut self) -> Result<usize, ViewError> {
            Err(ViewError::Driver("session lost".to_string()))
        }
    }

    #[tokio::test]
    async fn test_probe_errors_are_bounded_by_timeout() {
        let outcome = wait_two_phase(&mut FailingProbe, 4, &fast_policy(1)).await;
        assert_eq!(
            outcome,
            Transition::Timeout {
                attempts: 1,
                left_parent: false
            }
        );
    }
}
