//! Ordered fallback strategies.
//!
//! Extraction ([model, rules]) and search ([OPTIMIZED, SIMPLIFIED,
//! KEYWORD]) are both "try this, fall through to the next one" chains.
//! [`cascade`] runs such a chain strictly in order and records why each
//! rejected strategy fell through.

use std::fmt;
use std::future::Future;

use serde::Serialize;

/// What a single strategy produced.
#[derive(Debug)]
pub enum Attempt<T, R = String> {
    /// Stop here with this value.
    Accept(T),
    /// Move on to the next strategy, for this reason.
    FallThrough(R),
}

/// One strategy that was tried and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected<S, R = String> {
    pub strategy: S,
    pub reason: R,
}

/// The result of running a cascade.
#[derive(Debug)]
pub struct CascadeOutcome<S, T, R = String> {
    /// The accepted value and the strategy that produced it, if any did.
    pub accepted: Option<(S, T)>,
    /// Every strategy that fell through, in the order tried.
    pub rejected: Vec<Rejected<S, R>>,
}

impl<S, T, R> CascadeOutcome<S, T, R> {
    pub const fn is_accepted(&self) -> bool {
        self.accepted.is_some()
    }
}

/// Run `strategies` in order until one accepts.
///
/// Later strategies are never started once an earlier one accepts.
pub async fn cascade<S, T, R, F, Fut>(strategies: &[S], mut run: F) -> CascadeOutcome<S, T, R>
where
    S: Copy + fmt::Debug,
    R: fmt::Display,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Attempt<T, R>>,
{
    let mut rejected = Vec::new();
    for &strategy in strategies {
        match run(strategy).await {
            Attempt::Accept(value) => {
                return CascadeOutcome {
                    accepted: Some((strategy, value)),
                    rejected,
                };
            }
            Attempt::FallThrough(reason) => {
                log::debug!("{:?} fell through: {}", strategy, reason);
                rejected.push(Rejected { strategy, reason });
            }
        }
    }
    CascadeOutcome {
        accepted: None,
        rejected,
    }
}
