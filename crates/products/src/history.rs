//! Audit of committed status histories.
//!
//! A product's committed statuses must start in `draft` and every consecutive
//! pair must be a transition the guard allows. Repeated entries are tolerated
//! (a self-loop is not a change).

use thiserror::Error;

use crate::status::ProductStatus;
use crate::transition::{RejectionReason, Transition, TransitionDecision};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryViolation {
    #[error("history starts in {found}, products are created as draft")]
    NotCreatedAsDraft { found: ProductStatus },

    #[error("illegal transition {transition} at index {index}: {reason}")]
    IllegalTransition {
        index: usize,
        transition: Transition,
        reason: RejectionReason,
    },
}

/// Check a sequence of committed statuses, oldest first.
///
/// An empty history (product never created) is valid.
pub fn check_history(history: &[ProductStatus]) -> Result<(), HistoryViolation> {
    let Some(&first) = history.first() else {
        return Ok(());
    };
    if first != ProductStatus::Draft {
        return Err(HistoryViolation::NotCreatedAsDraft { found: first });
    }

    for (offset, pair) in history.windows(2).enumerate() {
        let transition = Transition::new(pair[0], pair[1]);
        if let TransitionDecision::Rejected { reason, .. } = transition.evaluate() {
            return Err(HistoryViolation::IllegalTransition {
                index: offset + 1,
                transition,
                reason,
            });
        }
    }

    Ok(())
}
