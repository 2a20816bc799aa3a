//! Product status transition guard.
//!
//! Decides whether a product may move from its persisted status to a requested
//! one. The decision depends on the two statuses only, never on other product
//! fields or ambient state, so it can be called speculatively (e.g. to grey out
//! options in a form) without committing anything.
//!
//! ```text
//! from \ to   draft   active   disabled
//! draft         -       ok        ok
//! active        ok      -         ok
//! disabled      ok      NO        -
//! ```
//!
//! All six edges between distinct statuses are legal except `disabled → active`.
//! A disabled product is re-listed by two separate writes: `disabled → draft`,
//! then `draft → active`. Self-loops are always allowed and are not state changes.
//!
//! Atomicity of "evaluate against the current status, then commit" is the
//! caller's job; see the dispatcher in `storefront-infra`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::DomainError;

use crate::status::{InvalidStatusValue, ProductStatus};

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// `disabled → active` without passing through `draft`.
    DisabledToActiveDirectTransition,
}

impl RejectionReason {
    /// Stable machine-readable code.
    pub const fn code(self) -> &'static str {
        match self {
            RejectionReason::DisabledToActiveDirectTransition => {
                "disabled_to_active_direct_transition"
            }
        }
    }

    /// End-user message.
    pub const fn message(self) -> &'static str {
        match self {
            RejectionReason::DisabledToActiveDirectTransition => {
                "cannot go from disabled directly to active; transition through draft first"
            }
        }
    }
}

impl core::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of evaluating a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionDecision {
    Allowed,
    Rejected {
        reason: RejectionReason,
        message: String,
    },
}

impl TransitionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, TransitionDecision::Allowed)
    }

    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            TransitionDecision::Allowed => None,
            TransitionDecision::Rejected { reason, .. } => Some(*reason),
        }
    }

    pub fn into_result(self) -> Result<(), TransitionRejected> {
        match self {
            TransitionDecision::Allowed => Ok(()),
            TransitionDecision::Rejected { reason, message } => {
                Err(TransitionRejected { reason, message })
            }
        }
    }
}

/// A refused transition, as an error value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransitionRejected {
    pub reason: RejectionReason,
    pub message: String,
}

impl From<TransitionRejected> for DomainError {
    fn from(value: TransitionRejected) -> Self {
        DomainError::rejected(value.reason.code(), value.message)
    }
}

/// A proposed change from one status to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub from: ProductStatus,
    pub to: ProductStatus,
}

impl Transition {
    pub const fn new(from: ProductStatus, to: ProductStatus) -> Self {
        Self { from, to }
    }

    /// `false` for self-loops, which callers should not record as changes.
    pub fn is_state_change(self) -> bool {
        self.from != self.to
    }

    pub fn evaluate(self) -> TransitionDecision {
        evaluate(self.from, self.to)
    }
}

impl core::fmt::Display for Transition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

type Rule = Option<RejectionReason>;

const ALLOW: Rule = None;
const DISABLED_TO_ACTIVE: Rule = Some(RejectionReason::DisabledToActiveDirectTransition);

/// Rows: current status. Columns: proposed status. Order: draft, active, disabled.
const RULES: [[Rule; 3]; 3] = [
    /* draft    */ [ALLOW, ALLOW, ALLOW],
    /* active   */ [ALLOW, ALLOW, ALLOW],
    /* disabled */ [ALLOW, DISABLED_TO_ACTIVE, ALLOW],
];

/// Evaluate a proposed status change.
///
/// Pure and total over the enum: never panics, never touches external state.
pub fn evaluate(current: ProductStatus, proposed: ProductStatus) -> TransitionDecision {
    match RULES[current.index()][proposed.index()] {
        None => TransitionDecision::Allowed,
        Some(reason) => TransitionDecision::Rejected {
            reason,
            message: reason.message().to_string(),
        },
    }
}

/// Evaluate a proposed change given raw status tokens.
///
/// Both tokens are parsed before any rule runs, so a malformed token is always an
/// [`InvalidStatusValue`] and never a [`TransitionDecision::Rejected`].
pub fn evaluate_tokens(
    current: &str,
    proposed: &str,
) -> Result<TransitionDecision, InvalidStatusValue> {
    let current = ProductStatus::parse(current)?;
    let proposed = ProductStatus::parse(proposed)?;
    Ok(evaluate(current, proposed))
}

/// Statuses reachable from `current` in a single write, excluding `current` itself.
pub fn allowed_targets(current: ProductStatus) -> Vec<ProductStatus> {
    ProductStatus::ALL
        .into_iter()
        .filter(|&target| target != current && evaluate(current, target).is_allowed())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProductStatus::{Active, Disabled, Draft};

    #[test]
    fn self_transitions_are_allowed() {
        for status in ProductStatus::ALL {
            assert_eq!(evaluate(status, status), TransitionDecision::Allowed);
            assert!(!Transition::new(status, status).is_state_change());
        }
    }

    #[test]
    fn disabled_to_active_is_rejected() {
        match evaluate(Disabled, Active) {
            TransitionDecision::Rejected { reason, message } => {
                assert_eq!(reason, RejectionReason::DisabledToActiveDirectTransition);
                assert!(message.contains("disabled"));
                assert!(message.contains("draft"));
            }
            TransitionDecision::Allowed => panic!("disabled -> active must be rejected"),
        }
    }

    #[test]
    fn reactivation_through_draft_is_open() {
        assert!(evaluate(Disabled, Draft).is_allowed());
        assert!(evaluate(Draft, Active).is_allowed());
    }

    #[test]
    fn exhaustive_pairs_have_exactly_one_rejection() {
        let mut allowed = 0;
        let mut rejected = Vec::new();
        for from in ProductStatus::ALL {
            for to in ProductStatus::ALL {
                match evaluate(from, to) {
                    TransitionDecision::Allowed => allowed += 1,
                    TransitionDecision::Rejected { .. } => rejected.push((from, to)),
                }
            }
        }
        assert_eq!(allowed, 8);
        assert_eq!(rejected, vec![(Disabled, Active)]);
    }

    #[test]
    fn explicitly_permitted_edges() {
        for (from, to) in [
            (Draft, Active),
            (Draft, Disabled),
            (Active, Disabled),
            (Disabled, Draft),
            (Active, Draft),
        ] {
            assert!(evaluate(from, to).is_allowed(), "{from} -> {to} should be allowed");
        }
    }

    #[test]
    fn malformed_tokens_are_input_errors_not_rejections() {
        for (current, proposed) in [("", "active"), ("disabled", ""), ("archived", "draft"), ("disabled", "Active")] {
            let err = evaluate_tokens(current, proposed).unwrap_err();
            assert!(err.value() == current || err.value() == proposed);
        }
    }

    #[test]
    fn current_token_is_validated_first() {
        let err = evaluate_tokens("bogus", "nonsense").unwrap_err();
        assert_eq!(err.value(), "bogus");
    }

    #[test]
    fn well_formed_tokens_reach_the_rules() {
        let decision = evaluate_tokens("disabled", "active").unwrap();
        assert_eq!(
            decision.rejection_reason(),
            Some(RejectionReason::DisabledToActiveDirectTransition)
        );
        assert_eq!(evaluate_tokens("draft", "active").unwrap(), TransitionDecision::Allowed);
    }

    #[test]
    fn evaluation_is_repeatable() {
        for from in ProductStatus::ALL {
            for to in ProductStatus::ALL {
                assert_eq!(evaluate(from, to), evaluate(from, to));
            }
        }
    }

    #[test]
    fn allowed_targets_per_status() {
        assert_eq!(allowed_targets(Draft), vec![Active, Disabled]);
        assert_eq!(allowed_targets(Active), vec![Draft, Disabled]);
        assert_eq!(allowed_targets(Disabled), vec![Draft]);
    }

    #[test]
    fn no_status_is_terminal() {
        for status in ProductStatus::ALL {
            assert!(!allowed_targets(status).is_empty());
        }
    }

    #[test]
    fn rejection_converts_to_domain_rejection() {
        let err = evaluate(Disabled, Active).into_result().unwrap_err();
        let domain: DomainError = err.into();
        assert_eq!(
            domain,
            DomainError::Rejected {
                code: "disabled_to_active_direct_transition",
                message: RejectionReason::DisabledToActiveDirectTransition.message().to_string(),
            }
        );
    }

    #[test]
    fn transition_displays_both_ends() {
        assert_eq!(Transition::new(Disabled, Draft).to_string(), "disabled -> draft");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = ProductStatus> {
            prop_oneof![Just(Draft), Just(Active), Just(Disabled)]
        }

        proptest! {
            /// Property: only the disabled -> active pair is ever refused.
            #[test]
            fn rejection_iff_disabled_to_active(from in any_status(), to in any_status()) {
                let rejected = !evaluate(from, to).is_allowed();
                prop_assert_eq!(rejected, from == Disabled && to == Active);
            }

            /// Property: arbitrary strings either parse to a status or fail as input errors.
            #[test]
            fn tokens_never_yield_rejection_when_malformed(current in ".{0,12}", proposed in ".{0,12}") {
                let current_ok = ProductStatus::parse(&current).is_ok();
                let proposed_ok = ProductStatus::parse(&proposed).is_ok();
                let result = evaluate_tokens(&current, &proposed);
                prop_assert_eq!(result.is_ok(), current_ok && proposed_ok);
            }
        }
    }
}
