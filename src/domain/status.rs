//! Merchant onboarding status state machine.
//!
//! `Draft -> AgreementRequested -> OnReview -> AgreementSigning -> AgreementSigned`,
//! with `Rejected` and `Deleted` as side branches. Transitions are validated
//! here and committed by [`Merchant::apply`](crate::domain::merchant::Merchant::apply).

use crate::domain::merchant::MerchantStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// States from which a merchant may still be deleted.
pub const DELETABLE_FROM: &[MerchantStatus] =
    &[MerchantStatus::Draft, MerchantStatus::AgreementRequested];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignatureFlags {
    pub merchant: bool,
    pub psp: bool,
}

impl SignatureFlags {
    pub fn complete(self) -> bool {
        self.merchant && self.psp
    }
}

/// Merchant-derived facts the transition rules depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionGuard {
    pub signatures: SignatureFlags,
    pub can_change_to_signing: bool,
}

/// A `{from, to}` marker attached to the notification of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: MerchantStatus,
    pub to: MerchantStatus,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("agreement can be requested from draft only")]
    AgreementRequestNotAllowed,
    #[error("review can start only after the agreement was requested")]
    OnReviewNotAllowed,
    #[error("agreement signing is impossible")]
    SigningImpossible,
    #[error("document can't be marked signed")]
    CannotMarkSigned,
    #[error("status change is not possible")]
    StatusChangeNotPossible,
}

/// Validates a requested status change.
pub fn transition(
    current: MerchantStatus,
    requested: MerchantStatus,
    guard: TransitionGuard,
) -> Result<StatusChange, TransitionError> {
    use MerchantStatus::*;

    match requested {
        AgreementRequested if current != Draft => {
            return Err(TransitionError::AgreementRequestNotAllowed);
        }
        OnReview if current != AgreementRequested => {
            return Err(TransitionError::OnReviewNotAllowed);
        }
        AgreementSigning if !guard.can_change_to_signing => {
            return Err(TransitionError::SigningImpossible);
        }
        AgreementSigned if current != AgreementSigning || !guard.signatures.complete() => {
            return Err(TransitionError::CannotMarkSigned);
        }
        Deleted if !DELETABLE_FROM.contains(&current) => {
            return Err(TransitionError::StatusChangeNotPossible);
        }
        _ => {}
    }

    Ok(StatusChange {
        from: current,
        to: requested,
    })
}

/// The implicit edge taken when signature data changes: a merchant waiting in
/// `AgreementSigning` moves to `AgreementSigned` as soon as both parties signed.
pub fn signatures_completed(
    current: MerchantStatus,
    signatures: SignatureFlags,
) -> Option<StatusChange> {
    (current == MerchantStatus::AgreementSigning && signatures.complete()).then_some(StatusChange {
        from: current,
        to: MerchantStatus::AgreementSigned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::merchant::MerchantStatus::*;

    const ALL: [MerchantStatus; 8] = [
        Draft,
        AgreementRequested,
        OnReview,
        AgreementSigning,
        AgreementSigned,
        Deleted,
        Rejected,
        Unrecognized(999),
    ];

    fn signed_guard() -> TransitionGuard {
        TransitionGuard {
            signatures: SignatureFlags {
                merchant: true,
                psp: true,
            },
            can_change_to_signing: false,
        }
    }

    #[test]
    fn test_agreement_request_only_from_draft() {
        for current in ALL {
            let result = transition(current, AgreementRequested, TransitionGuard::default());
            if current == Draft {
                assert!(result.is_ok());
            } else {
                assert_eq!(result, Err(TransitionError::AgreementRequestNotAllowed));
            }
        }
    }

    #[test]
    fn test_on_review_only_after_request() {
        for current in ALL {
            let result = transition(current, OnReview, TransitionGuard::default());
            assert_eq!(result.is_ok(), current == AgreementRequested);
        }
    }

    #[test]
    fn test_signed_requires_signing_state_and_both_signatures() {
        for current in ALL {
            let result = transition(current, AgreementSigned, signed_guard());
            if current == AgreementSigning {
                assert_eq!(
                    result,
                    Ok(StatusChange {
                        from: AgreementSigning,
                        to: AgreementSigned
                    })
                );
            } else {
                assert_eq!(result, Err(TransitionError::CannotMarkSigned));
            }
        }

        let half_signed = TransitionGuard {
            signatures: SignatureFlags {
                merchant: true,
                psp: false,
            },
            can_change_to_signing: false,
        };
        assert_eq!(
            transition(AgreementSigning, AgreementSigned, half_signed),
            Err(TransitionError::CannotMarkSigned)
        );
    }

    #[test]
    fn test_signing_follows_guard_predicate() {
        let allowed = TransitionGuard {
            can_change_to_signing: true,
            ..Default::default()
        };
        assert!(transition(OnReview, AgreementSigning, allowed).is_ok());
        assert_eq!(
            transition(OnReview, AgreementSigning, TransitionGuard::default()),
            Err(TransitionError::SigningImpossible)
        );
    }

    #[test]
    fn test_delete_only_from_early_states() {
        for current in ALL {
            let result = transition(current, Deleted, TransitionGuard::default());
            assert_eq!(result.is_ok(), DELETABLE_FROM.contains(&current));
        }
    }

    #[test]
    fn test_signatures_completed_edge() {
        let both = SignatureFlags {
            merchant: true,
            psp: true,
        };
        assert_eq!(
            signatures_completed(AgreementSigning, both),
            Some(StatusChange {
                from: AgreementSigning,
                to: AgreementSigned
            })
        );
        assert_eq!(signatures_completed(OnReview, both), None);
        assert_eq!(
            signatures_completed(
                AgreementSigning,
                SignatureFlags {
                    merchant: false,
                    psp: true
                }
            ),
            None
        );
    }
}
