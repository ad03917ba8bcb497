//! Package state machine and the read-time entitlement predicate.
//!
//! Stored transitions are `PENDING -> ACTIVE | CANCELLED` and `ACTIVE -> CANCELLED`. Expiry is
//! never a stored transition on the read path: an `ACTIVE` row whose `expires_at` has passed is
//! simply not active any more, which [`is_currently_active`] evaluates against a caller-supplied
//! clock.

use std::borrow::Borrow;

use thiserror::Error;
use time::PrimitiveDateTime;

use crate::db::models::UserPackage;
use crate::db::types::PackageStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PackageAction {
    Approve,
    Reject,
    Cancel,
}

impl PackageAction {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
        }
    }

    pub(crate) fn source_statuses(self) -> &'static [PackageStatus] {
        match self {
            Self::Approve | Self::Reject => &[PackageStatus::Pending],
            Self::Cancel => {
                &[PackageStatus::Pending, PackageStatus::Active, PackageStatus::Expired]
            }
        }
    }

    pub(crate) fn target_status(self) -> PackageStatus {
        match self {
            Self::Approve => PackageStatus::Active,
            Self::Reject | Self::Cancel => PackageStatus::Cancelled,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TransitionError {
    #[error("cannot {action} a package that is {from}", action = .action.as_str(), from = .from.as_str())]
    NotAllowed { action: PackageAction, from: PackageStatus },
    #[error("expiry date must be in the future")]
    ExpiryInPast,
}

pub(crate) fn check_transition(
    current: PackageStatus,
    action: PackageAction,
) -> Result<PackageStatus, TransitionError> {
    if action.source_statuses().contains(&current) {
        Ok(action.target_status())
    } else {
        Err(TransitionError::NotAllowed { action, from: current })
    }
}

pub(crate) fn validate_expiry(
    expires_at: Option<PrimitiveDateTime>,
    now: PrimitiveDateTime,
) -> Result<(), TransitionError> {
    match expires_at {
        Some(value) if value <= now => Err(TransitionError::ExpiryInPast),
        _ => Ok(()),
    }
}

pub(crate) fn is_currently_active(
    status: PackageStatus,
    expires_at: Option<PrimitiveDateTime>,
    now: PrimitiveDateTime,
) -> bool {
    status == PackageStatus::Active && expires_at.map_or(true, |expiry| expiry > now)
}

pub(crate) fn package_is_active(package: &UserPackage, now: PrimitiveDateTime) -> bool {
    is_currently_active(package.status, package.expires_at, now)
}

/// Status as a reader should see it: lapsed `ACTIVE` rows are reported as `EXPIRED`.
pub(crate) fn effective_status(package: &UserPackage, now: PrimitiveDateTime) -> PackageStatus {
    if package.status == PackageStatus::Active && !package_is_active(package, now) {
        PackageStatus::Expired
    } else {
        package.status
    }
}

/// Most recently activated package that is active at `now`.
pub(crate) fn current_entitlement<P: Borrow<UserPackage>>(
    packages: &[P],
    now: PrimitiveDateTime,
) -> Option<&P> {
    packages
        .iter()
        .filter(|package| package_is_active((*package).borrow(), now))
        .max_by_key(|package| (*package).borrow().activated_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::datetime, Duration};

    fn package(status: PackageStatus, expires_at: Option<PrimitiveDateTime>) -> UserPackage {
        let now = datetime!(2025-03-01 10:00);
        UserPackage {
            id: "pkg-1".to_string(),
            user_id: "user-1".to_string(),
            exam_id: "adalet-gys".to_string(),
            status,
            purchased_at: now,
            activated_at: (status == PackageStatus::Active).then_some(now),
            expires_at,
            payment_date: None,
            payment_amount: Some(100.0),
            payment_method: Some("havale".to_string()),
            transaction_id: None,
            payment_notes: None,
            admin_notes: None,
            updated_at: now,
        }
    }

    #[test]
    fn approve_only_from_pending() {
        assert_eq!(
            check_transition(PackageStatus::Pending, PackageAction::Approve),
            Ok(PackageStatus::Active)
        );
        for from in [PackageStatus::Active, PackageStatus::Expired, PackageStatus::Cancelled] {
            assert_eq!(
                check_transition(from, PackageAction::Approve),
                Err(TransitionError::NotAllowed { action: PackageAction::Approve, from })
            );
        }
    }

    #[test]
    fn rejected_package_never_becomes_active() {
        let rejected = check_transition(PackageStatus::Pending, PackageAction::Reject).unwrap();
        assert_eq!(rejected, PackageStatus::Cancelled);
        assert!(check_transition(rejected, PackageAction::Approve).is_err());
        assert!(check_transition(rejected, PackageAction::Cancel).is_err());
    }

    #[test]
    fn cancel_accepts_every_non_cancelled_status() {
        for from in [PackageStatus::Pending, PackageStatus::Active, PackageStatus::Expired] {
            assert_eq!(
                check_transition(from, PackageAction::Cancel),
                Ok(PackageStatus::Cancelled)
            );
        }
    }

    #[test]
    fn transition_error_message_names_both_sides() {
        let err = check_transition(PackageStatus::Active, PackageAction::Approve).unwrap_err();
        assert_eq!(err.to_string(), "cannot approve a package that is ACTIVE");
    }

    #[test]
    fn active_package_lapses_at_expiry_without_a_write() {
        let approved_at = datetime!(2025-03-01 10:00);
        let pkg = package(PackageStatus::Active, Some(approved_at + Duration::days(30)));

        assert!(package_is_active(&pkg, approved_at));
        assert!(package_is_active(&pkg, approved_at + Duration::days(29)));
        assert!(!package_is_active(&pkg, approved_at + Duration::days(30)));
        assert!(!package_is_active(&pkg, approved_at + Duration::days(31)));
        assert_eq!(pkg.status, PackageStatus::Active);
        assert_eq!(
            effective_status(&pkg, approved_at + Duration::days(31)),
            PackageStatus::Expired
        );
    }

    #[test]
    fn unlimited_package_never_expires() {
        let pkg = package(PackageStatus::Active, None);
        assert!(package_is_active(&pkg, datetime!(2099-12-31 23:59)));
        assert_eq!(effective_status(&pkg, datetime!(2099-12-31 23:59)), PackageStatus::Active);
    }

    #[test]
    fn pending_and_cancelled_are_never_active() {
        let now = datetime!(2025-03-01 10:00);
        assert!(!package_is_active(&package(PackageStatus::Pending, None), now));
        assert!(!package_is_active(&package(PackageStatus::Cancelled, None), now));
    }

    #[test]
    fn current_entitlement_prefers_latest_activation_and_skips_lapsed() {
        let now = datetime!(2025-06-01 12:00);
        let mut older = package(PackageStatus::Active, None);
        older.id = "older".to_string();
        older.activated_at = Some(datetime!(2025-01-01 00:00));
        let mut newer = package(PackageStatus::Active, None);
        newer.id = "newer".to_string();
        newer.activated_at = Some(datetime!(2025-05-01 00:00));
        let mut lapsed = package(PackageStatus::Active, Some(datetime!(2025-05-30 00:00)));
        lapsed.id = "lapsed".to_string();
        lapsed.activated_at = Some(datetime!(2025-05-20 00:00));

        let packages = vec![older, lapsed, newer];
        assert_eq!(current_entitlement(&packages, now).map(|p| p.id.as_str()), Some("newer"));
        assert!(current_entitlement::<UserPackage>(&[], now).is_none());
    }

    #[test]
    fn expiry_must_be_in_the_future() {
        let now = datetime!(2025-03-01 10:00);
        assert!(validate_expiry(None, now).is_ok());
        assert!(validate_expiry(Some(now + Duration::days(30)), now).is_ok());
        assert_eq!(validate_expiry(Some(now), now), Err(TransitionError::ExpiryInPast));
    }
}
