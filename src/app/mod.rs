//! Coordinators that own the shopper and admin state and keep views in sync.
//!
//! Each coordinator reacts to two kinds of input: collection snapshots from the remote
//! store and intents from its view. Both end in the same place, recomputing the
//! affected view-models and rendering them. Operation failures never escape a
//! coordinator; they are rendered as notices.

/// Admin console coordinator
pub mod admin;
/// Shopper storefront coordinator
pub mod shop;

pub use admin::{AdminConsole, AdminIntent};
pub use shop::{Intent, Storefront};

use crate::errors::Error;
use crate::view::{Fragment, NoticeLevel};
use chrono::NaiveDateTime;
use tracing::error;

/// Wall clock used by the run loops.
#[must_use]
pub fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Notice shown for a failed operation.
///
/// A captured payment without an order is shown as critical with the payment id, so
/// it is never mistaken for a failure the shopper can simply retry.
pub fn failure_notice(operation: &str, err: &Error) -> Fragment {
    error!(operation, "{err}");
    match err {
        Error::PostPaymentPersist { payment_id, .. } => Fragment::notice(
            NoticeLevel::Critical,
            format!(
                "Your payment {payment_id} went through but we could not record your order. \
                 Please contact us with this reference."
            ),
        ),
        _ => Fragment::notice(NoticeLevel::Error, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_payment_failure_is_critical() {
        let err = Error::PostPaymentPersist {
            payment_id: "pay-9".into(),
            source: Box::new(Error::OrderNotFound { id: 1 }),
        };
        let notice = failure_notice("checkout", &err);
        assert!(matches!(
            &notice,
            Fragment::Notice { level: NoticeLevel::Critical, message } if message.contains("pay-9")
        ));

        let ordinary = failure_notice("add", &Error::validation("Pick a size"));
        assert!(matches!(ordinary, Fragment::Notice { level: NoticeLevel::Error, .. }));
    }
}
