//! Unified error types for the storefront.
//!
//! Every operation returns [`Result`]. The variants mirror the failure classes the
//! shop surfaces to people: bad form input, failed writes to the remote store, payment
//! provider failures and the post-capture persistence failure that needs manual
//! reconciliation.

use crate::store::Collection;
use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A form field was missing or malformed. The operation was aborted.
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// A money amount was negative, zero where not allowed, or not finite.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: f64,
    },

    /// No product with this id exists in the current catalog.
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Product id
        id: i64,
    },

    /// No order with this id exists.
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// Order id
        id: i64,
    },

    /// No user with this id exists.
    #[error("User not found: {id}")]
    UserNotFound {
        /// User id
        id: i64,
    },

    /// A create/update/delete against the remote store failed. Local state is unchanged.
    #[error("Write to {collection} failed: {source}")]
    RemoteWrite {
        /// Collection that rejected the write
        collection: Collection,
        /// Underlying store error
        #[source]
        source: sea_orm::DbErr,
    },

    /// Reading from the remote store failed.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The payment provider refused or failed the transaction.
    #[error("Payment failed: {message}")]
    PaymentCapture {
        /// Provider supplied reason
        message: String,
    },

    /// The provider captured the payment but the order record could not be written.
    ///
    /// Funds are committed while the order is missing; this needs manual reconciliation
    /// and must never be reported as an ordinary retryable failure.
    #[error("Payment {payment_id} was captured but the order could not be recorded: {source}")]
    PostPaymentPersist {
        /// Provider payment identifier
        payment_id: String,
        /// Why the write failed
        #[source]
        source: Box<Error>,
    },

    /// Admin password rejected or the admin session expired.
    #[error("Admin authentication required")]
    AdminAuth,

    /// Local device storage failed.
    #[error("Local storage error: {message}")]
    Storage {
        /// What went wrong
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment variable error.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Wraps a store error raised while writing to `collection`.
    #[must_use]
    pub fn remote_write(collection: Collection, source: sea_orm::DbErr) -> Self {
        Self::RemoteWrite { collection, source }
    }

    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True when the failure needs manual reconciliation (payment taken, no order).
    #[must_use]
    pub const fn requires_reconciliation(&self) -> bool {
        matches!(self, Self::PostPaymentPersist { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
