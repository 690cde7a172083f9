//! Shopper registration and liveness.
//!
//! A device holds at most one current user. Registration creates a user in the remote
//! store and keeps a copy locally; later visits send a heartbeat that refreshes the
//! user's last activity. Registration never de-duplicates by email.

use crate::entities::{User, user};
use crate::errors::{Error, Result};
use crate::storage::{CURRENT_USER_KEY, LocalStorage, read_json, write_json};
use crate::store::{Collection, RemoteStore};
use chrono::{NaiveDateTime, TimeDelta};
use sea_orm::{ActiveModelTrait, ActiveValue::Unchanged, EntityTrait, Set};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Hours after the last heartbeat during which a user still counts as active.
pub const ACTIVE_WINDOW_HOURS: i64 = 24;

/// True iff the user's last activity is less than 24 hours before `now`.
/// Users with no recorded activity are inactive.
#[must_use]
pub fn is_active(user: &user::Model, now: NaiveDateTime) -> bool {
    user.last_activity
        .is_some_and(|last| now.signed_duration_since(last) < TimeDelta::hours(ACTIVE_WINDOW_HOURS))
}

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
}

impl Registration {
    /// Builds a registration from raw form input.
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    fn validated(&self) -> Result<(String, String, String)> {
        let fields = [("name", &self.name), ("email", &self.email), ("phone", &self.phone)];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("The {field} field is required")));
            }
        }
        Ok((
            self.name.trim().to_string(),
            self.email.trim().to_string(),
            self.phone.trim().to_string(),
        ))
    }
}

/// Tracks the device's current user.
#[derive(Debug)]
pub struct SessionRegistry {
    current: Option<user::Model>,
    storage: Arc<dyn LocalStorage>,
}

impl SessionRegistry {
    /// Loads the locally persisted user, if any.
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let current: Option<user::Model> = read_json(storage.as_ref(), CURRENT_USER_KEY);
        debug!(registered = current.is_some(), "Loaded session");
        Self { current, storage }
    }

    /// The registered user on this device.
    #[must_use]
    pub const fn current(&self) -> Option<&user::Model> {
        self.current.as_ref()
    }

    /// Registers a new user remotely and makes it the current user.
    ///
    /// # Errors
    /// - [`Error::Validation`] if a field is blank after trimming
    /// - [`Error::RemoteWrite`] if the store rejects the user; nothing changes locally
    pub async fn register(
        &mut self,
        store: &RemoteStore,
        registration: &Registration,
        now: NaiveDateTime,
    ) -> Result<user::Model> {
        let (name, email, phone) = registration.validated()?;

        let user = user::ActiveModel {
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            registered_at: Set(now),
            last_activity: Set(Some(now)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(store.db())
        .await
        .map_err(|e| Error::remote_write(Collection::Users, e))?;

        write_json(self.storage.as_ref(), CURRENT_USER_KEY, &user)?;
        self.current = Some(user.clone());
        info!(user_id = user.id, "Registered shopper");

        store.publish_after_write(Collection::Users).await;
        Ok(user)
    }

    /// Marks the current user active as of `now` in the remote store.
    ///
    /// Failures are logged and otherwise ignored. Does nothing without a current user.
    pub async fn heartbeat(&self, store: &RemoteStore, now: NaiveDateTime) {
        let Some(current) = &self.current else {
            return;
        };
        if let Err(e) = touch(store, current.id, now).await {
            error!(user_id = current.id, "Failed to record activity: {e}");
        }
    }
}

async fn touch(store: &RemoteStore, user_id: i64, now: NaiveDateTime) -> Result<()> {
    if User::find_by_id(user_id).one(store.db()).await?.is_none() {
        return Err(Error::UserNotFound { id: user_id });
    }
    user::ActiveModel {
        id: Unchanged(user_id),
        last_activity: Set(Some(now)),
        is_active: Set(true),
        ..Default::default()
    }
    .update(store.db())
    .await
    .map_err(|e| Error::remote_write(Collection::Users, e))?;
    store.publish_after_write(Collection::Users).await;
    Ok(())
}
