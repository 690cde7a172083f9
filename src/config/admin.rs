//! Admin credential from environment variables.
//!
//! The admin console is gated by one shared password read from `ADMIN_PASSWORD`
//! (usually set in `.env`). When it is unset the console cannot be unlocked.

/// Name of the environment variable holding the admin password.
pub const ADMIN_PASSWORD_VAR: &str = "ADMIN_PASSWORD";

/// Gets the configured admin password, if any. Blank values count as unset.
#[must_use]
pub fn get_admin_password() -> Option<String> {
    std::env::var(ADMIN_PASSWORD_VAR)
        .ok()
        .filter(|p| !p.trim().is_empty())
}
