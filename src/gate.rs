//! Access Control Gate.
//!
//! Guards run in order before a handler does any work and short-circuit on the
//! first failure with a redirect. Authorization failures are redirects, never a
//! "forbidden" page, so a restricted record looks the same as a missing one.

use uuid::Uuid;

use crate::{
    auth::{AuthUser, CurrentUser},
    models::Series,
    repository::RepositoryState,
    views::Outcome,
};

pub const LOGIN_PATH: &str = "/login";
pub const ROOT_PATH: &str = "/";
pub const SERIES_PATH: &str = "/series";

/// Guard
///
/// A single precondition on the acting reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// A resolved session user must be present.
    LoggedIn,
    /// The session user must carry the admin role.
    Admin,
}

pub const SIGNED_IN: &[Guard] = &[Guard::LoggedIn];
pub const ADMIN_ONLY: &[Guard] = &[Guard::LoggedIn, Guard::Admin];

impl Guard {
    fn check(self, user: Option<&AuthUser>) -> Result<(), Outcome> {
        match (self, user) {
            (_, None) => Err(Outcome::redirect(LOGIN_PATH)),
            (Guard::LoggedIn, Some(_)) => Ok(()),
            (Guard::Admin, Some(u)) if u.is_admin() => Ok(()),
            (Guard::Admin, Some(u)) => {
                tracing::warn!(user_id = %u.id, "admin route refused");
                Err(Outcome::redirect(ROOT_PATH))
            }
        }
    }
}

/// authorize
///
/// Evaluates `guards` in order and hands back the signed-in reader. An empty
/// guard list still requires a session user.
pub fn authorize(current: CurrentUser, guards: &[Guard]) -> Result<AuthUser, Outcome> {
    let CurrentUser(user) = current;
    for guard in guards {
        guard.check(user.as_ref())?;
    }
    user.ok_or_else(|| Outcome::redirect(LOGIN_PATH))
}

/// visible_series
///
/// The record-visibility requirement. Fetches the series once and passes it on
/// when `series.access_level <= user.access_level`; otherwise the reader goes
/// back to the listing. A missing series or a store fault lands on the listing
/// too, so no failure here escapes as a fault.
pub async fn visible_series(
    repo: &RepositoryState,
    user: &AuthUser,
    id: Uuid,
) -> Result<Series, Outcome> {
    match repo.get_series(id).await {
        Ok(series) if series.is_visible_to(user.access_level) => Ok(series),
        Ok(series) => {
            tracing::warn!(
                user_id = %user.id,
                series_id = %series.id,
                required = series.access_level,
                held = user.access_level,
                "series hidden from reader"
            );
            Err(Outcome::redirect(SERIES_PATH))
        }
        Err(e) => {
            tracing::warn!(series_id = %id, error = %e, "visibility check could not load series");
            Err(Outcome::redirect(SERIES_PATH))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(role: &str) -> CurrentUser {
        CurrentUser(Some(AuthUser {
            id: Uuid::from_u128(7),
            role: role.to_string(),
            access_level: 1,
        }))
    }

    #[test]
    fn anonymous_request_goes_to_login() {
        let result = authorize(CurrentUser(None), ADMIN_ONLY);
        assert_eq!(result.unwrap_err(), Outcome::redirect(LOGIN_PATH));
    }

    #[test]
    fn empty_guard_list_still_needs_a_user() {
        let result = authorize(CurrentUser(None), &[]);
        assert_eq!(result.unwrap_err(), Outcome::redirect(LOGIN_PATH));
    }

    #[test]
    fn reader_passes_signed_in_but_not_admin() {
        assert!(authorize(reader("reader"), SIGNED_IN).is_ok());
        assert_eq!(
            authorize(reader("reader"), ADMIN_ONLY).unwrap_err(),
            Outcome::redirect(ROOT_PATH)
        );
    }

    #[test]
    fn admin_passes_every_guard() {
        let user = authorize(reader("admin"), ADMIN_ONLY).unwrap();
        assert!(user.is_admin());
    }
}
