//! First-party user identifier shared across auctions.
//!
//! The id lives in local storage when the page allows it and in a cookie
//! otherwise. It is rewritten on every auction so the cookie expiry slides.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::constants::{USER_ID_COOKIE_EXPIRY_MS, USER_ID_KEY, USER_ID_LENGTH};
use crate::cookies::{create_cookie, get_cookie};
use crate::host::HostEnvironment;

/// Read the stored user id, discarding values of the wrong shape.
pub fn get_user_id<E: HostEnvironment + ?Sized>(env: &E) -> Option<String> {
    let uid = if env.local_storage_enabled() {
        env.local_storage_get(USER_ID_KEY)
    } else {
        get_cookie(env, USER_ID_KEY)
    };

    match uid {
        Some(uid) if uid.len() == USER_ID_LENGTH => Some(uid),
        Some(uid) => {
            log::debug!("Discarding stored user id of length {}", uid.len());
            None
        }
        None => None,
    }
}

/// Persist the user id to every storage the host allows.
pub fn set_user_id<E: HostEnvironment + ?Sized>(env: &E, user_id: &str, now: DateTime<Utc>) {
    if env.local_storage_enabled() {
        env.local_storage_set(USER_ID_KEY, user_id);
    }

    if env.cookies_enabled() {
        let expires = now + Duration::milliseconds(USER_ID_COOKIE_EXPIRY_MS);
        env.set_cookie(&create_cookie(USER_ID_KEY, user_id, expires));
    }
}

/// Generates a fresh 36-character user id.
#[must_use]
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// Gets the stored user id or creates one, then writes it back.
pub fn get_or_generate_user_id<E: HostEnvironment + ?Sized>(env: &E) -> String {
    let user_id = get_user_id(env).unwrap_or_else(|| {
        let fresh_id = generate_user_id();
        log::debug!("No stored user id found, generated {fresh_id}");
        fresh_id
    });

    set_user_id(env, &user_id, Utc::now());
    user_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MemoryEnvironment;
    use crate::test_support::tests::test_environment;

    const STORED_ID: &str = "77016c8d-6c6e-40cb-8801-1060089b5c60";

    #[test]
    fn test_generate_user_id_has_expected_length() {
        assert_eq!(generate_user_id().len(), USER_ID_LENGTH);
    }

    #[test]
    fn test_get_or_generate_user_id_generate_new() {
        let env = test_environment();

        let user_id = get_or_generate_user_id(&env);
        assert_eq!(user_id.len(), 36);
        assert_eq!(
            env.local_storage_get(USER_ID_KEY).as_deref(),
            Some(user_id.as_str())
        );
        assert_eq!(get_cookie(&env, USER_ID_KEY), Some(user_id));
    }

    #[test]
    fn test_get_or_generate_user_id_with_local_storage() {
        let env = test_environment();
        env.local_storage_set(USER_ID_KEY, STORED_ID);

        assert_eq!(get_or_generate_user_id(&env), STORED_ID);
    }

    #[test]
    fn test_get_or_generate_user_id_regenerates_invalid() {
        let env = test_environment();
        env.local_storage_set(USER_ID_KEY, "foo");

        let user_id = get_or_generate_user_id(&env);
        assert_ne!(user_id, "foo");
        assert_eq!(user_id.len(), 36);
    }

    #[test]
    fn test_get_user_id_falls_back_to_cookie() {
        let env = MemoryEnvironment::default()
            .with_local_storage(false)
            .with_cookies(true);
        set_user_id(&env, STORED_ID, Utc::now());

        assert_eq!(get_user_id(&env).as_deref(), Some(STORED_ID));
    }

    #[test]
    fn test_get_user_id_ignores_cookie_when_local_storage_available() {
        let env = test_environment();
        env.set_cookie(&create_cookie(
            USER_ID_KEY,
            STORED_ID,
            Utc::now() + Duration::days(1),
        ));

        assert_eq!(get_user_id(&env), None);
    }

    #[test]
    fn test_set_user_id_cookie_expires_in_thirty_days() {
        let now = DateTime::from_timestamp(Utc::now().timestamp(), 0).expect("should truncate now");
        let env = MemoryEnvironment::default()
            .with_local_storage(false)
            .with_cookies(true);

        set_user_id(&env, STORED_ID, now);

        let snapshot = env.snapshot();
        let cookie = snapshot
            .cookies
            .get(USER_ID_KEY)
            .expect("should write user id cookie");
        assert_eq!(cookie.value, STORED_ID);
        assert_eq!(cookie.expires, Some(now + Duration::days(30)));
        assert_eq!(USER_ID_COOKIE_EXPIRY_MS, 2_592_000_000);
    }

    #[test]
    fn test_set_user_id_skips_cookie_when_disabled() {
        let env = test_environment().with_cookies(false);

        set_user_id(&env, STORED_ID, Utc::now());

        let snapshot = env.snapshot();
        assert!(snapshot.cookies.is_empty());
        assert_eq!(
            snapshot.local_storage.get(USER_ID_KEY).map(String::as_str),
            Some(STORED_ID)
        );
    }

    #[test]
    fn test_user_id_is_reused_across_auctions() {
        let env = test_environment();

        let first = get_or_generate_user_id(&env);
        let second = get_or_generate_user_id(&env);
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_or_generate_user_id_without_storage() {
        let env = MemoryEnvironment::default()
            .with_local_storage(false)
            .with_cookies(false);

        let first = get_or_generate_user_id(&env);
        let second = get_or_generate_user_id(&env);
        assert_eq!(first.len(), 36);
        assert_ne!(first, second, "nothing persists without storage");
    }
}
