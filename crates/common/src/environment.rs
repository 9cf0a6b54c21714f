//! In-memory [`HostEnvironment`] used by offline hosts and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use cookie::Cookie;
use serde::{Deserialize, Serialize};

use crate::host::{HostEnvironment, PageInfo, Viewport};

/// Serializable state of a [`MemoryEnvironment`].
///
/// Lets an offline host persist storage between auctions so identifiers are
/// reused the same way a browser would reuse them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    #[serde(default)]
    pub page: PageInfo,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_true")]
    pub local_storage_enabled: bool,
    #[serde(default = "default_true")]
    pub cookies_enabled: bool,
    #[serde(default)]
    pub local_storage: HashMap<String, String>,
    #[serde(default)]
    pub cookies: BTreeMap<String, StoredCookie>,
}

/// A cookie value and the instant it stops being visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    /// `None` for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

fn default_true() -> bool {
    true
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            page: PageInfo::default(),
            viewport: Viewport::default(),
            user_agent: None,
            debug: false,
            local_storage_enabled: true,
            cookies_enabled: true,
            local_storage: HashMap::new(),
            cookies: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct MemoryEnvironment {
    page: PageInfo,
    viewport: Viewport,
    user_agent: Option<String>,
    debug: bool,
    local_storage_enabled: bool,
    cookies_enabled: bool,
    local_storage: Mutex<HashMap<String, String>>,
    cookies: Mutex<BTreeMap<String, StoredCookie>>,
}

impl Default for MemoryEnvironment {
    fn default() -> Self {
        Self::from_snapshot(EnvironmentSnapshot::default())
    }
}

impl MemoryEnvironment {
    #[must_use]
    pub fn new(page: PageInfo, viewport: Viewport) -> Self {
        Self {
            page,
            viewport,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_local_storage(mut self, enabled: bool) -> Self {
        self.local_storage_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_cookies(mut self, enabled: bool) -> Self {
        self.cookies_enabled = enabled;
        self
    }

    #[must_use]
    pub fn from_snapshot(snapshot: EnvironmentSnapshot) -> Self {
        let now = Utc::now();
        let mut cookies = snapshot.cookies;
        cookies.retain(|_, cookie| !cookie.is_expired(now));

        Self {
            page: snapshot.page,
            viewport: snapshot.viewport,
            user_agent: snapshot.user_agent,
            debug: snapshot.debug,
            local_storage_enabled: snapshot.local_storage_enabled,
            cookies_enabled: snapshot.cookies_enabled,
            local_storage: Mutex::new(snapshot.local_storage),
            cookies: Mutex::new(cookies),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        let now = Utc::now();
        let cookies = self
            .cookie_jar()
            .iter()
            .filter(|(_, cookie)| !cookie.is_expired(now))
            .map(|(name, cookie)| (name.clone(), cookie.clone()))
            .collect();

        EnvironmentSnapshot {
            page: self.page.clone(),
            viewport: self.viewport,
            user_agent: self.user_agent.clone(),
            debug: self.debug,
            local_storage_enabled: self.local_storage_enabled,
            cookies_enabled: self.cookies_enabled,
            local_storage: self.storage().clone(),
            cookies,
        }
    }

    /// Clear local storage and cookies.
    pub fn clear(&self) {
        self.storage().clear();
        self.cookie_jar().clear();
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.local_storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cookie_jar(&self) -> MutexGuard<'_, BTreeMap<String, StoredCookie>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cookie_header_at(&self, now: DateTime<Utc>) -> Option<String> {
        if !self.cookies_enabled {
            return None;
        }
        let header = self
            .cookie_jar()
            .iter()
            .filter(|(_, cookie)| !cookie.is_expired(now))
            .map(|(name, cookie)| format!("{}={}", name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }

    fn set_cookie_at(&self, cookie: &str, now: DateTime<Utc>) {
        if !self.cookies_enabled {
            return;
        }
        let parsed = match Cookie::parse(cookie.to_string()) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Ignoring unparsable cookie assignment: {e}");
                return;
            }
        };

        // Max-Age wins over Expires.
        let expires = match parsed.max_age() {
            Some(max_age) => Some(now + Duration::seconds(max_age.whole_seconds())),
            None => parsed
                .expires_datetime()
                .and_then(|expires| DateTime::from_timestamp(expires.unix_timestamp(), 0)),
        };
        let stored = StoredCookie {
            value: parsed.value().to_string(),
            expires,
        };

        let mut jar = self.cookie_jar();
        if stored.is_expired(now) {
            jar.remove(parsed.name());
        } else {
            jar.insert(parsed.name().to_string(), stored);
        }
    }
}

impl HostEnvironment for MemoryEnvironment {
    fn page(&self) -> PageInfo {
        self.page.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn debug_enabled(&self) -> bool {
        self.debug
    }

    fn local_storage_enabled(&self) -> bool {
        self.local_storage_enabled
    }

    fn local_storage_get(&self, key: &str) -> Option<String> {
        if !self.local_storage_enabled {
            return None;
        }
        self.storage().get(key).cloned()
    }

    fn local_storage_set(&self, key: &str, value: &str) {
        if !self.local_storage_enabled {
            return;
        }
        self.storage().insert(key.to_string(), value.to_string());
    }

    fn cookies_enabled(&self) -> bool {
        self.cookies_enabled
    }

    fn cookie_header(&self) -> Option<String> {
        self.cookie_header_at(Utc::now())
    }

    fn set_cookie(&self, cookie: &str) {
        self.set_cookie_at(cookie, Utc::now());
    }
}
