//! Typed records over the client key-value stores.
//!
//! Every durable flag this core persists goes through one narrow interface
//! with versioned JSON payloads, instead of ad hoc key lookups scattered
//! through the codebase. Corrupt or unknown-version records are dropped and
//! read as absent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mostrador_core::{AuthUserId, KeyValueStore, Organization, StorageError};

use crate::impersonation::{PROVISIONING_GUARD_VERSION, ProvisioningGuard};

const VIEWED_ORGANIZATION_KEY: &str = "mostrador.organizacion_vista";
const PROVISIONING_GUARD_KEY: &str = "mostrador.provisioning_guard";
const SESSION_HINT_KEY: &str = "mostrador.session_hint";

fn password_setup_key(user_id: AuthUserId) -> String {
    format!("mostrador.password_setup_skipped.{user_id}")
}

/// Current payload version for the records owned by this module.
const RECORD_VERSION: u32 = 1;

/// A superadmin's persisted choice of organization to inspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewedOrganizationRecord {
    pub version: u32,
    pub organization: Organization,
    pub chosen_at: DateTime<Utc>,
}

impl ViewedOrganizationRecord {
    pub fn new(organization: Organization, chosen_at: DateTime<Utc>) -> Self {
        Self {
            version: RECORD_VERSION,
            organization,
            chosen_at,
        }
    }
}

/// Tab-scoped `{user_id, expires_at}` hint that short-circuits a full
/// session re-fetch on mount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionHint {
    pub version: u32,
    pub user_id: AuthUserId,
    pub expires_at: DateTime<Utc>,
}

impl SessionHint {
    pub fn new(user_id: AuthUserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            version: RECORD_VERSION,
            user_id,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The typed storage surface for the session core.
#[derive(Clone)]
pub struct RecordStore {
    durable: Arc<dyn KeyValueStore>,
    volatile: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, volatile: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, volatile }
    }

    // ── viewed organization ──────────────────────────────────────────────

    pub fn viewed_organization(&self) -> Option<ViewedOrganizationRecord> {
        self.read(&*self.durable, VIEWED_ORGANIZATION_KEY)
            .filter(|r: &ViewedOrganizationRecord| {
                self.version_ok(r.version, RECORD_VERSION, VIEWED_ORGANIZATION_KEY)
            })
    }

    pub fn put_viewed_organization(
        &self,
        record: &ViewedOrganizationRecord,
    ) -> Result<(), StorageError> {
        self.write(&*self.durable, VIEWED_ORGANIZATION_KEY, record)
    }

    pub fn clear_viewed_organization(&self) -> Result<(), StorageError> {
        self.durable.remove(VIEWED_ORGANIZATION_KEY)
    }

    // ── provisioning guard ───────────────────────────────────────────────

    pub fn provisioning_guard(&self) -> Option<ProvisioningGuard> {
        self.read(&*self.durable, PROVISIONING_GUARD_KEY)
            .filter(|r: &ProvisioningGuard| {
                self.version_ok(r.version, PROVISIONING_GUARD_VERSION, PROVISIONING_GUARD_KEY)
            })
    }

    pub fn put_provisioning_guard(&self, record: &ProvisioningGuard) -> Result<(), StorageError> {
        self.write(&*self.durable, PROVISIONING_GUARD_KEY, record)
    }

    pub fn clear_provisioning_guard(&self) -> Result<(), StorageError> {
        self.durable.remove(PROVISIONING_GUARD_KEY)
    }

    // ── session hint (volatile) ──────────────────────────────────────────

    pub fn session_hint(&self) -> Option<SessionHint> {
        self.read(&*self.volatile, SESSION_HINT_KEY)
            .filter(|r: &SessionHint| self.version_ok(r.version, RECORD_VERSION, SESSION_HINT_KEY))
    }

    pub fn put_session_hint(&self, hint: &SessionHint) -> Result<(), StorageError> {
        self.write(&*self.volatile, SESSION_HINT_KEY, hint)
    }

    pub fn clear_session_hint(&self) -> Result<(), StorageError> {
        self.volatile.remove(SESSION_HINT_KEY)
    }

    // ── password setup skipped ───────────────────────────────────────────

    pub fn skip_password_setup(&self, user_id: AuthUserId) -> Result<(), StorageError> {
        self.durable.put(&password_setup_key(user_id), "true")
    }

    pub fn password_setup_skipped(&self, user_id: AuthUserId) -> bool {
        matches!(
            self.durable.get(&password_setup_key(user_id)),
            Ok(Some(value)) if value == "true"
        )
    }

    pub fn clear_password_setup_skipped(&self, user_id: AuthUserId) -> Result<(), StorageError> {
        self.durable.remove(&password_setup_key(user_id))
    }

    // ── sign-out sweep ───────────────────────────────────────────────────

    /// Clear every client-side record tied to the session being torn down.
    /// Failures are logged, not propagated: sign-out must always complete.
    pub fn sweep_on_sign_out(&self, previous_user: Option<AuthUserId>) {
        for (name, result) in [
            ("viewed organization", self.clear_viewed_organization()),
            ("provisioning guard", self.clear_provisioning_guard()),
            ("session hint", self.clear_session_hint()),
        ] {
            if let Err(err) = result {
                warn!(record = name, error = %err, "failed to clear record on sign-out");
            }
        }
        if let Some(user_id) = previous_user {
            if let Err(err) = self.clear_password_setup_skipped(user_id) {
                warn!(%user_id, error = %err, "failed to clear password-setup flag on sign-out");
            }
        }
    }

    // ── helpers ──────────────────────────────────────────────────────────

    fn version_ok(&self, version: u32, expected: u32, key: &str) -> bool {
        if version == expected {
            return true;
        }
        warn!(key, version, "dropping stored record with unknown version");
        let _ = self.durable.remove(key);
        let _ = self.volatile.remove(key);
        false
    }

    fn read<T: DeserializeOwned>(&self, store: &dyn KeyValueStore, key: &str) -> Option<T> {
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "client storage read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(key, error = %err, "dropping corrupt stored record");
                let _ = store.remove(key);
                None
            }
        }
    }

    fn write<T: Serialize>(
        &self,
        store: &dyn KeyValueStore,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|err| StorageError::Corrupt(err.to_string()))?;
        store.put(key, &raw)
    }
}
