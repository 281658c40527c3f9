//! Session identity persistence
//!
//! Two ids with different lifetimes: the device id is created once and never
//! changes; the visitor id groups one playthrough and rotates on restart,
//! alongside a monotonically increasing session counter. Identity is handled
//! as an explicit value passed through the engine rather than read from
//! ambient storage.

use crate::db::settings::{get_setting, set_setting};
use crate::{uuid_utils, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

const KEY_DEVICE_ID: &str = "htl_device_id";
const KEY_VISITOR_ID: &str = "htl_visitor_id";
const KEY_SESSION_NUMBER: &str = "htl_session_number";

/// The local visitor's identity triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Permanent, identifies the installation; never rotates
    pub device_id: Uuid,
    /// Groups one playthrough; rotates on full-session reset
    pub visitor_id: Uuid,
    /// 1-based counter of playthroughs on this device
    pub session_number: i64,
}

/// Loads and rotates the persisted identity
pub struct IdentityStore {
    pool: SqlitePool,
}

impl IdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the identity, creating any missing part
    ///
    /// First run creates device id, visitor id, and session number 1;
    /// subsequent runs return the stored values unchanged.
    pub async fn load_or_create(&self) -> Result<SessionIdentity> {
        let device_id = match get_setting::<Uuid>(&self.pool, KEY_DEVICE_ID).await? {
            Some(id) => id,
            None => {
                let id = uuid_utils::generate();
                set_setting(&self.pool, KEY_DEVICE_ID, id).await?;
                info!("Created device id {}", id);
                id
            }
        };

        let visitor_id = match get_setting::<Uuid>(&self.pool, KEY_VISITOR_ID).await? {
            Some(id) => id,
            None => {
                let id = uuid_utils::generate();
                set_setting(&self.pool, KEY_VISITOR_ID, id).await?;
                info!("Created visitor id {}", id);
                id
            }
        };

        let session_number = match get_setting::<i64>(&self.pool, KEY_SESSION_NUMBER).await? {
            Some(n) => n,
            None => {
                set_setting(&self.pool, KEY_SESSION_NUMBER, 1i64).await?;
                1
            }
        };

        Ok(SessionIdentity {
            device_id,
            visitor_id,
            session_number,
        })
    }

    /// Rotate the identity for a fresh playthrough
    ///
    /// Keeps the device id, issues a new visitor id, increments the session
    /// counter, and persists both before returning the new identity.
    pub async fn rotate(&self, current: SessionIdentity) -> Result<SessionIdentity> {
        let visitor_id = uuid_utils::generate();
        let session_number = current.session_number + 1;

        set_setting(&self.pool, KEY_VISITOR_ID, visitor_id).await?;
        set_setting(&self.pool, KEY_SESSION_NUMBER, session_number).await?;
        info!(
            "Rotated identity: visitor {} session {}",
            visitor_id, session_number
        );

        Ok(SessionIdentity {
            device_id: current.device_id,
            visitor_id,
            session_number,
        })
    }
}
