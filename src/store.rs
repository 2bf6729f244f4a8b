//! Document store boundary over Sled.
//!
//! Records are Serde-serialized JSON documents, one tree per collection.
//! The store is opened once at startup with every tree and index created
//! up front, so no request ever races on initialization. Sled gives
//! per-document atomicity for single writes; there is no cross-document
//! transaction anywhere in this system.
//!
//! Indexes:
//! - `users_by_email`: unique index, email bytes -> user id. Claimed with
//!   compare-and-swap so concurrent registrations cannot both win.
//! - `<collection>_by_business`: secondary index, `business_id/id` -> id,
//!   used by the tenancy layer for scoped listing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sled::{Db, Tree};

use crate::models::{Business, Role, User};

/// Every business-owned collection. Admin cascade deletion and startup
/// index creation iterate this list so a new collection cannot be missed
/// in one place but not the other.
pub const SCOPED_COLLECTIONS: &[&str] = &[
    "products",
    "websites",
    "campaigns",
    "posters",
    "customers",
    "chatlogs",
    "assets",
];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),
    #[error("corrupt document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct Store {
    db: Db,
    users: Tree,
    users_by_email: Tree,
    businesses: Tree,
}

impl Store {
    /// Open (or create) the database and all collection and index trees.
    /// `open_tree` is idempotent, so re-running this at startup is safe.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let users = db.open_tree("users")?;
        let users_by_email = db.open_tree("users_by_email")?;
        let businesses = db.open_tree("businesses")?;
        for name in SCOPED_COLLECTIONS {
            db.open_tree(name)?;
            db.open_tree(format!("{name}_by_business"))?;
        }
        Ok(Self {
            db,
            users,
            users_by_email,
            businesses,
        })
    }

    pub(crate) fn tree(&self, name: &str) -> Result<Tree, StoreError> {
        Ok(self.db.open_tree(name)?)
    }

    // ----- users ----------------------------------------------------------

    /// Atomically claim an email for a new user. Returns `false` if the
    /// email is already taken; the caller maps that to a 409.
    pub fn claim_email(&self, email: &str, user_id: &str) -> Result<bool, StoreError> {
        let outcome = self.users_by_email.compare_and_swap(
            email.as_bytes(),
            None::<&[u8]>,
            Some(user_id.as_bytes()),
        )?;
        Ok(outcome.is_ok())
    }

    pub fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        write_doc(&self.users, user.id.as_bytes(), user)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        read_doc(&self.users, id.as_bytes())
    }

    /// Case-sensitive exact match through the unique index.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        match self.users_by_email.get(email.as_bytes())? {
            Some(id) => read_doc(&self.users, &id),
            None => Ok(None),
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::new();
        for item in self.users.iter() {
            let (_, bytes) = item?;
            users.push(serde_json::from_slice(&bytes)?);
        }
        Ok(users)
    }

    /// Removes the user document and releases its email claim.
    pub fn delete_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.remove(user.id.as_bytes())?;
        self.users_by_email.remove(user.email.as_bytes())?;
        Ok(())
    }

    pub fn count_users_with_role(&self, role: Role) -> Result<u64, StoreError> {
        let mut count = 0;
        for item in self.users.iter() {
            let (_, bytes) = item?;
            let user: User = serde_json::from_slice(&bytes)?;
            if user.role == role {
                count += 1;
            }
        }
        Ok(count)
    }

    // ----- businesses -----------------------------------------------------

    pub fn insert_business(&self, business: &Business) -> Result<(), StoreError> {
        write_doc(&self.businesses, business.id.as_bytes(), business)
    }

    pub fn get_business(&self, id: &str) -> Result<Option<Business>, StoreError> {
        read_doc(&self.businesses, id.as_bytes())
    }

    /// Merge non-null patch fields into the business document. Returns the
    /// updated record, or `None` if the business does not exist. An empty
    /// patch is the caller's validation problem, not ours.
    pub fn patch_business(&self, id: &str, patch: &Value) -> Result<Option<Business>, StoreError> {
        let Some(bytes) = self.businesses.get(id.as_bytes())? else {
            return Ok(None);
        };
        let mut doc: Value = serde_json::from_slice(&bytes)?;
        apply_patch(&mut doc, patch);
        self.businesses
            .insert(id.as_bytes(), serde_json::to_vec(&doc)?)?;
        Ok(Some(serde_json::from_value(doc)?))
    }

    pub fn business_count(&self) -> u64 {
        self.businesses.len() as u64
    }

    pub fn collection_count(&self, name: &str) -> Result<u64, StoreError> {
        Ok(self.tree(name)?.len() as u64)
    }

    // ----- admin cascade --------------------------------------------------

    /// Delete the business document and every document in every scoped
    /// collection owned by it. Runs as independent single-document removes;
    /// a crash mid-way leaves a partially deleted business.
    pub fn purge_business(&self, business_id: &str) -> Result<(), StoreError> {
        for name in SCOPED_COLLECTIONS {
            let tree = self.tree(name)?;
            let index = self.tree(&format!("{name}_by_business"))?;
            let prefix = format!("{business_id}/");
            for item in index.scan_prefix(prefix.as_bytes()) {
                let (index_key, id) = item?;
                tree.remove(&id)?;
                index.remove(&index_key)?;
            }
        }
        self.businesses.remove(business_id.as_bytes())?;
        Ok(())
    }
}

pub(crate) fn read_doc<T: DeserializeOwned>(
    tree: &Tree,
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    match tree.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub(crate) fn write_doc<T: Serialize>(tree: &Tree, key: &[u8], doc: &T) -> Result<(), StoreError> {
    tree.insert(key, serde_json::to_vec(doc)?)?;
    Ok(())
}

/// Merge partial-update semantics: only fields present and non-null in
/// `patch` are copied into `doc`. Returns how many fields were applied so
/// callers can reject a patch that changes nothing.
pub fn apply_patch(doc: &mut Value, patch: &Value) -> usize {
    let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) else {
        return 0;
    };
    let mut applied = 0;
    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        target.insert(key.clone(), value.clone());
        applied += 1;
    }
    applied
}

/// Count the non-null fields of a patch body without applying it.
pub fn patch_field_count(patch: &Value) -> usize {
    patch
        .as_object()
        .map(|fields| fields.values().filter(|v| !v.is_null()).count())
        .unwrap_or(0)
}

#[cfg(test)]
pub(crate) fn temp_store() -> Store {
    let dir = std::env::temp_dir().join(format!("bizmate_test_{}", crate::models::new_id()));
    Store::open(dir.to_str().expect("temp path")).expect("open temp store")
}
