//! Tenancy guard: business-scoped access to owned collections.
//!
//! Handlers never touch collection trees directly; they go through a
//! [`BusinessScope`] obtained from the authenticated principal's
//! business id. The scope stamps `business_id` on every insert
//! (client-supplied values are overwritten) and filters every read,
//! update and delete on (id, business_id) jointly. A document that exists
//! under another business is reported exactly like a missing one, so
//! cross-tenant probing cannot confirm existence.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sled::Tree;

use crate::store::{apply_patch, Store, StoreError};

pub struct BusinessScope {
    tree: Tree,
    index: Tree,
    business_id: String,
}

impl Store {
    /// The only way route handlers reach business-owned data.
    pub fn scope(
        &self,
        collection: &'static str,
        business_id: &str,
    ) -> Result<BusinessScope, StoreError> {
        Ok(BusinessScope {
            tree: self.tree(collection)?,
            index: self.tree(&format!("{collection}_by_business"))?,
            business_id: business_id.to_owned(),
        })
    }
}

impl BusinessScope {
    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    fn index_key(&self, id: &str) -> String {
        format!("{}/{}", self.business_id, id)
    }

    /// Fetch the raw document only if it belongs to this scope's business.
    fn owned(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let Some(bytes) = self.tree.get(id.as_bytes())? else {
            return Ok(None);
        };
        let doc: Value = serde_json::from_slice(&bytes)?;
        let owner = doc.get("business_id").and_then(Value::as_str);
        if owner == Some(self.business_id.as_str()) {
            Ok(Some(doc))
        } else {
            Ok(None)
        }
    }

    fn write(&self, id: &str, mut doc: Value) -> Result<Value, StoreError> {
        // Stamp unconditionally: neither creation bodies nor patches can
        // set or re-home the owning business.
        if let Some(obj) = doc.as_object_mut() {
            obj.insert(
                "business_id".to_string(),
                Value::String(self.business_id.clone()),
            );
        }
        self.tree
            .insert(id.as_bytes(), serde_json::to_vec(&doc)?)?;
        self.index
            .insert(self.index_key(id).as_bytes(), id.as_bytes())?;
        Ok(doc)
    }

    pub fn insert<T: Serialize>(&self, id: &str, record: &T) -> Result<(), StoreError> {
        self.write(id, serde_json::to_value(record)?)?;
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StoreError> {
        match self.owned(id)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// All documents owned by this business, via the secondary index.
    pub fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let prefix = format!("{}/", self.business_id);
        let mut records = Vec::new();
        for item in self.index.scan_prefix(prefix.as_bytes()) {
            let (_, id) = item?;
            if let Some(bytes) = self.tree.get(&id)? {
                records.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(records)
    }

    /// Merge non-null patch fields into an owned document. `None` means
    /// missing or cross-tenant. Callers reject empty patches up front.
    pub fn update<T: DeserializeOwned>(
        &self,
        id: &str,
        patch: &Value,
    ) -> Result<Option<T>, StoreError> {
        let Some(mut doc) = self.owned(id)? else {
            return Ok(None);
        };
        apply_patch(&mut doc, patch);
        let doc = self.write(id, doc)?;
        Ok(Some(serde_json::from_value(doc)?))
    }

    /// Returns `false` when the document is missing or owned elsewhere.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        if self.owned(id)?.is_none() {
            return Ok(false);
        }
        self.tree.remove(id.as_bytes())?;
        self.index.remove(self.index_key(id).as_bytes())?;
        Ok(true)
    }
}
