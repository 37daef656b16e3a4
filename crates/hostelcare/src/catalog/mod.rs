//! Catalog of serviceable complaint categories.

pub(crate) mod router;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HostelError;
use crate::identity::{Role, User};
use crate::ids::ComplaintTypeId;
use crate::store::{ComplaintRepository, ComplaintTypeRepository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintType {
    pub id: ComplaintTypeId,
    pub name: String,
    pub description: String,
    pub expected_response_hours: Option<u32>,
}

/// Inbound payload for a new category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplaintType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expected_response_hours: Option<u32>,
}

/// Lookup plus admin-only mutation. Types still referenced by a complaint
/// cannot be removed.
pub struct ComplaintTypeRegistry<S> {
    store: Arc<S>,
    writes: Mutex<()>,
}

impl<S> ComplaintTypeRegistry<S>
where
    S: ComplaintTypeRepository + ComplaintRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    pub fn list(&self) -> Result<Vec<ComplaintType>, HostelError> {
        let mut types = self.store.all_complaint_types()?;
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    pub fn get(&self, id: ComplaintTypeId) -> Result<ComplaintType, HostelError> {
        self.store
            .fetch_complaint_type(id)?
            .ok_or_else(|| HostelError::NotFound(format!("complaint type {id}")))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<ComplaintType>, HostelError> {
        Ok(self.store.find_complaint_type_by_name(name.trim())?)
    }

    pub fn add(
        &self,
        actor: &User,
        new_type: NewComplaintType,
    ) -> Result<ComplaintType, HostelError> {
        require_admin(actor, "add complaint types")?;
        let _writes = self.writes.lock();
        self.insert_unique(new_type)
    }

    /// Return the type with this name, creating a bare entry when missing.
    pub fn ensure(&self, actor: &User, name: &str) -> Result<ComplaintType, HostelError> {
        require_admin(actor, "add complaint types")?;
        let _writes = self.writes.lock();
        if let Some(existing) = self.store.find_complaint_type_by_name(name.trim())? {
            return Ok(existing);
        }
        self.insert_unique(NewComplaintType {
            name: name.to_string(),
            description: String::new(),
            expected_response_hours: None,
        })
    }

    pub fn remove(&self, actor: &User, id: ComplaintTypeId) -> Result<ComplaintType, HostelError> {
        require_admin(actor, "remove complaint types")?;
        let _writes = self.writes.lock();

        let existing = self.get(id)?;
        let references = self.store.count_complaints_of_type(id)?;
        if references > 0 {
            return Err(still_referenced(&existing.name, references));
        }

        match self.store.remove_complaint_type(id) {
            Ok(()) => {}
            // a complaint was filed after the count
            Err(RepositoryError::Conflict(_)) => {
                let references = self.store.count_complaints_of_type(id)?;
                return Err(still_referenced(&existing.name, references));
            }
            Err(err) => return Err(err.into()),
        }
        info!(complaint_type = %id, name = %existing.name, "complaint type removed");
        Ok(existing)
    }

    fn insert_unique(&self, new_type: NewComplaintType) -> Result<ComplaintType, HostelError> {
        let name = new_type.name.trim().to_string();
        if name.is_empty() {
            return Err(HostelError::Validation(
                "complaint type name must not be blank".to_string(),
            ));
        }
        if self.store.find_complaint_type_by_name(&name)?.is_some() {
            return Err(HostelError::Validation(format!(
                "complaint type '{name}' already exists"
            )));
        }

        let created = self.store.insert_complaint_type(NewComplaintType {
            name,
            description: new_type.description.trim().to_string(),
            expected_response_hours: new_type.expected_response_hours,
        })?;
        info!(complaint_type = %created.id, name = %created.name, "complaint type added");
        Ok(created)
    }
}

fn still_referenced(name: &str, references: usize) -> HostelError {
    HostelError::Validation(format!(
        "complaint type '{name}' is referenced by {references} complaint(s) and cannot be removed"
    ))
}

fn require_admin(actor: &User, action: &str) -> Result<(), HostelError> {
    if actor.role() == Role::Admin {
        Ok(())
    } else {
        Err(HostelError::Authorization(format!(
            "only administrators can {action}"
        )))
    }
}
