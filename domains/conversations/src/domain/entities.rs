//! Domain entities for Conversations domain
//!
//! A conversation is a stored doctor/patient consultation record. Records are
//! listed by the API; the relay endpoint never reads or writes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medrelay_common::{Error, Result};

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub description: String,
    pub patient: String,
    pub doctor: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation
    pub fn new(description: String, patient: String, doctor: String) -> Result<Self> {
        Self::validate_required("Description", &description)?;
        Self::validate_required("Patient", &patient)?;
        Self::validate_required("Doctor", &doctor)?;

        let now = Utc::now();
        Ok(Conversation {
            id: Uuid::new_v4(),
            description,
            patient,
            doctor,
            created_at: now,
            updated_at: now,
        })
    }

    /// Required text fields (CHECK (length(trim(field)) > 0))
    fn validate_required(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!(
                "{} is required and cannot be blank",
                field
            )));
        }
        Ok(())
    }
}
