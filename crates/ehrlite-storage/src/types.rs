//! Patient record types shared by storage backends and the HTTP layer.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Store-assigned patient identifier. Always positive.
pub type PatientId = u64;

/// Upper bound accepted for `age`.
pub const MAX_AGE: u32 = 150;

/// Whether a patient is currently under care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    Active,
    Inactive,
}

impl PatientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

/// Caller-supplied patient attributes.
///
/// Used both for creation and as the partial payload of an update, so every
/// field is optional. `None` means "not supplied"; an update leaves such
/// fields untouched. Unknown keys are rejected during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PatientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

macro_rules! merge_present {
    ($dst:expr, $src:expr, [$($field:ident),+ $(,)?]) => {
        $(
            if let Some(value) = $src.$field {
                $dst.$field = Some(value);
            }
        )+
    };
}

impl PatientFields {
    /// Returns `true` when no field is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks field values. Absent fields are always valid.
    pub fn validate(&self) -> Result<(), StorageError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(StorageError::invalid_record("name must not be empty"));
            }
        }
        if let Some(age) = self.age {
            if age > MAX_AGE {
                return Err(StorageError::invalid_record(format!(
                    "age must be between 0 and {MAX_AGE}"
                )));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(StorageError::invalid_record(
                    "email must contain '@'",
                ));
            }
        }
        Ok(())
    }

    /// Shallow merge: every field present in `update` overwrites the
    /// corresponding field of `self`.
    pub fn merge(&mut self, update: PatientFields) {
        merge_present!(
            self,
            update,
            [
                name,
                age,
                gender,
                date_of_birth,
                phone,
                email,
                address,
                diagnosis,
                last_visit,
                status,
                notes,
            ]
        );
    }
}

/// A stored patient: the identifier plus its fields, serialized flat
/// (`{"id": 1, "name": "Jane", "age": 28}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    #[serde(flatten)]
    pub fields: PatientFields,
}

impl PatientRecord {
    #[must_use]
    pub fn new(id: PatientId, fields: PatientFields) -> Self {
        Self { id, fields }
    }
}
