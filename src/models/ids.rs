use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::validation::{self, ValidationError};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse a 24-character hexadecimal record id.
            pub fn parse(raw: &str) -> Result<Self, ValidationError> {
                let trimmed = raw.trim();
                if validation::is_record_id(trimmed) {
                    Ok(Self(trimmed.to_string()))
                } else {
                    Err(ValidationError::InvalidId(raw.to_string()))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(
    /// Id of a job posting.
    JobId
);

record_id!(
    /// Id of the candidate record created by an application. Used as the
    /// AI status polling key.
    SubjectId
);
