//! Actor identity and capability.
//!
//! The identity provider resolves credentials outside the core; what
//! reaches us is a name plus a capability. Role checks always go
//! through [`Role`], never a raw boolean supplied by the caller.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Operator,
    Administrator,
}

impl Role {
    pub fn is_administrator(self) -> bool {
        matches!(self, Role::Administrator)
    }
}

/// A resolved acting user, supplied by the caller on every operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn operator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Operator,
        }
    }

    pub fn administrator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Administrator,
        }
    }
}
