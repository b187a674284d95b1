// models/usermodel.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role reported by the external auth service. The settlement engine never
/// verifies credentials itself; it only checks which party the caller is.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Freelancer,
    Admin,
}

/// Authenticated caller identity, as handed over by the auth collaborator.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
