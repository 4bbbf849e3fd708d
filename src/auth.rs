use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ImportError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Teacher => f.write_str("teacher"),
            Role::Student => f.write_str("student"),
            Role::Unknown => f.write_str("unknown"),
        }
    }
}

/// Body returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub role: Role,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Identity of the signed-in user, handed explicitly to the API client and
/// to command guards.
///
/// Empty at start, filled on login, cleared on logout. The CLI persists it as
/// JSON so consecutive invocations share one login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    access_token: Option<String>,
    role: Option<Role>,
    student_id: Option<String>,
}

impl AuthContext {
    pub fn from_login(resp: LoginResponse) -> Self {
        Self {
            access_token: Some(resp.access_token),
            role: Some(resp.role),
            student_id: resp.student_id.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().map(|t| !t.is_empty()).unwrap_or(false)
    }

    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    /// Guard for role-restricted commands.
    pub fn require_role(&self, role: Role) -> Result<()> {
        if !self.is_authenticated() {
            return Err(ImportError::Unauthorized("not logged in".to_string()));
        }
        match self.role {
            Some(r) if r == role => Ok(()),
            Some(r) => Err(ImportError::Unauthorized(format!("requires {} role, signed in as {}", role, r))),
            None => Err(ImportError::Unauthorized(format!("requires {} role", role))),
        }
    }

    /// Reads a persisted context; a missing file is an empty context.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no saved session");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        info!(path = %path.display(), role = ?self.role, "session saved");
        Ok(())
    }

    /// Logout: forgets the identity and removes the persisted copy.
    pub fn clear(&mut self, path: &Path) -> Result<()> {
        *self = Self::default();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
