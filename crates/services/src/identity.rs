//! Identity & Role Resolver.
//!
//! Turns a verified actor id into the explicit `Actor` context every
//! handler receives. Recomputed on every request; nothing is cached.

use std::sync::Arc;

use domains::{Profile, ProfileRepository, Result, Role};
use uuid::Uuid;

/// The authenticated actor of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    /// Absent until the actor registers a display name.
    pub profile: Option<Profile>,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role, profile: None }
    }

    pub fn has_elevated_privileges(&self) -> bool {
        self.role.has_elevated_privileges()
    }

    pub fn is_super(&self) -> bool {
        self.role.is_super()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.name.as_str())
    }
}

pub struct RoleResolver {
    profiles: Arc<dyn ProfileRepository>,
}

impl RoleResolver {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// A missing profile row resolves to the lowest privilege.
    pub async fn resolve(&self, actor_id: Uuid) -> Result<Actor> {
        let profile = self.profiles.find(actor_id).await?;
        let role = profile.as_ref().map_or(Role::Poster, |p| p.role);
        tracing::debug!(actor = %actor_id, role = %role, "resolved actor");
        Ok(Actor {
            id: actor_id,
            role,
            profile,
        })
    }
}
