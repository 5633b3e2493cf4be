use super::{Platform, authorize_platform};
use crate::error::{DomainError, DomainResult};
use tabula_access::{Action, Actor};
use tabula_model::{AuditAction, AuditEvent, PlatformRole, User};
use tabula_store::users;
use tabula_types::UserId;

impl Platform {
    /// Registers a user. New users may create bases.
    pub fn create_user(&self, email: &str, display_name: &str) -> DomainResult<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(DomainError::bad_request("email is required"));
        }
        let display_name = display_name.trim();
        let now = self.now();
        self.store.transaction(|tx| {
            users::insert(tx, &email, display_name, PlatformRole::User, true, now).map_err(|e| {
                if e.is_unique_violation() {
                    DomainError::conflict("email already registered")
                } else {
                    e.into()
                }
            })
        })
    }

    pub fn get_user(&self, id: UserId) -> DomainResult<User> {
        self.store
            .read(|conn| users::get(conn, id))?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    /// Builds the actor for an authenticated user id.
    pub fn load_actor(&self, id: UserId) -> DomainResult<Actor> {
        let user = self.get_user(id)?;
        Ok(Actor {
            user_id: user.id,
            platform_role: user.platform_role,
            can_create_bases: user.can_create_bases,
        })
    }

    pub fn set_platform_role(
        &self,
        actor: Option<&Actor>,
        user: UserId,
        role: PlatformRole,
    ) -> DomainResult<()> {
        let admin = authorize_platform(actor, Action::PlatformUsersManage)?;
        let now = self.now();
        self.store.transaction(|tx| {
            if !users::set_platform_role(tx, user, role)? {
                return Err(DomainError::not_found("user"));
            }
            Ok(())
        })?;
        self.emit(
            AuditEvent::new(AuditAction::UserUpdated, format!("platform role of user {user} set to {role}"), now)
                .by(admin.user_id)
                .with_details(serde_json::json!({ "user_id": user, "platform_role": role })),
        );
        Ok(())
    }

    pub fn set_can_create_bases(
        &self,
        actor: Option<&Actor>,
        user: UserId,
        allowed: bool,
    ) -> DomainResult<()> {
        let admin = authorize_platform(actor, Action::PlatformUsersManage)?;
        let now = self.now();
        self.store.transaction(|tx| {
            if !users::set_can_create_bases(tx, user, allowed)? {
                return Err(DomainError::not_found("user"));
            }
            Ok(())
        })?;
        self.emit(
            AuditEvent::new(AuditAction::UserUpdated, format!("base creation for user {user} set to {allowed}"), now)
                .by(admin.user_id)
                .with_details(serde_json::json!({ "user_id": user, "can_create_bases": allowed })),
        );
        Ok(())
    }
}
