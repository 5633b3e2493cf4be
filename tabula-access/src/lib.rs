//! Authorization for Tabula.
//!
//! Two layers:
//! - **Resolver**: turns an authenticated [`Actor`] and a target base into a
//!   [`PermissionContext`] (ownership, visibility, membership role).
//! - **Engine**: [`can`] maps an [`AuthorizationRequest`] and an [`Action`]
//!   to allow/deny. It is pure, total and never fails; unknown action names
//!   are denied.
//!
//! Decisions that are not about a particular base (creating bases, managing
//! users) use [`AuthorizationRequest::PlatformScoped`] instead of a fake base.

mod action;
mod context;
mod engine;
mod error;
mod resolver;

pub use action::{Action, ActionScope};
pub use context::{Actor, AuthorizationRequest, PermissionContext};
pub use engine::{can, can_named, resolve_effective_base_role};
pub use error::AccessError;
pub use resolver::{BaseAccess, BaseLookup, resolve_global, resolve_permission_context};
