//! Shared fixtures for platform tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tabula_core::{
    Actor, AuditSink, DomainError, DomainResult, ErrorKind, Platform, PlatformConfig,
};
use tabula_model::{AuditEvent, Base, BaseRole, PlatformRole, Visibility, Workspace};
use tabula_store::{Store, users};
use tabula_types::ManualClock;

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// Captures audit events in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: &AuditEvent) -> DomainResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Rejects every event.
pub struct FailingSink;

impl AuditSink for FailingSink {
    fn record(&self, _event: &AuditEvent) -> DomainResult<()> {
        Err(DomainError::internal())
    }
}

pub struct Fixture {
    pub platform: Platform,
    pub clock: Arc<ManualClock>,
    pub audit: Arc<RecordingSink>,
    pub owner: Actor,
    pub member: Actor,
    pub stranger: Actor,
    pub admin: Actor,
    pub workspace: Workspace,
    pub base: Base,
}

impl Fixture {
    /// Adds `member` to the fixture base with `role`.
    pub fn grant(&self, role: BaseRole) {
        self.platform
            .add_member(Some(&self.owner), self.base.id, self.member.user_id, role)
            .unwrap();
    }
}

fn user(platform: &Platform, email: &str) -> Actor {
    let u = platform.create_user(email, email).unwrap();
    platform.load_actor(u.id).unwrap()
}

/// An in-memory platform with an owner, a private base in their
/// workspace, and three other users: a future member, a stranger and a
/// SYSADMIN.
pub fn fixture() -> Fixture {
    init_tracing();
    let clock = Arc::new(ManualClock::new(start()));
    let audit = Arc::new(RecordingSink::default());
    let platform = Platform::new(Store::open_in_memory().unwrap(), PlatformConfig::default())
        .with_clock(clock.clone())
        .with_audit_sink(audit.clone());

    let owner = user(&platform, "owner@example.com");
    let member = user(&platform, "member@example.com");
    let stranger = user(&platform, "stranger@example.com");
    let admin_id = user(&platform, "admin@example.com").user_id;
    platform
        .store()
        .transaction(|tx| users::set_platform_role(tx, admin_id, PlatformRole::Sysadmin))
        .unwrap();
    let admin = platform.load_actor(admin_id).unwrap();

    let workspace = platform.create_workspace(Some(&owner), "Main").unwrap();
    let base = platform
        .create_base(Some(&owner), workspace.id, "CRM", Visibility::Private)
        .unwrap();

    Fixture {
        platform,
        clock,
        audit,
        owner,
        member,
        stranger,
        admin,
        workspace,
        base,
    }
}

/// Asserts a result failed with `kind`.
#[track_caller]
pub fn assert_kind<T: std::fmt::Debug>(result: DomainResult<T>, kind: ErrorKind) {
    match result {
        Ok(v) => panic!("expected {kind}, got Ok({v:?})"),
        Err(e) => assert_eq!(e.kind, kind, "{e}"),
    }
}
