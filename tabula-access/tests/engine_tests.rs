use proptest::prelude::*;
use tabula_access::{Action, Actor, AuthorizationRequest, PermissionContext, can, can_named};
use tabula_model::{BaseRole, PlatformRole, Visibility};
use tabula_types::{BaseId, UserId};

fn user(can_create_bases: bool) -> Actor {
    Actor {
        user_id: UserId::new(10),
        platform_role: PlatformRole::User,
        can_create_bases,
    }
}

fn sysadmin() -> Actor {
    Actor {
        user_id: UserId::new(1),
        platform_role: PlatformRole::Sysadmin,
        can_create_bases: false,
    }
}

fn base_request(
    actor: Actor,
    visibility: Visibility,
    is_owner: bool,
    membership_role: Option<BaseRole>,
) -> AuthorizationRequest {
    AuthorizationRequest::BaseScoped(PermissionContext {
        actor,
        base_id: BaseId::new(5),
        base_visibility: visibility,
        is_owner,
        membership_role,
    })
}

// ── Scenario: private base owner ─────────────────────────────────

#[test]
fn owner_of_private_base_can_update_records() {
    let req = base_request(user(false), Visibility::Private, true, None);
    assert!(can(&req, Action::RecordsUpdate));
    assert!(can(&req, Action::SchemaManage));
    assert!(can(&req, Action::MembersManage));
    assert!(can(&req, Action::BaseDelete));
    assert!(can(&req, Action::BaseVisibility));
    assert!(can(&req, Action::BaseView));
}

#[test]
fn owner_cannot_create_bases_without_flag() {
    let req = base_request(user(false), Visibility::Private, true, None);
    assert!(!can(&req, Action::BasesCreate));

    let req = base_request(user(true), Visibility::Private, true, None);
    assert!(can(&req, Action::BasesCreate));
}

// ── Scenario: commenter on private base ──────────────────────────

#[test]
fn commenter_reads_and_comments_but_cannot_write() {
    let req = base_request(user(false), Visibility::Private, false, Some(BaseRole::Commenter));
    assert!(can(&req, Action::RecordsRead));
    assert!(can(&req, Action::CommentsCreate));
    assert!(can(&req, Action::BaseView));
    assert!(!can(&req, Action::RecordsCreate));
    assert!(!can(&req, Action::RecordsUpdate));
    assert!(!can(&req, Action::RecordsDelete));
}

#[test]
fn viewer_cannot_comment() {
    let req = base_request(user(false), Visibility::Private, false, Some(BaseRole::Viewer));
    assert!(can(&req, Action::RecordsRead));
    assert!(!can(&req, Action::CommentsCreate));
}

// ── Scenario: public base stranger ───────────────────────────────

#[test]
fn stranger_on_public_base_is_a_viewer() {
    let req = base_request(user(false), Visibility::Public, false, None);
    assert!(can(&req, Action::BaseView));
    assert!(can(&req, Action::RecordsRead));
    assert!(!can(&req, Action::RecordsCreate));
    assert!(!can(&req, Action::CommentsCreate));
    assert!(!can(&req, Action::SchemaManage));
}

#[test]
fn stranger_on_private_base_is_denied_everything() {
    let req = base_request(user(false), Visibility::Private, false, None);
    for action in Action::ALL {
        assert!(!can(&req, action), "{action} should be denied");
    }
}

// ── Platform scope ───────────────────────────────────────────────

#[test]
fn platform_scope_only_answers_platform_actions() {
    let req = AuthorizationRequest::PlatformScoped(user(true));
    assert!(can(&req, Action::BasesCreate));
    assert!(!can(&req, Action::PlatformUsersManage));
    assert!(!can(&req, Action::BaseView));
    assert!(!can(&req, Action::RecordsRead));
}

#[test]
fn only_sysadmin_manages_users() {
    let req = AuthorizationRequest::PlatformScoped(sysadmin());
    assert!(can(&req, Action::PlatformUsersManage));

    let req = base_request(user(true), Visibility::Public, true, Some(BaseRole::Editor));
    assert!(!can(&req, Action::PlatformUsersManage));
}

#[test]
fn unknown_action_names_fail_closed() {
    let req = AuthorizationRequest::PlatformScoped(sysadmin());
    assert!(!can_named(&req, "bases:destroy_everything"));
    assert!(can_named(&req, "bases:create"));
}

// ── Properties ───────────────────────────────────────────────────

fn visibility_strategy() -> impl Strategy<Value = Visibility> {
    prop_oneof![Just(Visibility::Public), Just(Visibility::Private)]
}

fn role_strategy() -> impl Strategy<Value = Option<BaseRole>> {
    prop_oneof![
        Just(None),
        Just(Some(BaseRole::Viewer)),
        Just(Some(BaseRole::Commenter)),
        Just(Some(BaseRole::Editor)),
    ]
}

fn request_strategy() -> impl Strategy<Value = AuthorizationRequest> {
    let actor = (any::<bool>(), any::<bool>()).prop_map(|(admin, create)| Actor {
        user_id: UserId::new(3),
        platform_role: if admin { PlatformRole::Sysadmin } else { PlatformRole::User },
        can_create_bases: create,
    });
    let scoped = (actor.clone(), visibility_strategy(), any::<bool>(), role_strategy()).prop_map(
        |(actor, visibility, owner, role)| base_request(actor, visibility, owner, role),
    );
    prop_oneof![scoped, actor.prop_map(AuthorizationRequest::PlatformScoped)]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop::sample::select(Action::ALL.to_vec())
}

proptest! {
    #[test]
    fn decisions_are_deterministic(req in request_strategy(), action in action_strategy()) {
        prop_assert_eq!(can(&req, action), can(&req, action));
    }

    #[test]
    fn sysadmin_is_allowed_everything(
        visibility in visibility_strategy(),
        owner in any::<bool>(),
        role in role_strategy(),
        action in action_strategy(),
    ) {
        let req = base_request(sysadmin(), visibility, owner, role);
        prop_assert!(can(&req, action));
        prop_assert!(can(&AuthorizationRequest::PlatformScoped(sysadmin()), action));
    }

    #[test]
    fn members_never_get_owner_administration(
        visibility in visibility_strategy(),
        role in role_strategy(),
        action in action_strategy(),
    ) {
        prop_assume!(action.is_owner_administrative());
        let req = base_request(user(true), visibility, false, role);
        prop_assert!(!can(&req, action));
    }

    #[test]
    fn higher_roles_allow_a_superset(
        visibility in visibility_strategy(),
        action in action_strategy(),
    ) {
        let roles = [BaseRole::Viewer, BaseRole::Commenter, BaseRole::Editor];
        for pair in roles.windows(2) {
            let lower = base_request(user(false), visibility, false, Some(pair[0]));
            let higher = base_request(user(false), visibility, false, Some(pair[1]));
            prop_assert!(!can(&lower, action) || can(&higher, action));
        }
    }
}
