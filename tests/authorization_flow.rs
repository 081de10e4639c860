// End-to-end authorization flows exercised through the API layer

mod common;

use poem_openapi::auth::Bearer;
use poem_openapi::{param::Path, payload::Json};

use fleetops_backend::api::auth::DASHBOARD_ROUTE;
use fleetops_backend::api::helpers::BearerAuth;
use fleetops_backend::errors::auth::AuthError;
use fleetops_backend::errors::rbac::RbacError;
use fleetops_backend::services::authorization::ADMIN_ROLE_NAME;
use fleetops_backend::types::dto::auth::LoginRequest;
use fleetops_backend::types::dto::rbac::{BulkOverrideRequest, GrantRequest, OverrideRequest};
use fleetops_backend::types::internal::permissions::{Action, PermissionSet};

use common::{seed_user, setup_test_app, TestApp};

fn bearer(token: &str) -> BearerAuth {
    BearerAuth(Bearer {
        token: token.to_string(),
    })
}

async fn login(app: &TestApp, username: &str, password: &str) -> Result<String, AuthError> {
    let response = app
        .auth_api
        .login(Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }))
        .await?;
    Ok(response.0.access_token)
}

/// Seed an "Administrador" user and return a bearer token for them
async fn seed_admin(app: &TestApp) -> String {
    let role = app
        .catalog
        .create_role(ADMIN_ROLE_NAME.to_string(), None)
        .await
        .unwrap();
    seed_user(app, "admin", Some(role.id)).await;
    login(app, "admin", "testpass").await.unwrap()
}

#[tokio::test]
async fn test_operator_flow_with_overrides() {
    let app = setup_test_app().await;
    let admin_token = seed_admin(&app).await;

    // Catalog: two pages, one role with a view-only grant on each
    let role = app
        .catalog
        .create_role("Operador".to_string(), None)
        .await
        .unwrap();
    let entregas = app
        .catalog
        .create_page(
            "entregas".to_string(),
            "Entregas".to_string(),
            "/entregas".to_string(),
            Some("truck".to_string()),
            1,
        )
        .await
        .unwrap();
    let reportes = app
        .catalog
        .create_page(
            "reportes".to_string(),
            "Reportes".to_string(),
            "/reportes".to_string(),
            None,
            2,
        )
        .await
        .unwrap();
    for page_id in [entregas.id, reportes.id] {
        app.rbac_api
            .upsert_grant(
                bearer(&admin_token),
                Path(role.id),
                Json(GrantRequest {
                    page_id,
                    view: true,
                    create: false,
                    edit: false,
                    delete: false,
                }),
            )
            .await
            .unwrap();
    }

    let operator_id = seed_user(&app, "operador1", Some(role.id)).await;
    let token = login(&app, "operador1", "testpass").await.unwrap();

    // Overrides: grant edit on entregas, revoke view on reportes
    app.rbac_api
        .replace_overrides(
            bearer(&admin_token),
            Path(operator_id.clone()),
            Json(BulkOverrideRequest {
                overrides: vec![
                    OverrideRequest {
                        page_id: entregas.id,
                        view: None,
                        create: None,
                        edit: Some(true),
                        delete: None,
                    },
                    OverrideRequest {
                        page_id: reportes.id,
                        view: Some(false),
                        create: None,
                        edit: None,
                        delete: None,
                    },
                ],
            }),
        )
        .await
        .unwrap();

    // Resolution: role grant + override merge
    assert!(app
        .authz
        .resolve(&operator_id, "entregas", Action::View)
        .await
        .unwrap());
    assert!(app
        .authz
        .resolve(&operator_id, "entregas", Action::Edit)
        .await
        .unwrap());
    assert!(!app
        .authz
        .resolve(&operator_id, "reportes", Action::View)
        .await
        .unwrap());

    // The menu drops reportes (view revoked) and keeps entregas
    let menu = app.auth_api.menu(bearer(&token)).await.unwrap();
    assert_eq!(menu.len(), 2);
    assert_eq!(menu[0].route, DASHBOARD_ROUTE);
    assert_eq!(menu[1].name, "entregas");

    // The profile reports the merged permission set
    let me = app.auth_api.me(bearer(&token)).await.unwrap();
    assert_eq!(me.role.as_deref(), Some("Operador"));
    let entregas_perms = me
        .permissions
        .iter()
        .find(|p| p.page == "entregas")
        .unwrap();
    assert!(entregas_perms.view);
    assert!(entregas_perms.edit);
    assert!(!entregas_perms.delete);
}

#[tokio::test]
async fn test_admin_bypass_covers_pages_without_grants() {
    let app = setup_test_app().await;
    let admin_token = seed_admin(&app).await;

    // No grant rows exist for this page at all
    app.catalog
        .create_page(
            "reportes".to_string(),
            "Reportes".to_string(),
            "/reportes".to_string(),
            None,
            1,
        )
        .await
        .unwrap();

    let me = app.auth_api.me(bearer(&admin_token)).await.unwrap();
    assert_eq!(me.role.as_deref(), Some(ADMIN_ROLE_NAME));
    let reportes = me.permissions.iter().find(|p| p.page == "reportes").unwrap();
    assert!(reportes.view && reportes.create && reportes.edit && reportes.delete);

    let menu = app.auth_api.menu(bearer(&admin_token)).await.unwrap();
    assert!(menu.iter().any(|item| item.name == "reportes"));
}

#[tokio::test]
async fn test_lockout_and_admin_unlock_through_the_api() {
    let app = setup_test_app().await;
    let admin_token = seed_admin(&app).await;
    let user_id = seed_user(&app, "carlos", None).await;

    // Four failures stay on invalid credentials
    for _ in 0..4 {
        match login(&app, "carlos", "wrong").await {
            Err(AuthError::InvalidCredentials(_)) => {}
            other => panic!("Expected InvalidCredentials, got {:?}", other),
        }
    }

    // The fifth failure locks the account
    match login(&app, "carlos", "wrong").await {
        Err(AuthError::AccountLocked(_)) => {}
        other => panic!("Expected AccountLocked, got {:?}", other),
    }

    // The correct password is refused while locked
    match login(&app, "carlos", "testpass").await {
        Err(AuthError::AccountLocked(_)) => {}
        other => panic!("Expected AccountLocked, got {:?}", other),
    }

    // Admin unlock restores access immediately
    app.user_api
        .unlock_user(bearer(&admin_token), Path(user_id))
        .await
        .unwrap();

    assert!(login(&app, "carlos", "testpass").await.is_ok());
}

#[tokio::test]
async fn test_bulk_replace_leaves_exactly_the_submitted_set() {
    let app = setup_test_app().await;
    let admin_token = seed_admin(&app).await;
    let user_id = seed_user(&app, "maria", None).await;

    let mut page_ids = Vec::new();
    for (i, name) in ["entregas", "reportes", "usuarios"].iter().enumerate() {
        let page = app
            .catalog
            .create_page(
                name.to_string(),
                name.to_string(),
                format!("/{}", name),
                None,
                i as i32,
            )
            .await
            .unwrap();
        page_ids.push(page.id);
    }

    let full_set: Vec<OverrideRequest> = page_ids
        .iter()
        .map(|&page_id| OverrideRequest {
            page_id,
            view: Some(true),
            create: None,
            edit: None,
            delete: None,
        })
        .collect();
    let first = app
        .rbac_api
        .replace_overrides(
            bearer(&admin_token),
            Path(user_id.clone()),
            Json(BulkOverrideRequest {
                overrides: full_set,
            }),
        )
        .await
        .unwrap();
    assert_eq!(first.len(), 3);

    // A smaller replacement discards the rows it does not mention
    let second = app
        .rbac_api
        .replace_overrides(
            bearer(&admin_token),
            Path(user_id.clone()),
            Json(BulkOverrideRequest {
                overrides: vec![OverrideRequest {
                    page_id: page_ids[0],
                    view: Some(false),
                    create: None,
                    edit: None,
                    delete: None,
                }],
            }),
        )
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].page_id, page_ids[0]);
    assert_eq!(second[0].view, Some(false));

    let listed = app
        .rbac_api
        .list_overrides(bearer(&admin_token), Path(user_id))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_deleted_override_restores_role_inheritance() {
    let app = setup_test_app().await;
    let admin_token = seed_admin(&app).await;

    let role = app
        .catalog
        .create_role("Supervisor".to_string(), None)
        .await
        .unwrap();
    let page = app
        .catalog
        .create_page(
            "entregas".to_string(),
            "Entregas".to_string(),
            "/entregas".to_string(),
            None,
            1,
        )
        .await
        .unwrap();
    app.catalog
        .upsert_grant(
            role.id,
            page.id,
            PermissionSet {
                view: true,
                ..PermissionSet::NONE
            },
        )
        .await
        .unwrap();
    let user_id = seed_user(&app, "sup1", Some(role.id)).await;

    app.rbac_api
        .replace_overrides(
            bearer(&admin_token),
            Path(user_id.clone()),
            Json(BulkOverrideRequest {
                overrides: vec![OverrideRequest {
                    page_id: page.id,
                    view: Some(false),
                    create: None,
                    edit: None,
                    delete: None,
                }],
            }),
        )
        .await
        .unwrap();
    assert!(!app
        .authz
        .resolve(&user_id, "entregas", Action::View)
        .await
        .unwrap());

    app.rbac_api
        .delete_override(
            bearer(&admin_token),
            Path(user_id.clone()),
            Path(page.id),
        )
        .await
        .unwrap();

    // With the override gone the role grant applies again
    assert!(app
        .authz
        .resolve(&user_id, "entregas", Action::View)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_management_surface_is_closed_to_non_admins() {
    let app = setup_test_app().await;
    seed_admin(&app).await;
    seed_user(&app, "plain", None).await;
    let token = login(&app, "plain", "testpass").await.unwrap();

    match app.rbac_api.list_roles(bearer(&token)).await {
        Err(RbacError::Forbidden(_)) => {}
        other => panic!("Expected Forbidden, got {:?}", other),
    }
}
