// ABOUTME: End-to-end tests over the assembled router
// ABOUTME: Exercises auth, role scoping, and the task/folder/document flows

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tandem_api::{create_router, AppState};
use tandem_auth::JwtConfig;
use tandem_core::Role;
use tandem_documents::LocalFileStore;
use tandem_notify::LogMailer;
use tandem_users::UserCreateInput;

struct TestApp {
    router: axum::Router,
    admin_token: String,
    manager_token: String,
    manager_id: String,
    client_token: String,
    client_id: String,
    _uploads: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let pool = tandem_storage::connect_in_memory().await.unwrap();
    let jwt = JwtConfig::new("integration-test-secret-with-length", 15);
    let uploads = tempfile::tempdir().unwrap();

    let state = AppState::with_collaborators(
        pool,
        jwt.clone(),
        Arc::new(LocalFileStore::new(uploads.path())),
        Arc::new(LogMailer),
    );

    let mut tokens = Vec::new();
    let mut ids = Vec::new();
    for (email, role) in [
        ("admin@example.com", Role::Admin),
        ("manager@example.com", Role::ProjectManager),
        ("client@example.com", Role::Client),
    ] {
        let user = state
            .users
            .create_user(UserCreateInput {
                email: email.to_string(),
                name: email.split('@').next().unwrap().to_string(),
                password: "a-long-enough-password".to_string(),
                role: Some(role),
            })
            .await
            .unwrap();
        tokens.push(tandem_auth::generate_access_token(&user.id, role, &jwt).unwrap());
        ids.push(user.id);
    }

    TestApp {
        router: create_router(state),
        admin_token: tokens.remove(0),
        manager_token: tokens.remove(0),
        manager_id: ids[1].clone(),
        client_token: tokens.remove(0),
        client_id: ids[2].clone(),
        _uploads: uploads,
    }
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_project(app: &TestApp, token: &str, name: &str, client_id: Option<&str>) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/projects",
        Some(token),
        Some(json!({ "name": name, "clientId": client_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_login_and_me() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "a-long-enough-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert!(body["data"]["user"].get("password_hash").is_none());

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@example.com");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = spawn_app().await;

    let (status, _) = send(&app, "GET", "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/projects", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_project_visibility_per_role() {
    let app = spawn_app().await;

    // Admin creates a project owned by the client, managed by nobody
    let project = create_project(&app, &app.admin_token, "Client Portal", Some(&app.client_id)).await;
    let project_id = project["id"].as_str().unwrap();

    // The owning client can view it
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        Some(&app.client_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // An unassigned manager cannot even see it exists
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        Some(&app.manager_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The client cannot mutate it
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/projects/{project_id}"),
        Some(&app.client_token),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // And cannot create projects at all
    let (status, _) = send(
        &app,
        "POST",
        "/api/projects",
        Some(&app.client_token),
        Some(json!({ "name": "Nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_manager_owns_created_projects() {
    let app = spawn_app().await;

    let project = create_project(&app, &app.manager_token, "Managed", None).await;
    assert_eq!(project["managerId"].as_str().unwrap(), app.manager_id);

    // Listed for the manager, invisible to the client
    let (_, body) = send(&app, "GET", "/api/projects", Some(&app.manager_token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/projects", Some(&app.client_token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_task_completion_flow() {
    let app = spawn_app().await;
    let project = create_project(&app, &app.manager_token, "P", None).await;
    let project_id = project["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/projects/{project_id}/tasks"),
        Some(&app.manager_token),
        Some(json!({ "taskName": "Build it" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task = &body["data"];
    assert_eq!(task["status"], "todo");
    assert_eq!(task["progress"], 0);
    let task_id = task["id"].as_str().unwrap();

    // Quick-update slider to 100
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/projects/{project_id}/tasks/{task_id}/progress"),
        Some(&app.manager_token),
        Some(json!({ "progress": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert!(body["data"]["completedAt"].is_string());

    // Project progress followed
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        Some(&app.manager_token),
        None,
    )
    .await;
    assert_eq!(body["data"]["progress"], 100);
}

#[tokio::test]
async fn test_subtask_cascade_delete() {
    let app = spawn_app().await;
    let project = create_project(&app, &app.manager_token, "P", None).await;
    let project_id = project["id"].as_str().unwrap();

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/projects/{project_id}/tasks"),
        Some(&app.manager_token),
        Some(json!({ "taskName": "Main" })),
    )
    .await;
    let main_id = body["data"]["id"].as_str().unwrap().to_string();

    for name in ["S1", "S2"] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/projects/{project_id}/tasks/{main_id}/subtasks"),
            Some(&app.manager_token),
            Some(json!({ "taskName": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/projects/{project_id}/tasks/{main_id}"),
        Some(&app.manager_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}/tasks"),
        Some(&app.manager_token),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_folder_conflicts_surface_as_409() {
    let app = spawn_app().await;
    let project = create_project(&app, &app.manager_token, "P", None).await;
    let project_id = project["id"].as_str().unwrap();

    // The root folder came with the project
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/folders/project/{project_id}"),
        Some(&app.manager_token),
        None,
    )
    .await;
    let tree = body["data"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    let root_id = tree[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/folders/project/{project_id}"),
        Some(&app.manager_token),
        Some(json!({ "name": "Specs", "parentFolderId": root_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let specs_id = body["data"]["id"].as_str().unwrap().to_string();

    // Duplicate sibling name
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/folders/project/{project_id}"),
        Some(&app.manager_token),
        Some(json!({ "name": "Specs", "parentFolderId": root_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Moving the parent into its child
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/folders/project/{project_id}"),
        Some(&app.manager_token),
        Some(json!({ "name": "Inner", "parentFolderId": specs_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let inner_id = body["data"]["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/folders/{specs_id}/move"),
        Some(&app.manager_token),
        Some(json!({ "newParentFolderId": inner_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Root deletion, forced or not
    for uri in [
        format!("/api/folders/{root_id}"),
        format!("/api/folders/{root_id}?force=true"),
    ] {
        let (status, _) = send(&app, "DELETE", &uri, Some(&app.manager_token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

#[tokio::test]
async fn test_document_upload_and_visibility() {
    let app = spawn_app().await;
    let project = create_project(&app, &app.admin_token, "P", Some(&app.client_id)).await;
    let project_id = project["id"].as_str().unwrap();

    // Admin uploads one public and one private document
    for (title, public) in [("Public doc", true), ("Private doc", false)] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/documents/project/{project_id}"),
            Some(&app.admin_token),
            Some(json!({
                "title": title,
                "fileName": "notes.txt",
                "isPublic": public,
                "data": "aGVsbG8gd29ybGQ=",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // The owning client cannot upload
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/documents/project/{project_id}"),
        Some(&app.client_token),
        Some(json!({ "title": "X", "fileName": "x.txt", "data": "eA==" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin sees both; the client only the public one
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/documents/project/{project_id}"),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/documents/project/{project_id}"),
        Some(&app.client_token),
        None,
    )
    .await;
    let visible = body["data"].as_array().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["title"], "Public doc");

    // Deleting reports the file cleanup outcome
    let document_id = visible[0]["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/documents/{document_id}"),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fileRemoved"], true);
}

#[tokio::test]
async fn test_messages_flow() {
    let app = spawn_app().await;
    let project = create_project(&app, &app.admin_token, "P", Some(&app.client_id)).await;
    let project_id = project["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&app.client_token),
        Some(json!({
            "projectId": project_id,
            "receiverId": "some-admin",
            "body": "When is the next milestone?",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    // Only the receiver can mark it read
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/messages/{message_id}/read"),
        Some(&app.client_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Project-scoped sends require view access
    let (status, _) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&app.manager_token),
        Some(json!({
            "projectId": project_id,
            "receiverId": app.client_id,
            "body": "I should not see this project",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_change_is_admin_only() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{}/role", app.client_id),
        Some(&app.client_token),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{}/role", app.client_id),
        Some(&app.admin_token),
        Some(json!({ "role": "project_manager" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "project_manager");
}

#[tokio::test]
async fn test_stats_endpoints() {
    let app = spawn_app().await;
    let project = create_project(&app, &app.manager_token, "P", None).await;
    let project_id = project["id"].as_str().unwrap();

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/projects/{project_id}/tasks"),
        Some(&app.manager_token),
        Some(json!({ "taskName": "T" })),
    )
    .await;
    let task_id = body["data"]["id"].as_str().unwrap().to_string();
    send(
        &app,
        "PUT",
        &format!("/api/projects/{project_id}/tasks/{task_id}/progress"),
        Some(&app.manager_token),
        Some(json!({ "progress": 100 })),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/stats/project/{project_id}"),
        Some(&app.manager_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tasks"]["completed"], 1);
    assert_eq!(body["data"]["progress"], 100);

    let (status, body) = send(&app, "GET", "/api/stats/overview", Some(&app.manager_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalProjects"], 1);
    assert_eq!(body["data"]["completedTasks"], 1);

    // Clients have no overview
    let (status, _) = send(&app, "GET", "/api/stats/overview", Some(&app.client_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
