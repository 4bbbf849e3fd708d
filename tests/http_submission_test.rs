use anyhow::Result;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use wellbeing_import::app::{
    auth_use_case, directory_use_case, BatchSubmitter, CheckinFilter, ImportSession, SessionStatus, StudentFilter,
};
use wellbeing_import::auth::{AuthContext, LoginResponse, Role};
use wellbeing_import::config::ApiConfig;
use wellbeing_import::error::ImportError;
use wellbeing_import::infra::ReqwestHttp;
use wellbeing_import::pipeline::ImportPipeline;
use wellbeing_import::types::{PasswordChange, TeacherRegistration};

const ROSTER_CSV: &str = "student_id,full_name,class_id\nHS001,Nguyen Van A,10A1\nHS002,Tran Thi B,10A1\n";
const BEHAVIOR_CSV: &str = "student_id,check_date,attendance,discipline_score\nHS001,2024-01-15,true,10\n";

async fn create_students(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "Bearer token-123")
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})));
    }
    let created: Vec<Value> = body
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|s| {
            let id = s["student_id"].as_str().unwrap_or_default();
            json!({
                "student_id": id,
                "full_name": s["full_name"],
                "generated_username": id.to_lowercase(),
                "generated_password": format!("pw-{}", id),
            })
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(created)))
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["username"] == "teacher01" && body["password"] == "secret" {
        (
            StatusCode::OK,
            Json(json!({"access_token": "token-123", "role": "teacher", "student_id": null})),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Incorrect username or password"})))
    }
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "Bearer token-123")
        .unwrap_or(false)
}

async fn students(headers: HeaderMap) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {"student_id": "HS001", "full_name": "Nguyen Van A", "class_id": "10A1", "risk_level": "Xanh"},
            {"student_id": "HS002", "full_name": "Tran Thi B", "class_id": "10A1", "risk_level": "Đỏ"},
            {"student_id": "HS003", "full_name": "Le Minh C", "class_id": "11B2", "risk_level": "Vàng"}
        ])),
    )
}

async fn checkins() -> impl IntoResponse {
    Json(json!([
        {"form_id": 1, "student_id": "HS001", "student_name": "Nguyen Van A", "class_id": "10A1",
         "mood_rating": 5, "ai_sentiment": "positive", "created_at": "2024-01-15T08:00:00"},
        {"form_id": 2, "student_id": "HS002", "student_name": "Tran Thi B", "class_id": "10A1",
         "mood_rating": 1, "ai_sentiment": "negative", "original_feedback": "Em bi bat nat",
         "file_path": "uploads/2.jpg", "file_type": "image/jpeg"}
    ]))
}

async fn register_teacher(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})));
    }
    if body["username"] == "gv_taken" {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Username already exists"})));
    }
    (StatusCode::OK, Json(json!({"message": format!("Created {}", body["username"].as_str().unwrap_or_default())})))
}

async fn change_password(Json(body): Json<Value>) -> impl IntoResponse {
    if body["old_password"] != "old-pass" {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "Old password is incorrect"})));
    }
    (StatusCode::OK, Json(json!({})))
}

fn app() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register-teacher", post(register_teacher))
        .route("/auth/change-password", post(change_password))
        .route("/teacher/students", get(students))
        .route("/teacher/checkins", get(checkins))
        .route("/teacher/create-students-bulk/", post(create_students))
        .route(
            "/teacher/submit-behavior-bulk/",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
        .route(
            "/teacher/rejecting-bulk/",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": "Student HS001 does not exist"})),
                )
            }),
        )
}

fn spawn_server() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;
    let server = axum::Server::from_tcp(listener)?.serve(app().into_make_service());
    tokio::spawn(server);
    Ok(addr)
}

fn api_for(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        base_url: format!("http://{}", addr),
        ..ApiConfig::default()
    }
}

fn teacher() -> AuthContext {
    AuthContext::from_login(LoginResponse {
        access_token: "token-123".to_string(),
        role: Role::Teacher,
        student_id: None,
    })
}

fn session(api: &ApiConfig, pipeline: ImportPipeline, auth: AuthContext) -> ImportSession {
    let http = Arc::new(ReqwestHttp::new(api.clone(), auth));
    ImportSession::new(pipeline, BatchSubmitter::new(http))
}

#[tokio::test]
async fn test_login_against_server() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let http = ReqwestHttp::new(api.clone(), AuthContext::default());

    let auth = auth_use_case::login(&http, &api.login_path, "teacher01", "secret").await?;
    assert_eq!(auth.bearer(), Some("token-123"));
    assert_eq!(auth.role(), Some(Role::Teacher));

    let err = auth_use_case::login(&http, &api.login_path, "teacher01", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Unauthorized(ref m) if m == "Incorrect username or password"));
    Ok(())
}

#[tokio::test]
async fn test_roster_upload_returns_credentials() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let session = session(&api, ImportPipeline::student_roster(&api), teacher());

    session.on_file_selected("roster.csv", ROSTER_CSV);
    let result = session.confirm_submit().await?.expect("submission should run");

    let credentials = result.credentials().expect("roster returns credentials");
    assert_eq!(credentials.len(), 2);
    assert_eq!(credentials[0].student_id, "HS001");
    assert_eq!(credentials[0].username, "hs001");
    assert_eq!(credentials[1].password, "pw-HS002");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Succeeded);
    assert!(snapshot.batch.is_empty());
    assert_eq!(snapshot.result, Some(result));
    Ok(())
}

#[tokio::test]
async fn test_missing_token_is_rejected_with_server_detail() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let session = session(&api, ImportPipeline::student_roster(&api), AuthContext::default());

    session.on_file_selected("roster.csv", ROSTER_CSV);
    let err = session.confirm_submit().await.unwrap_err();
    assert!(matches!(err, ImportError::RemoteRejection { status: 401, .. }));
    assert_eq!(session.snapshot().error_message.as_deref(), Some("Not authenticated"));
    Ok(())
}

#[tokio::test]
async fn test_server_error_keeps_batch_for_retry() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let session = session(&api, ImportPipeline::behavior_checkins(&api), teacher());

    session.on_file_selected("behavior.csv", BEHAVIOR_CSV);
    let err = session.confirm_submit().await.unwrap_err();
    assert!(matches!(err, ImportError::RemoteRejection { status: 500, .. }));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Failed);
    assert_eq!(snapshot.batch.len(), 1);
    assert_eq!(snapshot.error_message.as_deref(), Some("upstream exploded"));
    assert!(snapshot.can_submit());
    Ok(())
}

#[tokio::test]
async fn test_json_detail_becomes_error_message() -> Result<()> {
    let addr = spawn_server()?;
    let mut api = api_for(addr);
    api.behavior_bulk_path = "/teacher/rejecting-bulk/".to_string();
    let session = session(&api, ImportPipeline::behavior_checkins(&api), teacher());

    session.on_file_selected("behavior.csv", BEHAVIOR_CSV);
    assert!(session.confirm_submit().await.is_err());
    assert_eq!(
        session.snapshot().error_message.as_deref(),
        Some("Student HS001 does not exist")
    );
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_failure() -> Result<()> {
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?
    };
    let api = api_for(closed);
    let http = Arc::new(ReqwestHttp::new(api.clone(), teacher()));
    let pipeline = ImportPipeline::behavior_checkins(&api);
    let session = ImportSession::new(pipeline, BatchSubmitter::new(http));

    session.on_file_selected("behavior.csv", BEHAVIOR_CSV);
    let err = session.confirm_submit().await.unwrap_err();
    assert!(matches!(err, ImportError::Network(_)));
    assert!(err.is_retryable());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Failed);
    assert_eq!(snapshot.batch.len(), 1);
    assert!(snapshot.result.is_none());
    Ok(())
}

#[tokio::test]
async fn test_student_listing_is_filtered_locally() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let http = ReqwestHttp::new(api.clone(), teacher());

    let all = directory_use_case::list_students(&http, &api.students_path, &StudentFilter::default()).await?;
    assert_eq!(all.len(), 3);

    let filter = StudentFilter { class_id: Some("10A1".into()), search: Some("tran".into()), ..Default::default() };
    let found = directory_use_case::list_students(&http, &api.students_path, &filter).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].risk_level.as_deref(), Some("Đỏ"));

    let anonymous = ReqwestHttp::new(api.clone(), AuthContext::default());
    let err = directory_use_case::list_students(&anonymous, &api.students_path, &StudentFilter::default())
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Not authenticated");
    Ok(())
}

#[tokio::test]
async fn test_checkin_listing_by_sentiment() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let http = ReqwestHttp::new(api.clone(), teacher());

    let filter = CheckinFilter { sentiment: Some("negative".into()), ..Default::default() };
    let list = directory_use_case::list_checkins(&http, &api.checkins_path, &filter).await?;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].student_id, "HS002");
    assert_eq!(list[0].mood_label(), "very sad");
    assert_eq!(list[0].file_path.as_deref(), Some("uploads/2.jpg"));
    Ok(())
}

#[tokio::test]
async fn test_register_teacher_against_server() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let http = ReqwestHttp::new(api.clone(), teacher());
    let registration = TeacherRegistration {
        username: "gv_nguyenvana".into(),
        password: "Secret123".into(),
        full_name: "Nguyen Van A".into(),
        email: "vana@school.edu.vn".into(),
    };

    let message = auth_use_case::register_teacher(&http, &api.register_teacher_path, &registration).await?;
    assert_eq!(message, "Created gv_nguyenvana");

    let taken = TeacherRegistration { username: "gv_taken".into(), ..registration };
    let err = auth_use_case::register_teacher(&http, &api.register_teacher_path, &taken)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::RemoteRejection { status: 400, .. }));
    assert_eq!(err.user_message(), "Username already exists");
    Ok(())
}

#[tokio::test]
async fn test_change_password_against_server() -> Result<()> {
    let addr = spawn_server()?;
    let api = api_for(addr);
    let http = ReqwestHttp::new(api.clone(), AuthContext::default());
    let change = PasswordChange {
        username: "hs001".into(),
        old_password: "old-pass".into(),
        new_password: "new-pass".into(),
    };

    let message = auth_use_case::change_password(&http, &api.change_password_path, &change).await?;
    assert_eq!(message, "Password changed");

    let wrong = PasswordChange { old_password: "guess-1".into(), ..change };
    let err = auth_use_case::change_password(&http, &api.change_password_path, &wrong)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Old password is incorrect");
    Ok(())
}
