//! API router.
//!
//! Routes are nested under `/api/`. Protected routes go through the
//! bearer-auth middleware; `/health`, the cron trigger, and the
//! history-update route (which accepts action tokens) stay outside it.

use axum::routing::{get, post, put};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost
/// layer); endpoint handlers use `State<ApiContext>`.
pub fn api_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route("/prescriptions", post(endpoints::prescriptions::create))
        .route("/prescriptions", get(endpoints::prescriptions::list))
        .route("/prescriptions/:id", get(endpoints::prescriptions::detail))
        .route(
            "/prescriptions/:id/reminders",
            post(endpoints::reminders::generate),
        )
        .route("/reminders", post(endpoints::reminders::create))
        .route("/reminders", get(endpoints::reminders::list))
        .route("/reminders/history", get(endpoints::reminders::list_history))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/reminders/history/:id",
            put(endpoints::reminders::update_history),
        )
        .route("/cron/sweep", post(endpoints::sweep::trigger))
        .with_state(ctx);

    Router::new().nest("/api", protected).nest("/api", unprotected)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::api::types::hash_token_hex;
    use crate::authorization::{ActionPurpose, ActionTokenStore};
    use crate::db::repository::{history, prescription as prescription_repo, user as user_repo};
    use crate::db::sqlite::open_database;
    use crate::models::{
        HistoryStatus, Medicine, NotificationMethod, NotifyBy, Prescription, ReminderHistory,
        User,
    };
    use crate::notify::tests::MockNotifier;
    use crate::reference::tests::sample_reference;

    const TOKEN: &str = "test-session-token";
    const CRON_SECRET: &str = "cron-secret";

    struct TestApi {
        ctx: ApiContext,
        db_path: PathBuf,
        user_id: Uuid,
        _tmp: tempfile::TempDir,
    }

    fn test_api() -> TestApi {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("dosera.db");

        let user_id = {
            let conn = open_database(&db_path).unwrap();
            let user = User {
                id: Uuid::new_v4(),
                name: "Asha Rao".into(),
                email: "asha@example.com".into(),
                whatsapp_number: Some("+919900112233".into()),
                push_token: None,
                notify_by: NotifyBy::Email,
                notifications_enabled: true,
                api_token_hash: Some(hash_token_hex(TOKEN)),
                created_at: Utc::now(),
            };
            user_repo::insert_user(&conn, &user).unwrap();
            user.id
        };

        let ctx = ApiContext::new(
            db_path.clone(),
            Arc::new(sample_reference()),
            Arc::new(ActionTokenStore::new()),
            Arc::new(MockNotifier::reliable()),
            None,
            chrono_tz::Asia::Kolkata,
            Some(CRON_SECRET.into()),
        );

        TestApi { ctx, db_path, user_id, _tmp: tmp }
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        builder.body(body).unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn seed_prescription(api: &TestApi) -> Uuid {
        let conn = open_database(&api.db_path).unwrap();
        let prescription = Prescription {
            id: Uuid::new_v4(),
            user_id: api.user_id,
            image: "rx.jpg".into(),
            extracted_text: "Paracetamol 500mg 1-0-1 5 days".into(),
            medicines: vec![Medicine {
                name: "Paracetamol".into(),
                dosage: "500mg".into(),
                frequency: "1-0-1".into(),
                duration: "5 days".into(),
            }],
            interactions: vec![],
            upload_date: Utc::now(),
        };
        prescription_repo::insert_prescription(&conn, &prescription).unwrap();
        prescription.id
    }

    #[tokio::test]
    async fn health_is_open() {
        let api = test_api();
        let app = api_router(api.ctx);

        let response = app.oneshot(request("GET", "/api/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn prescriptions_require_auth() {
        let api = test_api();
        let app = api_router(api.ctx);

        let response =
            app.oneshot(request("GET", "/api/prescriptions", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_is_rejected() {
        let api = test_api();
        let app = api_router(api.ctx);

        let response = app
            .oneshot(request("GET", "/api/reminders", Some("wrong-token"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_prescription_from_text() {
        let api = test_api();
        let app = api_router(api.ctx);

        let body = r#"{"text":"PCM 500mg 1-0-1 5 days\nAmoxicillin 250mg 1-1-1 7 days"}"#;
        let response = app
            .oneshot(request("POST", "/api/prescriptions", Some(TOKEN), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let medicines = json["medicines"].as_array().unwrap();
        assert_eq!(medicines.len(), 2);
        assert_eq!(medicines[0]["name"], "Paracetamol");
        assert_eq!(json["interactions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_prescription_needs_input() {
        let api = test_api();
        let app = api_router(api.ctx);

        let response = app
            .oneshot(request("POST", "/api/prescriptions", Some(TOKEN), Some("{}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn detail_hides_other_users_prescriptions() {
        let api = test_api();

        // Seed a prescription owned by someone else.
        let other_id = {
            let conn = open_database(&api.db_path).unwrap();
            let other = User {
                id: Uuid::new_v4(),
                name: "Ravi".into(),
                email: "ravi@example.com".into(),
                whatsapp_number: None,
                push_token: None,
                notify_by: NotifyBy::Email,
                notifications_enabled: true,
                api_token_hash: None,
                created_at: Utc::now(),
            };
            user_repo::insert_user(&conn, &other).unwrap();
            let prescription = Prescription {
                id: Uuid::new_v4(),
                user_id: other.id,
                image: "rx.jpg".into(),
                extracted_text: "".into(),
                medicines: vec![],
                interactions: vec![],
                upload_date: Utc::now(),
            };
            prescription_repo::insert_prescription(&conn, &prescription).unwrap();
            prescription.id
        };

        let app = api_router(api.ctx);
        let response = app
            .oneshot(request("GET", &format!("/api/prescriptions/{other_id}"), Some(TOKEN), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_reminder_validates_time() {
        let api = test_api();
        let prescription_id = seed_prescription(&api);
        let app = api_router(api.ctx);

        let body = format!(
            r#"{{"prescriptionId":"{prescription_id}","medicineName":"Paracetamol","dosage":"500mg","time":"25:00","startDate":"2024-01-01","endDate":"2024-01-07"}}"#
        );
        let response = app
            .oneshot(request("POST", "/api/reminders", Some(TOKEN), Some(&body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_and_list_reminders() {
        let api = test_api();
        let prescription_id = seed_prescription(&api);
        let app = api_router(api.ctx.clone());

        let body = format!(
            r#"{{"prescriptionId":"{prescription_id}","medicineName":"Paracetamol","dosage":"500mg","time":"08:00","startDate":"2024-01-01","endDate":"2024-01-07"}}"#
        );
        let response = app
            .oneshot(request("POST", "/api/reminders", Some(TOKEN), Some(&body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let app2 = api_router(api.ctx);
        let response = app2
            .oneshot(request("GET", "/api/reminders", Some(TOKEN), None))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["time"], "08:00");
        // Responses use the same camelCase keys the request DTOs accept.
        assert_eq!(json[0]["prescriptionId"], prescription_id.to_string());
        assert_eq!(json[0]["medicineName"], "Paracetamol");
        assert_eq!(json[0]["startDate"], "2024-01-01");
    }

    #[tokio::test]
    async fn generate_reminders_from_prescription() {
        let api = test_api();
        let prescription_id = seed_prescription(&api);
        let app = api_router(api.ctx);

        let response = app
            .oneshot(request(
                "POST",
                &format!("/api/prescriptions/{prescription_id}/reminders"),
                Some(TOKEN),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // 1-0-1 → morning and evening slots.
        let json = response_json(response).await;
        let times: Vec<&str> =
            json.as_array().unwrap().iter().map(|r| r["time"].as_str().unwrap()).collect();
        assert_eq!(times, vec!["08:00", "18:00"]);
    }

    fn seed_history_entry(api: &TestApi) -> ReminderHistory {
        let conn = open_database(&api.db_path).unwrap();
        let prescription_id = {
            let prescription = Prescription {
                id: Uuid::new_v4(),
                user_id: api.user_id,
                image: "rx.jpg".into(),
                extracted_text: "".into(),
                medicines: vec![],
                interactions: vec![],
                upload_date: Utc::now(),
            };
            prescription_repo::insert_prescription(&conn, &prescription).unwrap();
            prescription.id
        };
        let reminder =
            crate::db::repository::reminder::tests::sample_reminder(api.user_id, prescription_id);
        crate::db::repository::reminder::insert_reminder(&conn, &reminder).unwrap();

        let entry = ReminderHistory {
            id: Uuid::new_v4(),
            user_id: api.user_id,
            reminder_id: reminder.id,
            medicine_name: reminder.medicine_name.clone(),
            scheduled_time: reminder.time.clone(),
            trigger_date: Utc::now(),
            status: HistoryStatus::Sent,
            notification_method: NotificationMethod::Email,
        };
        history::insert_history(&conn, &entry).unwrap();
        entry
    }

    #[tokio::test]
    async fn owner_marks_history_taken() {
        let api = test_api();
        let entry = seed_history_entry(&api);
        let app = api_router(api.ctx);

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/reminders/history/{}", entry.id),
                Some(TOKEN),
                Some(r#"{"status":"taken"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "taken");
    }

    #[tokio::test]
    async fn action_token_marks_history_missed() {
        let api = test_api();
        let entry = seed_history_entry(&api);
        let token =
            api.ctx.tokens.mint(api.user_id, entry.id, ActionPurpose::UpdateReminderStatus);
        let app = api_router(api.ctx);

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/reminders/history/{}", entry.id))
                    .header("X-Action-Token", &token)
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"status":"missed"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "missed");
    }

    #[tokio::test]
    async fn action_token_is_single_use() {
        let api = test_api();
        let entry = seed_history_entry(&api);
        let token =
            api.ctx.tokens.mint(api.user_id, entry.id, ActionPurpose::UpdateReminderStatus);

        let build = |token: &str| {
            Request::builder()
                .method("PUT")
                .uri(format!("/api/reminders/history/{}", entry.id))
                .header("X-Action-Token", token)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"status":"taken"}"#))
                .unwrap()
        };

        let app = api_router(api.ctx.clone());
        let first = app.oneshot(build(&token)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let app2 = api_router(api.ctx);
        let second = app2.oneshot(build(&token)).await.unwrap();
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn history_update_without_credentials_is_rejected() {
        let api = test_api();
        let entry = seed_history_entry(&api);
        let app = api_router(api.ctx);

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/reminders/history/{}", entry.id),
                None,
                Some(r#"{"status":"taken"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cron_sweep_requires_secret() {
        let api = test_api();
        let app = api_router(api.ctx.clone());

        let response =
            app.oneshot(request("POST", "/api/cron/sweep", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let app2 = api_router(api.ctx);
        let response = app2
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/cron/sweep")
                    .header("X-Cron-Secret", "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cron_sweep_runs_with_secret() {
        let api = test_api();
        let app = api_router(api.ctx);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/cron/sweep")
                    .header("X-Cron-Secret", CRON_SECRET)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert!(json["due"].is_number());
        assert!(json["sent"].is_number());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let api = test_api();
        let app = api_router(api.ctx);

        let response =
            app.oneshot(request("GET", "/api/nonexistent", Some(TOKEN), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
