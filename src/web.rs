use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{Config, SchedulingPolicy};
use crate::error::{SchedulingError, ValidationError};
use crate::form::{export_booking_to_csv, validate_service_duration, GroupBookingSubmission};
use crate::parser::{read_appointments, read_staff};
use crate::repository::{InMemoryRepository, ScheduleRepository};
use crate::schedule::{
    auto_assign, check_group_capacity, check_staff_availability, get_scheduling_recommendation,
    schedule_and_book, Strategy,
};

pub struct AppState {
    pub repo: Arc<InMemoryRepository>,
    pub admin_password: String,
    pub policy: SchedulingPolicy,
    /// Committed bookings are appended here when set
    pub export_path: Option<PathBuf>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    date: NaiveDate,
    start_time: String,
    service_duration: u32,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    #[serde(flatten)]
    submission: GroupBookingSubmission,
    strategy: Strategy,
}

fn validation_error_response(e: &ValidationError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": e.to_string()}))
}

fn scheduling_error_response(e: &SchedulingError) -> HttpResponse {
    let body = serde_json::json!({"success": false, "error": e.to_string()});
    match e {
        SchedulingError::InvalidTime(_) => HttpResponse::BadRequest().json(body),
        SchedulingError::Repository(_) => HttpResponse::ServiceUnavailable().json(body),
        SchedulingError::NoStaffAvailable { .. } | SchedulingError::Conflict(_) => {
            HttpResponse::Conflict().json(body)
        }
    }
}

fn is_admin(req: &HttpRequest, state: &AppState) -> bool {
    req.headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .map(|password| password == state.admin_password)
        .unwrap_or(false)
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Unauthorized"}))
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Invalid password"})))
    }
}

// Admin roster upload endpoint
async fn upload_staff(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    match read_staff(body.as_ref()) {
        Ok(roster) => {
            let count = roster.len();
            state.repo.replace_roster(roster);
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "staff": count})))
        }
        Err(e) => {
            warn!(error = %e, "Rejected roster upload");
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Failed to process CSV: {}", e)
            })))
        }
    }
}

// Admin appointments upload endpoint
async fn upload_appointments(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    match read_appointments(body.as_ref()) {
        Ok(appointments) => {
            let count = appointments.len();
            state.repo.replace_appointments(appointments);
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "appointments": count})))
        }
        Err(e) => {
            warn!(error = %e, "Rejected appointments upload");
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Failed to process CSV: {}", e)
            })))
        }
    }
}

async fn availability(
    req: web::Json<AvailabilityQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if let Err(e) = validate_service_duration(req.service_duration) {
        return Ok(validation_error_response(&e));
    }

    match check_staff_availability(
        &*state.repo,
        req.date,
        &req.start_time,
        req.service_duration,
        &state.policy,
    )
    .await
    {
        Ok(staff) => Ok(HttpResponse::Ok().json(staff)),
        Err(e) => Ok(scheduling_error_response(&e)),
    }
}

async fn recommend(
    req: web::Json<GroupBookingSubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = match req.into_inner().into_request() {
        Ok(request) => request,
        Err(e) => return Ok(validation_error_response(&e)),
    };

    match get_scheduling_recommendation(&*state.repo, &request, &state.policy).await {
        Ok(rec) => Ok(HttpResponse::Ok().json(rec)),
        Err(e) => Ok(scheduling_error_response(&e)),
    }
}

async fn capacity(
    req: web::Json<GroupBookingSubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = match req.into_inner().into_request() {
        Ok(request) => request,
        Err(e) => return Ok(validation_error_response(&e)),
    };

    match check_group_capacity(
        &*state.repo,
        request.date,
        &request.start_time,
        request.party_size,
        request.service_duration,
        &state.policy,
    )
    .await
    {
        Ok(check) => Ok(HttpResponse::Ok().json(check)),
        Err(e) => Ok(scheduling_error_response(&e)),
    }
}

async fn assign(
    req: web::Json<AssignRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let AssignRequest { submission, strategy } = req.into_inner();
    let request = match submission.into_request() {
        Ok(request) => request,
        Err(e) => return Ok(validation_error_response(&e)),
    };

    match auto_assign(&*state.repo, &request, strategy, &state.policy).await {
        Ok(assignments) => Ok(HttpResponse::Ok().json(assignments)),
        Err(e) => Ok(scheduling_error_response(&e)),
    }
}

async fn book(
    req: web::Json<GroupBookingSubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let request = match req.into_inner().into_request() {
        Ok(request) => request,
        Err(e) => return Ok(validation_error_response(&e)),
    };

    let booking = match schedule_and_book(&*state.repo, &request, &state.policy).await {
        Ok(booking) => booking,
        Err(e) => return Ok(scheduling_error_response(&e)),
    };

    if let Some(path) = &state.export_path {
        if let Err(e) = export_booking_to_csv(&booking, path) {
            error!(path = %path.display(), error = %e, "Failed to export booking");
        }
    }

    Ok(HttpResponse::Created().json(booking))
}

async fn list_appointments(
    date: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Ok(date) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({"error": "Invalid date"})));
    };

    match state.repo.get_appointments(date).await {
        Ok(appointments) => Ok(HttpResponse::Ok().json(appointments)),
        Err(e) => Ok(scheduling_error_response(&SchedulingError::from(e))),
    }
}

/// Registers every API route
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(admin_login))
        .route("/api/upload/staff", web::post().to(upload_staff))
        .route("/api/upload/appointments", web::post().to(upload_appointments))
        .route("/api/availability", web::post().to(availability))
        .route("/api/recommend", web::post().to(recommend))
        .route("/api/capacity", web::post().to(capacity))
        .route("/api/assign", web::post().to(assign))
        .route("/api/book", web::post().to(book))
        .service(web::resource("/api/appointments/{date}").route(web::get().to(list_appointments)));
}

pub async fn start_server(
    config: Config,
    repo: Arc<InMemoryRepository>,
    export_path: Option<PathBuf>,
) -> std::io::Result<()> {
    let port = config.port;
    let app_state = web::Data::new(AppState {
        repo,
        admin_password: config.admin_password,
        policy: config.policy,
        export_path,
    });

    info!(port, "Starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use crate::repository::RosterEntry;
    use crate::schedule::types::StaffMember;

    fn state(staff: usize) -> web::Data<AppState> {
        let roster = (1..=staff)
            .map(|i| RosterEntry {
                staff: StaffMember {
                    id: format!("s{}", i),
                    name: format!("Stylist {}", i),
                    specialty: None,
                },
                active: true,
            })
            .collect();
        web::Data::new(AppState {
            repo: Arc::new(InMemoryRepository::with_data(roster, vec![])),
            admin_password: "pw".to_string(),
            policy: SchedulingPolicy::default(),
            export_path: None,
        })
    }

    fn group(party_size: usize) -> serde_json::Value {
        serde_json::json!({
            "date": "2025-06-01",
            "start_time": "10:00",
            "party_size": party_size,
            "service_duration": 60
        })
    }

    #[actix_web::test]
    async fn test_recommend_endpoint() {
        let app = test::init_service(App::new().app_data(state(2)).configure(routes)).await;
        let req = test::TestRequest::post().uri("/api/recommend").set_json(group(4)).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["strategy"], "staggered");
        assert_eq!(body["assignments"].as_array().unwrap().len(), 4);
        assert_eq!(body["assignments"][2]["start_time"], "10:30");
    }

    #[actix_web::test]
    async fn test_validation_failure_is_bad_request() {
        let app = test::init_service(App::new().app_data(state(2)).configure(routes)).await;
        let req = test::TestRequest::post().uri("/api/recommend").set_json(group(0)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_unavailable_store_is_service_unavailable() {
        let data = state(2);
        data.repo.set_unavailable(Some("down"));
        let app = test::init_service(App::new().app_data(data.clone()).configure(routes)).await;
        let req = test::TestRequest::post().uri("/api/capacity").set_json(group(2)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_book_then_list() {
        let app = test::init_service(App::new().app_data(state(2)).configure(routes)).await;

        let req = test::TestRequest::post().uri("/api/book").set_json(group(2)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/appointments/2025-06-01").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        // Nobody is free at 10:00 any more
        let req = test::TestRequest::post().uri("/api/book").set_json(group(2)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_upload_requires_admin_password() {
        let data = state(0);
        let app = test::init_service(App::new().app_data(data.clone()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/upload/staff")
            .set_payload("id,name\ns1,Ana\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/upload/staff")
            .insert_header(("X-Admin-Password", "pw"))
            .set_payload("id,name\ns1,Ana\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(data.repo.get_active_staff().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_assign_with_explicit_strategy() {
        let app = test::init_service(App::new().app_data(state(1)).configure(routes)).await;
        let mut payload = group(3);
        payload["strategy"] = serde_json::json!("sequential");
        let req = test::TestRequest::post().uri("/api/assign").set_json(payload).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let starts: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["start_time"].as_str().unwrap())
            .collect();
        assert_eq!(starts, vec!["10:00", "11:00", "12:00"]);
    }

    #[actix_web::test]
    async fn test_availability_endpoint() {
        let app = test::init_service(App::new().app_data(state(2)).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/availability")
            .set_json(serde_json::json!({"date": "2025-06-01", "start_time": "10:00", "service_duration": 30}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["available"], true);
    }

    #[actix_web::test]
    async fn test_availability_rejects_out_of_range_duration() {
        let app = test::init_service(App::new().app_data(state(2)).configure(routes)).await;
        for duration in [0u32, 481, u32::MAX] {
            let req = test::TestRequest::post()
                .uri("/api/availability")
                .set_json(serde_json::json!({"date": "2025-06-01", "start_time": "23:59", "service_duration": duration}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }
}
