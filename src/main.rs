//src/main.rs

use anyhow::Context;
use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, tenant_guard};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Usuário autenticado, ainda sem empresa
    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route("/api/onboarding", post(handlers::company::onboard))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let location_routes = Router::new()
        .route(
            "/",
            get(handlers::company::list_locations).post(handlers::company::create_location),
        )
        .route(
            "/{id}",
            put(handlers::company::update_location).delete(handlers::company::delete_location),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let department_routes = Router::new()
        .route(
            "/",
            get(handlers::company::list_departments).post(handlers::company::create_department),
        )
        .route(
            "/{id}",
            put(handlers::company::update_department).delete(handlers::company::delete_department),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let shift_routes = Router::new()
        .route(
            "/",
            get(handlers::shifts::list_shifts).post(handlers::shifts::create_shift),
        )
        .route("/assign", post(handlers::shifts::assign_shift))
        .route(
            "/{id}",
            put(handlers::shifts::update_shift).delete(handlers::shifts::delete_shift),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let employee_routes = Router::new()
        .route(
            "/",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route("/detect", post(handlers::employees::detect_face))
        .route(
            "/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::deactivate_employee),
        )
        .route(
            "/{id}/enroll",
            post(handlers::employees::enroll_face).delete(handlers::employees::remove_face),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let camera_routes = Router::new()
        .route(
            "/",
            get(handlers::cameras::list_cameras).post(handlers::cameras::create_camera),
        )
        .route("/test", post(handlers::cameras::test_connection))
        .route(
            "/{id}",
            put(handlers::cameras::update_camera).delete(handlers::cameras::delete_camera),
        )
        .route("/{id}/status", patch(handlers::cameras::set_camera_status))
        .route("/{id}/start", post(handlers::cameras::start_stream))
        .route("/{id}/stop", post(handlers::cameras::stop_stream))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    // Caminhos completos: `/api/attendance/log` é público e convive com estas rotas
    let attendance_routes = Router::new()
        .route("/api/attendance/logs", get(handlers::attendance::list_logs))
        .route("/api/attendance/kiosk", post(handlers::attendance::kiosk_check_in))
        .route("/api/attendance/manual", post(handlers::attendance::manual_check_in))
        .route("/api/attendance/recent", get(handlers::attendance::recent_activity))
        .route("/api/attendance/today", get(handlers::attendance::today_stats))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let leave_routes = Router::new()
        .route(
            "/",
            get(handlers::leaves::list_leaves).post(handlers::leaves::apply_leave),
        )
        .route("/me", get(handlers::leaves::my_employee))
        .route("/balances", get(handlers::leaves::list_balances))
        .route("/{id}/approve", post(handlers::leaves::approve_leave))
        .route("/{id}/reject", post(handlers::leaves::reject_leave))
        .route("/{id}/cancel", post(handlers::leaves::cancel_leave))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let leave_type_routes = Router::new()
        .route(
            "/",
            get(handlers::leaves::list_leave_types).post(handlers::leaves::create_leave_type),
        )
        .route(
            "/{id}",
            put(handlers::leaves::update_leave_type).delete(handlers::leaves::delete_leave_type),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route("/unread-count", get(handlers::notifications::unread_count))
        .route("/read-all", post(handlers::notifications::mark_all_read))
        .route("/{id}/read", post(handlers::notifications::mark_read))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::company::dashboard_stats))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    // Caminhos completos: `/api/reports/{token}` é público
    let report_routes = Router::new()
        .route("/api/reports/overview", get(handlers::reports::attendance_overview))
        .route("/api/reports/departments", get(handlers::reports::department_analytics))
        .route("/api/reports/leaves", get(handlers::reports::leave_analytics))
        .route("/api/reports/punctuality", get(handlers::reports::punctuality))
        .route("/api/reports/employees/{id}", get(handlers::reports::employee_detail))
        .route("/api/reports/filter-options", get(handlers::reports::filter_options))
        .route(
            "/api/reports/shares",
            get(handlers::reports::list_shares).post(handlers::reports::create_share),
        )
        .route("/api/reports/shares/{id}", delete(handlers::reports::delete_share))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    // Rotas públicas: callback das câmeras e relatórios compartilhados
    let public_routes = Router::new()
        .route("/api/attendance/log", post(handlers::attendance::external_callback))
        .route("/api/reports/{token}", get(handlers::reports::public_report))
        .route("/embed/{token}", get(handlers::embed::embed_report))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any),
        );

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .merge(user_routes)
        .nest("/api/locations", location_routes)
        .nest("/api/departments", department_routes)
        .nest("/api/shifts", shift_routes)
        .nest("/api/employees", employee_routes)
        .nest("/api/cameras", camera_routes)
        .nest("/api/leaves", leave_routes)
        .nest("/api/leave-types", leave_type_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/dashboard", dashboard_routes)
        .merge(attendance_routes)
        .merge(report_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state.clone());

    let listener = TcpListener::bind(&app_state.bind_addr)
        .await
        .with_context(|| format!("Falha ao escutar em {}", app_state.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", app_state.bind_addr);
    tracing::info!("📚 Documentação em http://{}/swagger-ui", app_state.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
