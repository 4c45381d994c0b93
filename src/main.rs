use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use olympiad_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::auth,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/register", post(routes::users::register))
        .route("/api/login", post(routes::users::login))
        .route("/api/tests", get(routes::tests::list_tests))
        .route("/api/tests/:id", get(routes::tests::get_test))
        .route("/api/images/:id", get(routes::images::get_image));

    let authed_api = Router::new()
        .route(
            "/api/profile",
            get(routes::users::get_profile).put(routes::users::update_profile),
        )
        .route("/api/tests/:id/start", post(routes::tests::start_test))
        .route("/api/tests/:id/answer", post(routes::tests::save_answer))
        .route("/api/tests/:id/progress", get(routes::tests::get_progress))
        .route("/api/tests/:id/favorite", post(routes::tests::add_favorite))
        .route(
            "/api/tests/results/:id/submit",
            post(routes::tests::submit_test),
        )
        .route("/api/tests/results/:id", get(routes::tests::get_result))
        .route("/api/users/:id/tests", get(routes::tests::user_results))
        .route("/api/olympiads", get(routes::olympiads::list_olympiads))
        .route("/api/olympiads/:id", get(routes::olympiads::get_olympiad))
        .route(
            "/api/olympiads/:id/start",
            post(routes::olympiads::start_olympiad),
        )
        .route(
            "/api/olympiads/:id/favorite",
            post(routes::olympiads::add_favorite),
        )
        .route("/api/olympiads/answers", post(routes::olympiads::save_answer))
        .route(
            "/api/olympiads/results/:id/finish",
            post(routes::olympiads::finish_olympiad),
        )
        .route(
            "/api/olympiads/results/:id",
            get(routes::olympiads::get_result),
        )
        .layer(axum::middleware::from_fn(auth::require_auth));

    let teacher_api = Router::new()
        .route("/api/tests", post(routes::tests::create_test))
        .route(
            "/api/tests/:id/questions",
            post(routes::tests::add_question),
        )
        .route("/api/olympiads", post(routes::olympiads::create_olympiad))
        .route(
            "/api/olympiads/:id/questions",
            post(routes::olympiads::add_question),
        )
        .route(
            "/api/olympiads/results/:id/review",
            post(routes::olympiads::review_result),
        )
        .layer(axum::middleware::from_fn(auth::require_teacher));

    let admin_api = Router::new()
        .route("/api/users", get(routes::users::list_users))
        .route("/api/users/:id/approve", post(routes::users::approve_user))
        .layer(axum::middleware::from_fn(auth::require_admin));

    let app = public_api
        .merge(authed_api)
        .merge(teacher_api)
        .merge(admin_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
