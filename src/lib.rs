pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod protocol;
pub mod utils;

use axum::{routing::{get, post}, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::core::Room;
use crate::error::StandupResult;
use crate::protocol::{ws_handler, AppState, SemaphoreDelay};
use crate::utils::current_timestamp;

/// CLI에서 주입되는 런타임 설정
/// - 기본값은 config.rs 상수
pub struct ServerArgs {
    pub host:            String,
    pub port:            u16,
    pub semaphore_delay: SemaphoreDelay,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            host:            "0.0.0.0".to_string(),
            port:            config::SIGNALING_PORT,
            semaphore_delay: SemaphoreDelay::default(),
        }
    }
}

pub fn app_state(semaphore_delay: SemaphoreDelay) -> AppState {
    AppState {
        room:          Room::shared(),
        start_time_ms: current_timestamp(),
        semaphore_delay,
    }
}

pub fn build_router(state: AppState) -> Router {
    // CORS — 브라우저 클라이언트/대시보드 로컬 접속 허용
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws",     get(ws_handler))
        .route("/status", get(http::status))
        .route("/reset",  post(http::reset))
        .with_state(state)
        .layer(cors)
}

pub async fn run_server(args: ServerArgs) -> StandupResult<()> {
    let app = build_router(app_state(args.semaphore_delay));

    let addr     = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("[standup] meeting server on ws://{}/ws", addr);
    info!("[standup] semaphore delay {}..={}ms", args.semaphore_delay.min_ms, args.semaphore_delay.max_ms);

    axum::serve(listener, app).await?;
    Ok(())
}
