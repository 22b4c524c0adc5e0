use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use daily_standup::{config, protocol::SemaphoreDelay, run_server, ServerArgs};

#[derive(Parser)]
#[command(name = "standup-server", about = "Daily stand-up meeting server", version)]
struct Cli {
    /// 바인드 주소
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// WS/HTTP 공용 포트
    #[arg(long, default_value_t = config::SIGNALING_PORT)]
    port: u16,

    /// 세마포어 녹색 전환 최소 지연 (ms)
    #[arg(long, default_value_t = config::SEMAPHORE_MIN_DELAY_MS)]
    semaphore_min_ms: u64,

    /// 세마포어 녹색 전환 최대 지연 (ms)
    #[arg(long, default_value_t = config::SEMAPHORE_MAX_DELAY_MS)]
    semaphore_max_ms: u64,
}

#[tokio::main]
async fn main() {
    // 환경 변수 기반 로깅 초기화 (기본값: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let args = ServerArgs {
        host:            cli.host,
        port:            cli.port,
        semaphore_delay: SemaphoreDelay { min_ms: cli.semaphore_min_ms, max_ms: cli.semaphore_max_ms },
    };

    if let Err(e) = run_server(args).await {
        error!("[standup] server stopped: {} (code={})", e, e.code());
        std::process::exit(1);
    }
}
