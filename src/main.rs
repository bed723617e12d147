//! 酒店预订服务主入口

use booking_system::{
    clock::{Clock, SystemClock},
    config::{AppConfig, StorageBackend},
    db,
    handlers::health,
    middleware::AppState,
    repository::{MemoryStore, Repositories},
    routes, telemetry,
};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal, sync::watch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if let Some(arg) = args.get(1) {
        match arg.as_str() {
            "--version" => {
                println!("booking-system {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 生产环境直接设置环境变量，不依赖 .env 文件
    if let Ok(env) = std::env::var("BOOKING_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Booking service starting...");

    // 3. 存储后端
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (db_pool, repos) = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Database initialized");
            (Some(pool.clone()), Repositories::postgres(pool))
        }
        StorageBackend::Memory => {
            let store = if config.storage.seed_demo_data {
                MemoryStore::with_demo_data()
            } else {
                MemoryStore::new()
            };
            tracing::warn!(
                seeded = config.storage.seed_demo_data,
                "Using in-memory storage, data is lost on restart"
            );
            (None, Repositories::memory(Arc::new(store)))
        }
    };

    // 4. 应用状态与后台任务
    let app_state = Arc::new(AppState::new(config.clone(), db_pool, repos, clock)?);

    let sweep_interval = config.security.revocation_sweep_interval_secs;
    let sweeper = (sweep_interval > 0).then(|| {
        app_state
            .auth_service
            .spawn_revocation_sweeper(Duration::from_secs(sweep_interval))
    });

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭：收到信号后停止接收新连接，超时后强制退出
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let server_rx = shutdown_rx.clone();
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(server_rx))
            .await
    };
    let grace = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);

    tokio::select! {
        result = server => result?,
        _ = async {
            wait_for(shutdown_rx).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        }
    }

    if let Some(handle) = sweeper {
        handle.abort();
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn wait_for(mut rx: watch::Receiver<bool>) {
    // 发送端被丢弃时视为关闭
    let _ = rx.wait_for(|stop| *stop).await;
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

fn print_help() {
    println!("booking-system {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: booking-system [--version | --help]");
    println!();
    println!("All configuration is read from BOOKING_* environment variables.");
    println!("See .env.example for the available options.");
}
