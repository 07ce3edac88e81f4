//! 主应用程序入口
//!
//! 装配存储、事件路由与协调器，启动 Axum Web 服务。

use std::sync::Arc;

use application::{
    Coordinator, CoordinatorDependencies, CoordinatorState, EventRouter, LocalEventRouter,
    MediaStorage, NoopMediaStorage,
};
use config::AppConfig;
use infrastructure::db::{PgChatStore, PgMessageStore, PgUserDirectory};
use infrastructure::{
    create_pool, ensure_schema, run_subscriber, HttpMediaStorage, RedisEventRouter,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load()?;

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );
    let pool = Arc::new(create_pool(&config.database.url, config.database.max_connections).await?);
    ensure_schema(&pool).await?;

    let users = Arc::new(PgUserDirectory::new(pool.clone()));
    let chats = Arc::new(PgChatStore::new(pool.clone()));
    let messages = Arc::new(PgMessageStore::new(pool));

    let state = Arc::new(CoordinatorState::new());

    // 配置了 Redis 时启用跨实例事件扇出，否则单实例本地路由
    let event_router: Arc<dyn EventRouter> = match &config.redis.url {
        Some(redis_url) => {
            let redis_router = Arc::new(
                RedisEventRouter::connect(
                    LocalEventRouter::new(state.clone()),
                    redis_url,
                    config.redis.events_channel.clone(),
                )
                .await?,
            );
            tokio::spawn(run_subscriber(redis_router.clone(), redis_url.clone()));
            redis_router
        }
        None => Arc::new(LocalEventRouter::new(state.clone())),
    };

    let media: Arc<dyn MediaStorage> = match &config.media.destroy_endpoint {
        Some(endpoint) => Arc::new(HttpMediaStorage::new(endpoint.clone())),
        None => Arc::new(NoopMediaStorage),
    };

    let coordinator = Coordinator::new(CoordinatorDependencies {
        state,
        users,
        chats,
        messages,
        router: event_router,
        media,
    });

    let app = router(AppState::new(Arc::new(coordinator)));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("协调器服务启动在 http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
