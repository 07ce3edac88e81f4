//! 共享频道订阅任务

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::sleep;

use super::router::{EventEnvelope, RedisEventRouter};

const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// 订阅共享频道并把其他实例的信封交给本地路由补投。
///
/// 连接断开后自动重连，解析失败的消息记日志后丢弃。
/// 在独立的 tokio 任务中运行，随进程存续。
pub async fn run_subscriber(router: Arc<RedisEventRouter>, redis_url: String) {
    loop {
        match subscribe_once(&router, &redis_url).await {
            Ok(()) => {
                tracing::warn!("Redis 订阅流结束，准备重连");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis 订阅失败，准备重连");
            }
        }
        sleep(RECONNECT_DELAY).await;
    }
}

async fn subscribe_once(
    router: &RedisEventRouter,
    redis_url: &str,
) -> Result<(), redis::RedisError> {
    let client = redis::Client::open(redis_url)?;
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(router.channel()).await?;

    tracing::info!(channel = router.channel(), "已订阅跨实例事件频道");

    let mut stream = pubsub.on_message();
    while let Some(message) = stream.next().await {
        let payload: String = match message.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "读取订阅消息失败");
                continue;
            }
        };

        let envelope: EventEnvelope = match serde_json::from_str(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "事件信封解析失败");
                continue;
            }
        };

        if let Err(e) = router.deliver_remote(envelope).await {
            tracing::warn!(error = %e, "远端事件本地补投失败");
        }
    }

    Ok(())
}
