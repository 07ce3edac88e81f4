//! 外部媒体存储客户端
//!
//! 全局删除消息时向媒体服务的销毁端点发起 HTTP 调用，
//! 资源类别由消息的媒体类型前缀推导。

use async_trait::async_trait;
use serde::Serialize;

use application::{resource_kind, MediaError, MediaStorage};

#[derive(Debug, Serialize)]
struct DestroyRequest<'a> {
    public_id: &'a str,
    resource_type: &'static str,
}

/// 通过 HTTP 端点释放外部媒体资源。
pub struct HttpMediaStorage {
    client: reqwest::Client,
    destroy_endpoint: String,
}

impl HttpMediaStorage {
    pub fn new(destroy_endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            destroy_endpoint: destroy_endpoint.into(),
        }
    }
}

#[async_trait]
impl MediaStorage for HttpMediaStorage {
    async fn release(&self, public_id: &str, media_type: Option<&str>) -> Result<(), MediaError> {
        let request = DestroyRequest {
            public_id,
            resource_type: resource_kind(media_type),
        };

        let response = self
            .client
            .post(&self.destroy_endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| MediaError::release(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::release(format!(
                "destroy endpoint returned {}",
                response.status()
            )));
        }

        tracing::debug!(%public_id, resource_type = request.resource_type, "媒体资源已释放");
        Ok(())
    }
}
