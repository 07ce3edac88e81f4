use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media release failed: {0}")]
    Release(String),
}

impl MediaError {
    pub fn release(message: impl Into<String>) -> Self {
        Self::Release(message.into())
    }
}

/// 外部媒体存储：全局删除消息时释放已上传的资源。
///
/// 释放是尽力而为的副作用，失败只记录日志，绝不阻塞或失败
/// 主操作。上传本身由外部协作方负责。
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn release(&self, public_id: &str, media_type: Option<&str>) -> Result<(), MediaError>;
}

/// 按媒体类型前缀推导外部存储的资源类别。
pub fn resource_kind(media_type: Option<&str>) -> &'static str {
    match media_type {
        Some(t) if t.starts_with("image/") => "image",
        Some(t) if t.starts_with("video/") => "video",
        _ => "raw",
    }
}

/// 未配置外部媒体存储时的空实现。
#[derive(Debug, Default)]
pub struct NoopMediaStorage;

#[async_trait]
impl MediaStorage for NoopMediaStorage {
    async fn release(&self, public_id: &str, _media_type: Option<&str>) -> Result<(), MediaError> {
        tracing::debug!(%public_id, "未配置媒体存储，跳过资源释放");
        Ok(())
    }
}
