use crate::clients::payload::DocumentPayload;
use crate::error::ClientError;
use crate::models::StepResult;
use async_trait::async_trait;

/// 增强服务客户端
///
/// 一次同步请求，带超时；远端不保证幂等。
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// 日志和错误信息中使用的服务名
    fn service(&self) -> &str;

    async fn invoke(&self, payload: &DocumentPayload) -> Result<StepResult, ClientError>;
}
