/// 人脸识别 API 客户端
use crate::clients::enrichment_client::EnrichmentClient;
use crate::clients::http::post_file;
use crate::clients::payload::DocumentPayload;
use crate::config::Config;
use crate::error::ClientError;
use crate::models::{FaceMatch, StepResult};
use async_trait::async_trait;
use serde::Deserialize;

const SERVICE: &str = "face";

#[derive(Debug, Deserialize)]
struct FaceResponse {
    /// 缺少该字段视为没有人脸
    #[serde(default)]
    faces: Vec<FaceMatch>,
}

/// 人脸识别客户端
pub struct FaceClient {
    http: reqwest::Client,
    url: String,
}

impl FaceClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self::with_url(http, config.face_api_url.clone())
    }

    pub fn with_url(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EnrichmentClient for FaceClient {
    fn service(&self) -> &str {
        SERVICE
    }

    /// 空列表是有效结果；响应结构不符时为永久失败
    async fn invoke(&self, payload: &DocumentPayload) -> Result<StepResult, ClientError> {
        let response: FaceResponse = post_file(&self.http, &self.url, SERVICE, payload).await?;
        Ok(StepResult::Faces(response.faces))
    }
}
