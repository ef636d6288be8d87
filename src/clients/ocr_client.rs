/// 文字识别 API 客户端
///
/// 没有识别到文字时返回空字符串，这也是一个有效结果。
use crate::clients::enrichment_client::EnrichmentClient;
use crate::clients::http::post_file;
use crate::clients::payload::DocumentPayload;
use crate::config::Config;
use crate::error::ClientError;
use crate::models::StepResult;
use async_trait::async_trait;
use serde::Deserialize;

const SERVICE: &str = "ocr";

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: String,
}

/// 文字识别客户端
pub struct OcrClient {
    http: reqwest::Client,
    url: String,
}

impl OcrClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self::with_url(http, config.ocr_api_url.clone())
    }

    pub fn with_url(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EnrichmentClient for OcrClient {
    fn service(&self) -> &str {
        SERVICE
    }

    async fn invoke(&self, payload: &DocumentPayload) -> Result<StepResult, ClientError> {
        let response: OcrResponse = post_file(&self.http, &self.url, SERVICE, payload).await?;
        Ok(StepResult::Ocr(response.text.trim().to_string()))
    }
}
