/// 图片描述 API 客户端
///
/// 返回的描述会合并连续重复的单词；空描述视为永久性错误。
/// 标签去除空白和重复后随描述一起返回。
use crate::clients::enrichment_client::EnrichmentClient;
use crate::clients::http::post_file;
use crate::clients::payload::DocumentPayload;
use crate::config::Config;
use crate::error::ClientError;
use crate::models::StepResult;
use crate::utils::clean_repeated_words;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

const SERVICE: &str = "captioning";

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// 图片描述客户端
pub struct CaptioningClient {
    http: reqwest::Client,
    url: String,
}

impl CaptioningClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self::with_url(http, config.captioning_api_url.clone())
    }

    pub fn with_url(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EnrichmentClient for CaptioningClient {
    fn service(&self) -> &str {
        SERVICE
    }

    async fn invoke(&self, payload: &DocumentPayload) -> Result<StepResult, ClientError> {
        let response: CaptionResponse = post_file(&self.http, &self.url, SERVICE, payload).await?;
        debug!("图片描述返回 {} 个标签", response.tags.len());

        let caption = clean_repeated_words(&response.caption);
        if caption.is_empty() {
            return Err(ClientError::permanent(SERVICE, "返回的描述为空"));
        }
        Ok(StepResult::Caption {
            text: caption,
            tags: normalize_tags(response.tags),
        })
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .collect()
}
