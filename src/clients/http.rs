//! 增强服务共用的 HTTP 调用逻辑
//!
//! 所有服务都是 multipart 上传一个 `file` 字段，返回 JSON。
//! 错误按可否在下次调用中重试分为暂时性和永久性两类。

use crate::clients::payload::DocumentPayload;
use crate::config::Config;
use crate::error::ClientError;
use crate::utils::truncate_text;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

/// 构建带超时的共享 HTTP 客户端
pub fn build_http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.client_timeout())
        .connect_timeout(config.client_connect_timeout())
        .build()
}

/// 按 HTTP 状态码分类
pub fn classify_status(service: &str, status: StatusCode, body: &str) -> ClientError {
    let message = format!("HTTP {}: {}", status.as_u16(), truncate_text(body.trim(), 200));
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        ClientError::transient(service, message)
    } else {
        ClientError::permanent(service, message)
    }
}

/// 按 reqwest 错误类型分类
pub fn classify_reqwest_error(service: &str, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::transient(service, format!("请求超时: {}", err));
    }
    if err.is_connect() {
        return ClientError::transient(service, format!("连接失败: {}", err));
    }
    if let Some(status) = err.status() {
        return classify_status(service, status, &err.to_string());
    }
    if err.is_builder() || err.is_decode() {
        return ClientError::permanent(service, err.to_string());
    }
    ClientError::transient(service, err.to_string())
}

/// 上传文档内容并解析 JSON 响应
pub async fn post_file<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    service: &str,
    payload: &DocumentPayload,
) -> Result<T, ClientError> {
    debug!(
        "调用 {} ({}), 文件: {} ({} 字节)",
        service,
        url,
        payload.file_name,
        payload.bytes.len()
    );

    let part = Part::bytes(payload.bytes.clone()).file_name(payload.file_name.clone());
    let form = Form::new().part("file", part);

    let response = http
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(service, e))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| classify_reqwest_error(service, e))?;

    if !status.is_success() {
        return Err(classify_status(
            service,
            status,
            &String::from_utf8_lossy(&body),
        ));
    }

    serde_json::from_slice(&body)
        .map_err(|e| ClientError::permanent(service, format!("响应格式错误: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(classify_status("ocr", StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(classify_status("ocr", StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(classify_status("ocr", StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_status("ocr", StatusCode::REQUEST_TIMEOUT, "").is_transient());
        assert!(!classify_status("ocr", StatusCode::BAD_REQUEST, "").is_transient());
        assert!(!classify_status("ocr", StatusCode::UNPROCESSABLE_ENTITY, "").is_transient());
    }

    #[test]
    fn test_classify_status_message_truncates_body() {
        let body = "x".repeat(500);
        let err = classify_status("face", StatusCode::BAD_REQUEST, &body);
        match err {
            ClientError::Permanent { service, message } => {
                assert_eq!(service, "face");
                assert!(message.starts_with("HTTP 400: "));
                assert!(message.len() < 300);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
