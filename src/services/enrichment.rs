//! 增强服务 - 业务能力层
//!
//! 每个步骤对应唯一的客户端，映射是完备的（match 覆盖所有步骤）。
//! 只负责"执行一个步骤"，不关心顺序和提交。

use crate::clients::{
    CaptioningClient, DocumentPayload, EnrichmentClient, FaceClient, OcrClient,
};
use crate::config::Config;
use crate::error::ClientError;
use crate::models::{Step, StepResult};
use std::sync::Arc;
use tracing::debug;

/// 三个增强步骤的客户端集合
#[derive(Clone)]
pub struct EnrichmentService {
    captioning: Arc<dyn EnrichmentClient>,
    ocr: Arc<dyn EnrichmentClient>,
    face: Arc<dyn EnrichmentClient>,
}

impl EnrichmentService {
    pub fn new(
        captioning: Arc<dyn EnrichmentClient>,
        ocr: Arc<dyn EnrichmentClient>,
        face: Arc<dyn EnrichmentClient>,
    ) -> Self {
        Self {
            captioning,
            ocr,
            face,
        }
    }

    /// 按配置创建 HTTP 客户端
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(
            Arc::new(CaptioningClient::new(http.clone(), config)),
            Arc::new(OcrClient::new(http.clone(), config)),
            Arc::new(FaceClient::new(http, config)),
        )
    }

    pub fn client(&self, step: Step) -> &dyn EnrichmentClient {
        match step {
            Step::Captioning => self.captioning.as_ref(),
            Step::Ocr => self.ocr.as_ref(),
            Step::FaceRecognition => self.face.as_ref(),
        }
    }

    /// 执行一个步骤
    ///
    /// 客户端返回了其他步骤的结果时视为永久性错误，避免写错字段。
    pub async fn run(
        &self,
        step: Step,
        payload: &DocumentPayload,
    ) -> Result<StepResult, ClientError> {
        let client = self.client(step);
        debug!("执行步骤 {} (服务: {})", step, client.service());

        let result = client.invoke(payload).await?;
        if result.step() != step {
            return Err(ClientError::permanent(
                client.service(),
                format!("返回了 {} 的结果，期望 {}", result.step(), step),
            ));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(StepResult);

    #[async_trait]
    impl EnrichmentClient for Fixed {
        fn service(&self) -> &str {
            "fixed"
        }

        async fn invoke(&self, _payload: &DocumentPayload) -> Result<StepResult, ClientError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_routes_each_step_to_its_client() {
        let service = EnrichmentService::new(
            Arc::new(Fixed(StepResult::caption("cap"))),
            Arc::new(Fixed(StepResult::Ocr("txt".into()))),
            Arc::new(Fixed(StepResult::Faces(vec![]))),
        );
        let payload = DocumentPayload::new("a.jpg", vec![1, 2, 3]);

        for step in Step::ORDERED {
            let result = service.run(step, &payload).await.unwrap();
            assert_eq!(result.step(), step);
        }
    }

    #[tokio::test]
    async fn test_misrouted_result_is_rejected() {
        let service = EnrichmentService::new(
            Arc::new(Fixed(StepResult::Ocr("wrong".into()))),
            Arc::new(Fixed(StepResult::Ocr("txt".into()))),
            Arc::new(Fixed(StepResult::Faces(vec![]))),
        );
        let payload = DocumentPayload::new("a.jpg", vec![]);

        let err = service.run(Step::Captioning, &payload).await.unwrap_err();
        assert!(!err.is_transient());
    }
}
