//! 文档内容读取
//!
//! 记录中只保存定位符：`http(s)://` 开头的从网络下载，
//! 其他视为相对于 `payload_root` 的文件路径。

use crate::clients::http::{classify_reqwest_error, classify_status};
use crate::error::ClientError;
use crate::models::DocumentRecord;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const SERVICE: &str = "payload";

/// 一个文档的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentPayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// 按记录读取文档内容
#[async_trait]
pub trait PayloadSource: Send + Sync {
    async fn load(&self, record: &DocumentRecord) -> Result<DocumentPayload, ClientError>;
}

/// 默认实现：本地文件或 HTTP 下载
pub struct PayloadLoader {
    http: reqwest::Client,
    root: PathBuf,
}

impl PayloadLoader {
    pub fn new(http: reqwest::Client, root: impl Into<PathBuf>) -> Self {
        Self {
            http,
            root: root.into(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(SERVICE, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(SERVICE, e))?;
        if !status.is_success() {
            return Err(classify_status(SERVICE, status, &String::from_utf8_lossy(&body)));
        }
        Ok(body.to_vec())
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, ClientError> {
        tokio::fs::read(path).await.map_err(|e| {
            let message = format!("读取 {} 失败: {}", path.display(), e);
            match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidInput => {
                    ClientError::permanent(SERVICE, message)
                }
                _ => ClientError::transient(SERVICE, message),
            }
        })
    }
}

/// 定位符最后一段作为上传文件名
fn file_name_of(locator: &str, fallback: &str) -> String {
    locator
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[async_trait]
impl PayloadSource for PayloadLoader {
    async fn load(&self, record: &DocumentRecord) -> Result<DocumentPayload, ClientError> {
        let locator = record.payload_ref.trim();
        if locator.is_empty() {
            return Err(ClientError::permanent(
                SERVICE,
                format!("文档 {} 没有内容定位符", record.id),
            ));
        }

        let bytes = if locator.starts_with("http://") || locator.starts_with("https://") {
            self.download(locator).await?
        } else {
            self.read_file(&self.root.join(locator)).await?
        };
        debug!("文档 {} 内容已读取: {} 字节", record.id, bytes.len());

        Ok(DocumentPayload {
            file_name: file_name_of(locator, record.id.as_str()),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("media/2024/cat.jpg", "d1"), "cat.jpg");
        assert_eq!(
            file_name_of("https://cdn.example.com/a/b/dog.png?sig=1", "d1"),
            "dog.png"
        );
        assert_eq!(file_name_of("https://cdn.example.com/", "d1"), "d1");
        assert_eq!(file_name_of(r"C:\scans\page.tif", "d1"), "page.tif");
    }

    #[tokio::test]
    async fn test_missing_file_is_permanent() {
        let loader = PayloadLoader::new(reqwest::Client::new(), std::env::temp_dir());
        let record = DocumentRecord::new("d1", "definitely-not-here-7f3a.jpg");
        let err = loader.load(&record).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_reads_local_file() {
        let dir = std::env::temp_dir().join("enrich_batch_payload_test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("page.png"), b"png-bytes").await.unwrap();

        let loader = PayloadLoader::new(reqwest::Client::new(), &dir);
        let payload = loader
            .load(&DocumentRecord::new("d2", "page.png"))
            .await
            .unwrap();
        assert_eq!(payload, DocumentPayload::new("page.png", b"png-bytes".to_vec()));
    }
}
