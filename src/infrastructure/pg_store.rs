//! Postgres 记录存储 - 基础设施层
//!
//! 持有连接池，每次提交使用显式事务：
//! begin → 行锁 + 版本校验 → 更新 → commit。
//! 其他任何退出路径上事务都会在 drop 时回滚。

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::infrastructure::record_store::RecordStore;
use crate::models::{BatchRequest, DocumentId, DocumentRecord, FaceMatch, FieldUpdates, StepStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "id, payload_ref, caption_status, caption, caption_tags, ocr_status, ocr_text, \
     face_status, faces, version, created_at, updated_at";

// 与迁移中 documents_unfinished_idx 的谓词保持一致
const COMPLETE_CONDITION: &str = "caption_status = 'done' AND caption IS NOT NULL \
     AND ocr_status = 'done' AND ocr_text IS NOT NULL \
     AND face_status = 'done' AND faces IS NOT NULL";

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    payload_ref: String,
    caption_status: String,
    caption: Option<String>,
    caption_tags: Option<Json<Vec<String>>>,
    ocr_status: String,
    ocr_text: Option<String>,
    face_status: String,
    faces: Option<Json<Vec<FaceMatch>>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for DocumentRecord {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let parse = |value: &str| -> StoreResult<StepStatus> {
            value
                .parse()
                .map_err(|e: String| StoreError::Query(format!("文档 {}: {}", row.id, e)))
        };
        Ok(DocumentRecord {
            caption_status: parse(&row.caption_status)?,
            ocr_status: parse(&row.ocr_status)?,
            face_status: parse(&row.face_status)?,
            id: DocumentId(row.id),
            payload_ref: row.payload_ref,
            caption: row.caption,
            caption_tags: row.caption_tags.map(|Json(tags)| tags),
            ocr_text: row.ocr_text,
            faces: row.faces.map(|Json(faces)| faces),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres 记录存储
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按配置建立连接池
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout())
            .connect(&config.database_url)
            .await?;
        info!("✓ 数据库连接池已建立 (最大连接数: {})", config.db_max_connections);
        Ok(Self::new(pool))
    }

    /// 执行内置迁移
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("迁移失败: {}", e)))?;
        info!("✓ 数据库迁移完成");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// 提交阶段的错误映射：序列化失败 / 死锁视为并发冲突
fn map_commit_error(id: &DocumentId, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
            return StoreError::CommitConflict { id: id.clone() };
        }
    }
    StoreError::from(err)
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn fetch_batch(&self, request: &BatchRequest) -> StoreResult<Vec<DocumentRecord>> {
        let ids: Option<Vec<String>> = request
            .filter
            .document_ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.0.clone()).collect());
        let after_id = request.filter.after_id.as_ref().map(|id| id.0.clone());

        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM documents
            WHERE ($1::text[] IS NULL OR id = ANY($1))
              AND ($1::text[] IS NOT NULL OR NOT ({COMPLETE_CONDITION}))
              AND ($2::text IS NULL OR id > $2)
            ORDER BY id
            LIMIT $3
            "#
        );

        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(ids)
            .bind(after_id)
            .bind(request.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        debug!("取到 {} 条文档记录", rows.len());
        rows.into_iter().map(DocumentRecord::try_from).collect()
    }

    async fn commit(
        &self,
        id: &DocumentId,
        expected_version: i64,
        updates: &FieldUpdates,
    ) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_commit_error(id, e))?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE id = $1 FOR UPDATE")
                .bind(id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_commit_error(id, e))?;

        match current {
            Some(version) if version == expected_version => {}
            _ => return Err(StoreError::CommitConflict { id: id.clone() }),
        }

        sqlx::query(
            r#"
            UPDATE documents SET
                caption = COALESCE($2::text, caption),
                caption_status = CASE WHEN $2::text IS NULL THEN caption_status ELSE 'done' END,
                caption_tags = CASE WHEN $2::text IS NULL THEN caption_tags ELSE $5::jsonb END,
                ocr_text = COALESCE($3::text, ocr_text),
                ocr_status = CASE WHEN $3::text IS NULL THEN ocr_status ELSE 'done' END,
                faces = COALESCE($4::jsonb, faces),
                face_status = CASE WHEN $4::jsonb IS NULL THEN face_status ELSE 'done' END,
                version = version + 1,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(updates.caption.as_deref())
        .bind(updates.ocr_text.as_deref())
        .bind(updates.faces.as_ref().map(Json))
        .bind(updates.caption_tags.as_ref().map(Json))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_commit_error(id, e))?;

        tx.commit().await.map_err(|e| map_commit_error(id, e))?;
        Ok(())
    }

    async fn unfinished(&self, ids: &[DocumentId]) -> StoreResult<Vec<DocumentId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
        let sql = format!("SELECT id FROM documents WHERE id = ANY($1) AND {COMPLETE_CONDITION}");
        let complete: HashSet<String> = sqlx::query_scalar::<_, String>(&sql)
            .bind(raw)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .collect();

        Ok(ids
            .iter()
            .filter(|id| !complete.contains(id.as_str()))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
