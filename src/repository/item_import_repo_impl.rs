// ==========================================
// 存货跌价准备计算系统 - 台账导入仓储实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::item::{ImportBatch, NewInventoryItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::item_import_repo::ItemImportRepository;
use crate::repository::item_repo::format_upload_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// ItemImportRepositoryImpl
// ==========================================
pub struct ItemImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ItemImportRepositoryImpl {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务中批量插入台账行
    fn batch_insert_items_tx(
        tx: &Transaction,
        items: &[NewInventoryItem],
        upload_ts: &str,
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO inventory_item (
                name, category, quantity, price, shelf_life_months,
                received_date, usage_probability, market_price, upload_timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )?;

        let mut count = 0;
        for item in items {
            stmt.execute(params![
                item.name,
                item.category,
                item.quantity,
                item.price,
                item.shelf_life_months,
                item.received_date,
                item.usage_probability,
                item.market_price,
                upload_ts,
            ])?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl ItemImportRepository for ItemImportRepositoryImpl {
    /// 批量插入台账行（事务化）
    async fn batch_insert_items(
        &self,
        items: Vec<NewInventoryItem>,
        upload_timestamp: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let upload_ts = format_upload_timestamp(upload_timestamp);
        let count = Self::batch_insert_items_tx(&tx, &items, &upload_ts)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 写入导入批次审计记录
    async fn insert_import_batch(&self, batch: ImportBatch) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, total_rows, success_rows, failed_rows,
                upload_timestamp, elapsed_ms, row_errors_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.total_rows,
                batch.success_rows,
                batch.failed_rows,
                format_upload_timestamp(batch.upload_timestamp),
                batch.elapsed_ms,
                batch.row_errors_json,
            ],
        )?;

        Ok(())
    }
}
