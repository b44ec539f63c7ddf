// ==========================================
// 存货跌价准备计算系统 - 存货台账仓储
// ==========================================
// 职责: inventory_item 表的数据访问
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::item::InventoryItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 批次时间戳的存储格式（整秒粒度，同批全同）
pub const UPLOAD_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 将批次时间戳格式化为存储串（截断到整秒）
pub fn format_upload_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(UPLOAD_TS_FORMAT).to_string()
}

/// 从存储串解析批次时间戳
pub fn parse_upload_timestamp(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, UPLOAD_TS_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| RepositoryError::FieldValueError {
            field: "upload_timestamp".to_string(),
            message: format!("无法解析时间戳 {}: {}", raw, e),
        })
}

// ==========================================
// InventoryItemRepository
// ==========================================
pub struct InventoryItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryItemRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 查询全部台账行
    pub fn fetch_all(&self) -> RepositoryResult<Vec<InventoryItem>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, category, quantity, price, shelf_life_months,
                   received_date, usage_probability, market_price,
                   upload_timestamp, created_at
            FROM inventory_item
            ORDER BY id ASC
            "#,
        )?;

        let items = stmt
            .query_map([], Self::map_item_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// 查询一个导入批次的台账行
    ///
    /// # 参数
    /// - upload_timestamp: 批次标记，按整秒粒度相等匹配
    pub fn fetch_by_upload_timestamp(
        &self,
        upload_timestamp: DateTime<Utc>,
    ) -> RepositoryResult<Vec<InventoryItem>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, category, quantity, price, shelf_life_months,
                   received_date, usage_probability, market_price,
                   upload_timestamp, created_at
            FROM inventory_item
            WHERE upload_timestamp = ?1
            ORDER BY id ASC
            "#,
        )?;

        let items = stmt
            .query_map(
                params![format_upload_timestamp(upload_timestamp)],
                Self::map_item_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// 按 id 查询单行
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<InventoryItem>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let item = conn
            .query_row(
                r#"
                SELECT id, name, category, quantity, price, shelf_life_months,
                       received_date, usage_probability, market_price,
                       upload_timestamp, created_at
                FROM inventory_item
                WHERE id = ?1
                "#,
                params![id],
                Self::map_item_row,
            )
            .optional()?;

        Ok(item)
    }

    /// 列出全部导入批次及各批行数（按时间倒序）
    pub fn list_upload_batches(&self) -> RepositoryResult<Vec<(DateTime<Utc>, i64)>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT upload_timestamp, COUNT(*)
            FROM inventory_item
            GROUP BY upload_timestamp
            ORDER BY upload_timestamp DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut batches = Vec::with_capacity(rows.len());
        for (raw_ts, count) in rows {
            batches.push((parse_upload_timestamp(&raw_ts)?, count));
        }
        Ok(batches)
    }

    /// 删除一个导入批次的全部台账行
    ///
    /// 计提历史经外键 ON DELETE CASCADE 一并删除
    ///
    /// # 返回
    /// 删除的行数
    pub fn delete_by_upload_timestamp(
        &self,
        upload_timestamp: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let deleted = conn.execute(
            "DELETE FROM inventory_item WHERE upload_timestamp = ?1",
            params![format_upload_timestamp(upload_timestamp)],
        )?;

        Ok(deleted)
    }

    /// 行映射: SELECT 列序与 inventory_item 表一致
    fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryItem> {
        let upload_timestamp: NaiveDateTime = row.get(9)?;
        let created_at: NaiveDateTime = row.get(10)?;

        Ok(InventoryItem {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            quantity: row.get(3)?,
            price: row.get(4)?,
            shelf_life_months: row.get(5)?,
            received_date: row.get(6)?,
            usage_probability: row.get(7)?,
            market_price: row.get(8)?,
            upload_timestamp: upload_timestamp.and_utc(),
            created_at: created_at.and_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upload_timestamp_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 45).unwrap();
        let raw = format_upload_timestamp(ts);
        assert_eq!(raw, "2026-03-15 09:30:45");
        assert_eq!(parse_upload_timestamp(&raw).unwrap(), ts);
    }

    #[test]
    fn test_format_truncates_subseconds() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 45).unwrap()
            + chrono::Duration::milliseconds(987);
        assert_eq!(format_upload_timestamp(ts), "2026-03-15 09:30:45");
    }

    #[test]
    fn test_parse_invalid_timestamp() {
        assert!(parse_upload_timestamp("2026/03/15").is_err());
    }
}
