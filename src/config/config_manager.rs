// ==========================================
// 存货跌价准备计算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::domain::types::ReserveMethod;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 配置键全集
pub mod config_keys {
    /// 未显式指定方法时使用的计提方法
    pub const DEFAULT_METHOD: &str = "reserve/default_method";
    /// CSV 导出默认路径
    pub const EXPORT_PATH: &str = "export/default_path";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从共享连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取配置值，带默认值
    pub fn get_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self.get_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（存在则覆写）
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 默认计提方法
    ///
    /// 配置缺失按 standard；配置了未知方法串时告警并回退 standard
    /// （显式传入的未知方法仍会在 API 边界报错，这里只兜底配置项）
    pub fn get_default_method(&self) -> RepositoryResult<ReserveMethod> {
        let raw = self.get_or_default(config_keys::DEFAULT_METHOD, "standard")?;
        match ReserveMethod::parse(&raw) {
            Some(method) => Ok(method),
            None => {
                tracing::warn!(
                    configured = %raw,
                    "配置的默认计提方法无效，回退 standard"
                );
                Ok(ReserveMethod::Standard)
            }
        }
    }
}
