// ==========================================
// 存货跌价准备计算系统 - 计提记录仓储
// ==========================================
// 职责: reserve_calculation 表的数据访问
// 约束: 历史仅追加；批量插入必须单事务全有或全无
// ==========================================

use crate::domain::reserve::ReserveCalculation;
use crate::domain::types::ReserveMethod;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// ReserveCalculationRepository
// ==========================================
pub struct ReserveCalculationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReserveCalculationRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 批量插入计提记录（单事务，全有或全无）
    ///
    /// # 返回
    /// 插入的行数
    pub fn insert_batch(&self, calculations: &[ReserveCalculation]) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let count = Self::insert_batch_tx(&tx, calculations)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 在事务中批量插入
    fn insert_batch_tx(
        tx: &Transaction,
        calculations: &[ReserveCalculation],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO reserve_calculation (
                item_id, calculated_reserve, method_used, calculation_date
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;

        let mut count = 0;
        for calc in calculations {
            stmt.execute(params![
                calc.item_id,
                calc.calculated_reserve,
                calc.method_used.as_str(),
                calc.calculation_date.to_string(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 查询某 item 最近一次计提
    ///
    /// 口径: (calculation_date DESC, id DESC) 排序首条；
    /// 自增 id 保证同日多条记录有确定先后
    ///
    /// # 返回
    /// - Some((计提额, 计提日期))
    /// - None: 尚无计提记录
    pub fn fetch_latest_for_item(
        &self,
        item_id: i64,
    ) -> RepositoryResult<Option<(f64, NaiveDate)>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let latest = conn
            .query_row(
                r#"
                SELECT calculated_reserve, calculation_date
                FROM reserve_calculation
                WHERE item_id = ?1
                ORDER BY calculation_date DESC, id DESC
                LIMIT 1
                "#,
                params![item_id],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, NaiveDate>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(latest)
    }

    /// 查询某 item 的全部计提历史（新到旧）
    pub fn fetch_history_for_item(
        &self,
        item_id: i64,
    ) -> RepositoryResult<Vec<ReserveCalculation>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, item_id, calculated_reserve, method_used, calculation_date, created_at
            FROM reserve_calculation
            WHERE item_id = ?1
            ORDER BY calculation_date DESC, id DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![item_id], |row| {
                let created_at: NaiveDateTime = row.get(5)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, NaiveDate>(4)?,
                    created_at,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut calcs = Vec::with_capacity(rows.len());
        for (id, item_id, reserve, raw_method, date, created_at) in rows {
            let method = ReserveMethod::parse(&raw_method).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "method_used".to_string(),
                    message: format!("未知计提方法: {}", raw_method),
                }
            })?;
            calcs.push(ReserveCalculation {
                id: Some(id),
                item_id,
                calculated_reserve: reserve,
                method_used: method,
                calculation_date: date,
                created_at: Some(created_at.and_utc()),
            });
        }
        Ok(calcs)
    }

    /// 查询每个 item 的最近一次计提（导出用）
    ///
    /// # 返回
    /// (item_id, 计提额, 方法, 计提日期) 列表
    pub fn fetch_latest_all(
        &self,
    ) -> RepositoryResult<Vec<(i64, f64, ReserveMethod, NaiveDate)>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT rc.item_id, rc.calculated_reserve, rc.method_used, rc.calculation_date
            FROM reserve_calculation rc
            WHERE rc.id = (
                SELECT rc2.id
                FROM reserve_calculation rc2
                WHERE rc2.item_id = rc.item_id
                ORDER BY rc2.calculation_date DESC, rc2.id DESC
                LIMIT 1
            )
            ORDER BY rc.item_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, NaiveDate>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut latest = Vec::with_capacity(rows.len());
        for (item_id, reserve, raw_method, date) in rows {
            let method = ReserveMethod::parse(&raw_method).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "method_used".to_string(),
                    message: format!("未知计提方法: {}", raw_method),
                }
            })?;
            latest.push((item_id, reserve, method, date));
        }
        Ok(latest)
    }

    /// 统计某 item 的计提记录数
    pub fn count_for_item(&self, item_id: i64) -> RepositoryResult<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count = conn.query_row(
            "SELECT COUNT(*) FROM reserve_calculation WHERE item_id = ?1",
            params![item_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
