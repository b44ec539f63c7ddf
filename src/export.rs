// ==========================================
// 存货跌价准备计算系统 - 结果导出
// ==========================================
// 职责: 台账连同最近一次计提结果导出为 CSV
// 说明: 只做 CSV；Excel 侧 calamine 仅提供读取能力
// ==========================================

use crate::domain::types::ReserveMethod;
use crate::repository::error::RepositoryError;
use crate::repository::item_repo::InventoryItemRepository;
use crate::repository::reserve_repo::ReserveCalculationRepository;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV 写入失败: {0}")]
    CsvWriteError(#[from] csv::Error),

    #[error("文件写入失败: {0}")]
    FileWriteError(#[from] std::io::Error),

    #[error("仓储访问失败: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;

// ==========================================
// ReserveCsvExporter
// ==========================================
pub struct ReserveCsvExporter {
    item_repo: Arc<InventoryItemRepository>,
    reserve_repo: Arc<ReserveCalculationRepository>,
}

impl ReserveCsvExporter {
    /// 构造函数
    pub fn new(
        item_repo: Arc<InventoryItemRepository>,
        reserve_repo: Arc<ReserveCalculationRepository>,
    ) -> Self {
        Self {
            item_repo,
            reserve_repo,
        }
    }

    /// 导出全部台账行及各自最近一次计提
    ///
    /// 尚无计提记录的行照常导出，计提列留空
    ///
    /// # 返回
    /// 写出的数据行数
    pub fn export_latest(&self, output_path: &Path) -> ExportResult<usize> {
        let items = self.item_repo.fetch_all()?;

        let latest: HashMap<i64, (f64, ReserveMethod, NaiveDate)> = self
            .reserve_repo
            .fetch_latest_all()?
            .into_iter()
            .map(|(item_id, reserve, method, date)| (item_id, (reserve, method, date)))
            .collect();

        let mut writer = csv::Writer::from_path(output_path)?;
        writer.write_record([
            "id",
            "名称",
            "类别",
            "数量",
            "单价",
            "保质期月数",
            "入库日期",
            "使用概率",
            "市场单价",
            "计提额",
            "计提方法",
            "计提日期",
        ])?;

        let mut written = 0;
        for item in &items {
            let (reserve, method, date) = match latest.get(&item.id) {
                Some((reserve, method, date)) => (
                    format!("{:.2}", reserve),
                    method.as_str().to_string(),
                    date.to_string(),
                ),
                None => (String::new(), String::new(), String::new()),
            };

            writer.write_record([
                item.id.to_string(),
                item.name.clone().unwrap_or_default(),
                item.category.clone().unwrap_or_default(),
                item.quantity.map(|v| v.to_string()).unwrap_or_default(),
                item.price.map(|v| v.to_string()).unwrap_or_default(),
                item.shelf_life_months
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                item.received_date.clone().unwrap_or_default(),
                item.usage_probability
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                item.market_price.map(|v| v.to_string()).unwrap_or_default(),
                reserve,
                method,
                date,
            ])?;
            written += 1;
        }

        writer.flush().map_err(ExportError::FileWriteError)?;

        tracing::info!(
            rows = written,
            path = %output_path.display(),
            "计提结果导出完成"
        );
        Ok(written)
    }
}
