// ==========================================
// 存货跌价准备计算系统 - 计提业务接口
// ==========================================
// 职责: 面向调用方（CLI/嵌入方）的应用门面
// 说明: 方法字符串在此边界解析为封闭枚举；
//       未知方法立即报错，绝不进入计提引擎
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::item::{ImportReport, InventoryItem};
use crate::domain::reserve::ReserveCalculation;
use crate::domain::types::ReserveMethod;
use crate::engine::batch_runner::{BatchOutcome, BatchScope, ReserveBatchRunner};
use crate::export::ReserveCsvExporter;
use crate::importer::item_importer::{ItemImporter, ItemImporterImpl};
use crate::repository::item_import_repo_impl::ItemImportRepositoryImpl;
use crate::repository::item_repo::{parse_upload_timestamp, InventoryItemRepository};
use crate::repository::reserve_repo::ReserveCalculationRepository;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use std::sync::Arc;

// ==========================================
// ReserveApi - 计提业务接口
// ==========================================
pub struct ReserveApi {
    item_repo: Arc<InventoryItemRepository>,
    reserve_repo: Arc<ReserveCalculationRepository>,
    runner: ReserveBatchRunner,
    exporter: ReserveCsvExporter,
    importer: ItemImporterImpl<ItemImportRepositoryImpl>,
    config: ConfigManager,
}

impl ReserveApi {
    /// 构造函数
    pub fn new(
        item_repo: Arc<InventoryItemRepository>,
        reserve_repo: Arc<ReserveCalculationRepository>,
        importer: ItemImporterImpl<ItemImportRepositoryImpl>,
        config: ConfigManager,
    ) -> Self {
        let runner = ReserveBatchRunner::new(item_repo.clone(), reserve_repo.clone());
        let exporter = ReserveCsvExporter::new(item_repo.clone(), reserve_repo.clone());
        Self {
            item_repo,
            reserve_repo,
            runner,
            exporter,
            importer,
            config,
        }
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 从电子表格文件导入台账数据
    pub async fn import_items(&self, file_path: &Path) -> ApiResult<ImportReport> {
        Ok(self.importer.import_file(file_path).await?)
    }

    // ==========================================
    // 计提
    // ==========================================

    /// 对全部台账行执行批量计提
    ///
    /// # 参数
    /// - method: 方法标识字符串；None 时取配置的默认方法
    pub fn calculate_all(&self, method: Option<&str>) -> ApiResult<BatchOutcome> {
        let method = self.resolve_method(method)?;
        Ok(self.runner.run(BatchScope::All, method)?)
    }

    /// 对一个导入批次执行批量计提
    ///
    /// # 参数
    /// - upload_timestamp: 批次标记，格式 YYYY-MM-DD HH:MM:SS
    /// - method: 方法标识字符串；None 时取配置的默认方法
    pub fn calculate_upload_batch(
        &self,
        upload_timestamp: &str,
        method: Option<&str>,
    ) -> ApiResult<BatchOutcome> {
        let ts = self.parse_batch_timestamp(upload_timestamp)?;
        let method = self.resolve_method(method)?;
        Ok(self.runner.run(BatchScope::Upload(ts), method)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 全部台账行
    pub fn list_items(&self) -> ApiResult<Vec<InventoryItem>> {
        Ok(self.item_repo.fetch_all()?)
    }

    /// 一个导入批次的台账行
    pub fn list_batch_items(&self, upload_timestamp: &str) -> ApiResult<Vec<InventoryItem>> {
        let ts = self.parse_batch_timestamp(upload_timestamp)?;
        Ok(self.item_repo.fetch_by_upload_timestamp(ts)?)
    }

    /// 全部导入批次及行数（新到旧）
    pub fn list_upload_batches(&self) -> ApiResult<Vec<(DateTime<Utc>, i64)>> {
        Ok(self.item_repo.list_upload_batches()?)
    }

    /// 某 item 的计提历史（新到旧）
    pub fn reserve_history(&self, item_id: i64) -> ApiResult<Vec<ReserveCalculation>> {
        if self.item_repo.find_by_id(item_id)?.is_none() {
            return Err(ApiError::NotFound(format!("台账行 id={}", item_id)));
        }
        Ok(self.reserve_repo.fetch_history_for_item(item_id)?)
    }

    /// 某 item 的最近一次计提
    pub fn latest_reserve(&self, item_id: i64) -> ApiResult<Option<(f64, NaiveDate)>> {
        if self.item_repo.find_by_id(item_id)?.is_none() {
            return Err(ApiError::NotFound(format!("台账行 id={}", item_id)));
        }
        Ok(self.reserve_repo.fetch_latest_for_item(item_id)?)
    }

    // ==========================================
    // 维护
    // ==========================================

    /// 删除一个导入批次（台账行 + 级联计提历史）
    ///
    /// # 返回
    /// 删除的台账行数
    pub fn delete_upload_batch(&self, upload_timestamp: &str) -> ApiResult<usize> {
        let ts = self.parse_batch_timestamp(upload_timestamp)?;
        let deleted = self.item_repo.delete_by_upload_timestamp(ts)?;
        tracing::info!(upload_timestamp = %ts, deleted, "导入批次已删除");
        Ok(deleted)
    }

    /// 导出台账及最近计提结果为 CSV
    pub fn export_csv(&self, output_path: &Path) -> ApiResult<usize> {
        Ok(self.exporter.export_latest(output_path)?)
    }

    /// 设置默认计提方法（写入配置）
    pub fn set_default_method(&self, method: &str) -> ApiResult<()> {
        let parsed = ReserveMethod::parse(method)
            .ok_or_else(|| ApiError::UnknownMethod(method.to_string()))?;
        self.config
            .set_value(crate::config::config_keys::DEFAULT_METHOD, parsed.as_str())?;
        Ok(())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 解析方法字符串；None 取配置默认值
    fn resolve_method(&self, method: Option<&str>) -> ApiResult<ReserveMethod> {
        match method {
            Some(raw) => {
                ReserveMethod::parse(raw).ok_or_else(|| ApiError::UnknownMethod(raw.to_string()))
            }
            None => Ok(self.config.get_default_method()?),
        }
    }

    /// 解析批次标记字符串
    fn parse_batch_timestamp(&self, raw: &str) -> ApiResult<DateTime<Utc>> {
        parse_upload_timestamp(raw.trim()).map_err(|_| {
            ApiError::InvalidInput(format!(
                "批次标记格式错误: {}（期望 YYYY-MM-DD HH:MM:SS）",
                raw
            ))
        })
    }
}
