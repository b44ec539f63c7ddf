// ==========================================
// 存货跌价准备计算系统 - 台账导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 映射 → 落库（单事务）→ 批次审计
// 口径: 映射失败的行记入导入报告后跳过，有效行照常入库；
//       同一次导入的所有行共享同一个整秒批次标记
// ==========================================

use crate::domain::item::{ImportBatch, ImportReport, ImportRowError};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::ItemFieldMapper;
use crate::importer::file_parser::FileParser;
use crate::repository::item_import_repo::ItemImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 台账导入器接口
#[async_trait]
pub trait ItemImporter: Send + Sync {
    /// 从电子表格文件导入台账数据
    ///
    /// # 参数
    /// - file_path: 文件路径（.xlsx/.xls/.csv）
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入结果（批次信息 + 行级错误）
    /// - Err(ImportError): 文件级失败（无法解析/落库失败）
    async fn import_file(&self, file_path: &Path) -> ImportResult<ImportReport>;
}

// ==========================================
// ItemImporterImpl - 台账导入器实现
// ==========================================
pub struct ItemImporterImpl<R>
where
    R: ItemImportRepository,
{
    // 数据访问层
    import_repo: R,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: ItemFieldMapper,
}

impl<R> ItemImporterImpl<R>
where
    R: ItemImportRepository,
{
    /// 创建新的 ItemImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - file_parser: 文件解析器
    pub fn new(import_repo: R, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            import_repo,
            file_parser,
            field_mapper: ItemFieldMapper::new(),
        }
    }

    /// 本批次统一的批次标记（当前时刻截断到整秒）
    fn batch_timestamp() -> DateTime<Utc> {
        let now = Utc::now();
        DateTime::<Utc>::from_timestamp(now.timestamp(), 0).unwrap_or(now)
    }
}

#[async_trait]
impl<R> ItemImporter for ItemImporterImpl<R>
where
    R: ItemImportRepository,
{
    async fn import_file(&self, file_path: &Path) -> ImportResult<ImportReport> {
        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());

        info!(
            batch_id = %batch_id,
            file = file_name.as_deref().unwrap_or("unknown"),
            "开始导入台账数据"
        );

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let rows = self.file_parser.parse_to_rows(file_path)?;
        let total_rows = rows.len();
        info!(total_rows, "文件解析完成");

        // === 步骤 2: 字段映射 ===
        debug!("步骤 2: 字段映射");
        let mut records = Vec::new();
        let mut row_errors = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            match self.field_mapper.map_to_raw_item(row, row_number) {
                Ok(record) => records.push(record),
                Err(ImportError::TypeConversionError { row, field, message }) => {
                    warn!(row_number = row, field = %field, "字段映射失败");
                    row_errors.push(ImportRowError {
                        row_number: row,
                        field,
                        message,
                    });
                }
                Err(e) => {
                    warn!(row_number, error = %e, "字段映射失败");
                    row_errors.push(ImportRowError {
                        row_number,
                        field: String::new(),
                        message: e.to_string(),
                    });
                }
            }
        }
        info!(
            success = records.len(),
            failed = row_errors.len(),
            "字段映射完成"
        );

        // === 步骤 3: 落库（单事务）===
        debug!("步骤 3: 批量落库");
        let upload_timestamp = Self::batch_timestamp();
        let new_items: Vec<_> = records.into_iter().map(|r| r.into_new_item()).collect();
        let inserted = self
            .import_repo
            .batch_insert_items(new_items, upload_timestamp)
            .await?;
        info!(inserted, upload_timestamp = %upload_timestamp, "台账落库完成");

        // === 步骤 4: 批次审计 ===
        debug!("步骤 4: 写入批次审计");
        let elapsed_ms = started.elapsed().as_millis() as i64;
        let row_errors_json = if row_errors.is_empty() {
            None
        } else {
            serde_json::to_string(&row_errors).ok()
        };
        let batch = ImportBatch {
            batch_id,
            file_name,
            total_rows: total_rows as i64,
            success_rows: inserted as i64,
            failed_rows: row_errors.len() as i64,
            upload_timestamp,
            imported_at: Some(Utc::now()),
            elapsed_ms: Some(elapsed_ms),
            row_errors_json,
        };
        self.import_repo.insert_import_batch(batch.clone()).await?;

        info!(
            batch_id = %batch.batch_id,
            success = batch.success_rows,
            failed = batch.failed_rows,
            elapsed_ms,
            "导入完成"
        );

        Ok(ImportReport { batch, row_errors })
    }
}
