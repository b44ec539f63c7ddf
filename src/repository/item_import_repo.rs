// ==========================================
// 存货跌价准备计算系统 - 台账导入仓储接口
// ==========================================
// 职责: 定义导入落库的数据访问接口
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::item::{ImportBatch, NewInventoryItem};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 台账导入仓储接口
#[async_trait]
pub trait ItemImportRepository: Send + Sync {
    /// 批量插入台账行（事务化，全有或全无）
    ///
    /// # 参数
    /// - items: 待入库台账行
    /// - upload_timestamp: 本批次统一的批次标记（整秒粒度）
    ///
    /// # 返回
    /// 插入的行数
    async fn batch_insert_items(
        &self,
        items: Vec<NewInventoryItem>,
        upload_timestamp: DateTime<Utc>,
    ) -> RepositoryResult<usize>;

    /// 写入导入批次审计记录
    async fn insert_import_batch(&self, batch: ImportBatch) -> RepositoryResult<()>;
}
