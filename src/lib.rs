// ==========================================
// 存货跌价准备计算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 台账导入 + 跌价准备计提 + 历史留痕
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 校验/计提/批量编排
pub mod engine;

// 导入层 - 电子表格台账数据
pub mod importer;

// 导出层 - 计提结果 CSV
pub mod export;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/schema 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ReserveChange, ReserveMethod};

// 领域实体
pub use domain::{ImportBatch, ImportReport, InventoryItem, ReserveCalculation};

// 引擎
pub use engine::{
    BatchOutcome, BatchScope, ItemValidator, ReserveBatchRunner, ReserveCalculator,
};

// API
pub use api::ReserveApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "存货跌价准备计算系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
