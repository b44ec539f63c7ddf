// ==========================================
// 存货跌价准备计算系统 - 领域层
// ==========================================
// 职责: 实体与值类型定义
// 约束: 领域对象不含持久化/计算逻辑，由 Store 构造、引擎只读
// ==========================================

pub mod item;
pub mod reserve;
pub mod types;

// 重导出核心类型
pub use item::{
    ImportBatch, ImportReport, ImportRowError, InventoryItem, NewInventoryItem, RawItemRecord,
};
pub use reserve::ReserveCalculation;
pub use types::{ReserveChange, ReserveMethod};
