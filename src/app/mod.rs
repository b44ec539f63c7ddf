// ==========================================
// 存货跌价准备计算系统 - 应用层
// ==========================================
// 职责: 共享连接与接口装配
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
