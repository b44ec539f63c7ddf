// ==========================================
// 存货跌价准备计算系统 - 引擎层
// ==========================================
// 职责: 校验 + 计提公式 + 批量编排
// 红线: Engine 不拼 SQL；计算结果只由输入决定，日志不影响返回值
// ==========================================

pub mod batch_runner;
pub mod calculator;
pub mod error;
pub mod validator;

// 重导出核心引擎
pub use batch_runner::{BatchOutcome, BatchScope, ReserveBatchRunner};
pub use calculator::ReserveCalculator;
pub use error::{EngineError, EngineResult, ValidationError};
pub use validator::ItemValidator;
