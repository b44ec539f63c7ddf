// ==========================================
// 存货跌价准备计算系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================
// 口径:
// - 校验失败/仓储失败逐项中止整批，绝不跳过单行继续
// - 入库日期解析失败不在此列: 那是可恢复告警，按当日兜底
// ==========================================

use crate::domain::types::ReserveMethod;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 数据校验错误
///
/// 按序报告第一个不满足的条件；field 指明出错字段
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("字段缺失: {field}")]
    MissingField { field: &'static str },

    #[error("字段取值非法 (field={field}): {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl ValidationError {
    /// 出错字段名（测试与报告定位用）
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field } => field,
            ValidationError::InvalidValue { field, .. } => field,
        }
    }
}

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("数据校验失败: {0}")]
    Validation(#[from] ValidationError),

    #[error("仓储访问失败: {0}")]
    Repository(#[from] RepositoryError),

    /// 批量计提的聚合错误: 任一 item 失败即整批中止并回滚
    #[error("批量计提中止 (method={method}): {source}")]
    BatchAborted {
        method: ReserveMethod,
        #[source]
        source: Box<EngineError>,
    },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
