// ==========================================
// 存货跌价准备计算系统 - API层错误类型
// ==========================================
// 职责: 定义应用接口错误，转换下层错误为用户可读消息
// 工具: thiserror 派生宏
// ==========================================

use crate::engine::error::EngineError;
use crate::export::ExportError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    /// 未知计提方法: 不允许静默按 0 处理，必须在边界报错
    #[error("未知计提方法: {0}（可用: standard/shelf_life/market/conservative）")]
    UnknownMethod(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 下层错误透传
    // ==========================================
    #[error("计提失败: {0}")]
    Engine(#[from] EngineError),

    #[error("导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("导出失败: {0}")]
    Export(#[from] ExportError),

    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
