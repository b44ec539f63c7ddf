// ==========================================
// 存货跌价准备计算系统 - 领域类型定义
// ==========================================
// 计提方法为封闭枚举：调度处必须全覆盖匹配，
// 未知方法字符串只能在解析边界显式失败
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计提方法 (Reserve Method)
// ==========================================
// 序列化格式: snake_case (与历史数据/接口字符串一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveMethod {
    Standard,     // 标准法: 使用概率侵蚀与市价缺口取大
    ShelfLife,    // 保质期法: 仅按保质期系数，市价缺口封顶
    Market,       // 市价法: 仅看市价缺口
    Conservative, // 谨慎法: 过期全额计提，系数放缓，市价缺口托底
}

impl ReserveMethod {
    /// 全部方法（遍历用）
    pub const ALL: [ReserveMethod; 4] = [
        ReserveMethod::Standard,
        ReserveMethod::ShelfLife,
        ReserveMethod::Market,
        ReserveMethod::Conservative,
    ];

    /// 方法标识字符串（与数据库 method_used 列一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            ReserveMethod::Standard => "standard",
            ReserveMethod::ShelfLife => "shelf_life",
            ReserveMethod::Market => "market",
            ReserveMethod::Conservative => "conservative",
        }
    }

    /// 从方法标识字符串解析
    ///
    /// # 返回
    /// - Some(method): 四种已定义方法之一
    /// - None: 未知方法（调用方必须显式报错，不允许静默回退）
    pub fn parse(s: &str) -> Option<ReserveMethod> {
        match s.trim() {
            "standard" => Some(ReserveMethod::Standard),
            "shelf_life" => Some(ReserveMethod::ShelfLife),
            "market" => Some(ReserveMethod::Market),
            "conservative" => Some(ReserveMethod::Conservative),
            _ => None,
        }
    }
}

impl fmt::Display for ReserveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 准备金变动方向 (Reserve Change)
// ==========================================
// 与上次计提额对比的诊断分类，仅用于日志输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReserveChange {
    Release,   // 释放: 上次 > 本次
    Accrual,   // 增提: 上次 < 本次
    Unchanged, // 不变
}

impl ReserveChange {
    /// 按分位（两位小数）比较上次与本次计提额
    ///
    /// 两侧均为已舍入到分的金额，先换算为整数分再比较，
    /// 避免浮点尾差把“不变”误判成释放/增提
    pub fn classify(prev_reserve: f64, new_reserve: f64) -> ReserveChange {
        let prev_cents = (prev_reserve * 100.0).round() as i64;
        let new_cents = (new_reserve * 100.0).round() as i64;

        if prev_cents > new_cents {
            ReserveChange::Release
        } else if prev_cents < new_cents {
            ReserveChange::Accrual
        } else {
            ReserveChange::Unchanged
        }
    }
}

impl fmt::Display for ReserveChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReserveChange::Release => write!(f, "RELEASE"),
            ReserveChange::Accrual => write!(f, "ACCRUAL"),
            ReserveChange::Unchanged => write!(f, "UNCHANGED"),
        }
    }
}
