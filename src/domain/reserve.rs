// ==========================================
// 存货跌价准备计算系统 - 计提记录领域模型
// ==========================================
// 约束: 计提历史仅追加，记录创建后不可变
// 对齐: reserve_calculation 表
// ==========================================

use crate::domain::types::ReserveMethod;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ReserveCalculation - 单条计提记录
// ==========================================
// “上次计提额”的取数口径: 同一 item 按
// (calculation_date DESC, id DESC) 排序的首条记录；
// id 自增列使同日多次计提的先后次序有确定答案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveCalculation {
    pub id: Option<i64>,                  // Store 赋值（插入前为 None）
    pub item_id: i64,                     // 关联 inventory_item（多条记录对一个 item）
    pub calculated_reserve: f64,          // 计提额，0 ≤ 值 ≤ 数量×单价，两位小数
    pub method_used: ReserveMethod,       // 所用计提方法
    pub calculation_date: NaiveDate,      // 计提日期（批次粒度，同一次运行全同）
    pub created_at: Option<DateTime<Utc>>, // 记录创建时间（Store 赋值）
}

impl ReserveCalculation {
    /// 构造一条待插入的计提记录
    pub fn new(
        item_id: i64,
        calculated_reserve: f64,
        method_used: ReserveMethod,
        calculation_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            item_id,
            calculated_reserve,
            method_used,
            calculation_date,
            created_at: None,
        }
    }
}
