// ==========================================
// 存货跌价准备计算系统 - 台账校验器
// ==========================================
// 职责: 计提前的结构/取值校验
// 契约: 只读不改写；按序报告第一个不满足的条件
// 校验序: 必填字段存在性 → quantity → price → shelf_life_months
//         → usage_probability 区间
// ==========================================

use crate::domain::item::InventoryItem;
use crate::engine::error::ValidationError;

/// 必填字段提取结果: (数量, 单价, 保质期月数, 入库日期原始串)
pub(crate) type RequiredFields<'a> = (i64, f64, i64, &'a str);

/// 提取计提所需的必填字段
///
/// 缺失时按 quantity → price → shelf_life_months → received_date
/// 的顺序报告第一个缺失字段
pub(crate) fn required_fields(item: &InventoryItem) -> Result<RequiredFields<'_>, ValidationError> {
    let quantity = item
        .quantity
        .ok_or(ValidationError::MissingField { field: "quantity" })?;
    let price = item
        .price
        .ok_or(ValidationError::MissingField { field: "price" })?;
    let shelf_life_months = item.shelf_life_months.ok_or(ValidationError::MissingField {
        field: "shelf_life_months",
    })?;
    let received_date = item
        .received_date
        .as_deref()
        .ok_or(ValidationError::MissingField {
            field: "received_date",
        })?;

    Ok((quantity, price, shelf_life_months, received_date))
}

// ==========================================
// ItemValidator - 台账校验器
// ==========================================
pub struct ItemValidator {
    // 无状态校验器,不需要注入依赖
}

impl ItemValidator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 校验一条台账行
    ///
    /// # 参数
    /// - item: 待校验台账行
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(ValidationError): 第一个不满足的条件
    ///
    /// # 说明
    /// 越界是校验失败，不做静默修正；name/category/market_price
    /// 为可选字段，超出类型层面不做检查
    pub fn validate(&self, item: &InventoryItem) -> Result<(), ValidationError> {
        let (quantity, price, shelf_life_months, _received_date) = required_fields(item)?;

        if quantity < 0 {
            return Err(ValidationError::InvalidValue {
                field: "quantity",
                message: format!("数量不允许为负: {}", quantity),
            });
        }

        if price < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "price",
                message: format!("单价不允许为负: {}", price),
            });
        }

        if shelf_life_months < 0 {
            return Err(ValidationError::InvalidValue {
                field: "shelf_life_months",
                message: format!("保质期月数不允许为负: {}", shelf_life_months),
            });
        }

        if let Some(probability) = item.usage_probability {
            if !(0.0..=100.0).contains(&probability) {
                return Err(ValidationError::InvalidValue {
                    field: "usage_probability",
                    message: format!("使用概率必须在 [0,100] 区间: {}", probability),
                });
            }
        }

        Ok(())
    }
}

impl Default for ItemValidator {
    fn default() -> Self {
        Self::new()
    }
}
