// ==========================================
// 存货跌价准备计算系统 - 计提引擎
// ==========================================
// 职责: 单条台账行的跌价准备计算
// 输入: 台账行 + 计提方法 + 上次计提额 + 计算基准日
// 输出: 计提额 ∈ [0, 数量×单价]，两位小数
// ==========================================
// 约定:
// - 引擎只读台账行，诊断走 tracing，不影响返回值
// - 入库日期解析失败按当日兜底并告警，不中止计算
// ==========================================

use crate::domain::item::InventoryItem;
use crate::domain::types::{ReserveChange, ReserveMethod};
use crate::engine::error::ValidationError;
use crate::engine::validator::{required_fields, ItemValidator};
use chrono::{Datelike, NaiveDate};

/// 入库日期接受的格式（电子表格常见写法）
const RECEIVED_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

// ==========================================
// ReserveCalculator - 计提引擎
// ==========================================
pub struct ReserveCalculator {
    validator: ItemValidator,
}

impl ReserveCalculator {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            validator: ItemValidator::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算单条台账行的跌价准备
    ///
    /// # 参数
    /// - `item`: 台账行（只读）
    /// - `method`: 计提方法
    /// - `prev_reserve`: 上次计提额（无历史时传 0）
    /// - `today`: 计算基准日（调用方传入，保证可测性）
    ///
    /// # 返回
    /// - Ok(reserve): 计提额，0 ≤ reserve ≤ 数量×单价，两位小数
    /// - Err(ValidationError): 台账行结构/取值校验失败
    pub fn calculate(
        &self,
        item: &InventoryItem,
        method: ReserveMethod,
        prev_reserve: f64,
        today: NaiveDate,
    ) -> Result<f64, ValidationError> {
        self.validator.validate(item)?;
        let (quantity, price, shelf_life_months, received_raw) = required_fields(item)?;

        // ===== 公共量 =====
        let quantity = quantity as f64;
        let max_reserve = quantity * price;

        let received = parse_received_date(item.id, received_raw, today);
        // 整月差，忽略日；未来日期截到 0，保证各分项非负
        let months_elapsed = months_between(received, today).max(0);

        // 未动用份额: 使用概率的补数，缺省概率 100 ⇒ 份额 0
        let unused_share = 1.0 - item.usage_probability.unwrap_or(100.0) / 100.0;

        // 市价缺口: 单价高出市价的部分 × 数量；市价缺失或为负时不参与
        let market_shortfall = item
            .market_price
            .filter(|mp| *mp >= 0.0)
            .map(|mp| (price - mp).max(0.0) * quantity);

        // ===== 分方法计算 =====
        let raw_reserve = match method {
            ReserveMethod::Standard => {
                // 使用侵蚀估计与市价缺口估计取大
                let coef = shelf_life_coef(months_elapsed, shelf_life_months);
                let usage_erosion = max_reserve * coef * unused_share;
                usage_erosion.max(market_shortfall.unwrap_or(0.0))
            }
            ReserveMethod::ShelfLife => {
                // 仅按保质期系数；市价缺口是上限而非下限
                let coef = shelf_life_coef(months_elapsed, shelf_life_months);
                let mut reserve = max_reserve * coef;
                if let Some(shortfall) = market_shortfall {
                    reserve = reserve.min(shortfall);
                }
                reserve
            }
            ReserveMethod::Market => {
                // 只看市价缺口，保质期/使用概率一概不参与
                market_shortfall.unwrap_or(0.0)
            }
            ReserveMethod::Conservative => {
                if shelf_life_months > 0 && months_elapsed > shelf_life_months {
                    // 已过保质期: 全额计提
                    max_reserve
                } else {
                    // 系数放缓到 1.5 倍保质期；无保质期约束时系数为 0
                    let coef = if shelf_life_months > 0 {
                        (months_elapsed as f64 / (shelf_life_months as f64 * 1.5)).min(1.0)
                    } else {
                        0.0
                    };
                    let mut reserve = max_reserve * coef;
                    if let Some(shortfall) = market_shortfall {
                        reserve = reserve.max(shortfall);
                    }
                    reserve
                }
            }
        };

        // ===== 收口: 两位小数，封顶 max_reserve，保底 0 =====
        let reserve = round2(raw_reserve).min(max_reserve).max(0.0);

        // ===== 诊断输出（只记日志，不影响返回值）=====
        let change = ReserveChange::classify(prev_reserve, reserve);
        match change {
            ReserveChange::Release => tracing::debug!(
                item_id = item.id,
                prev_reserve,
                reserve,
                "跌价准备释放"
            ),
            ReserveChange::Accrual => tracing::debug!(
                item_id = item.id,
                prev_reserve,
                reserve,
                "跌价准备增提"
            ),
            ReserveChange::Unchanged => {}
        }
        tracing::info!(
            item_id = item.id,
            method = %method,
            prev_reserve,
            reserve,
            change = %change,
            "跌价准备计算完成"
        );

        Ok(reserve)
    }
}

impl Default for ReserveCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 公共计算量
// ==========================================

/// 保质期系数: min(1, 已存放整月数 / 保质期月数)
///
/// 保质期为 0 表示无保质期约束，系数按饱和值 1 处理
fn shelf_life_coef(months_elapsed: i64, shelf_life_months: i64) -> f64 {
    if shelf_life_months > 0 {
        (months_elapsed as f64 / shelf_life_months as f64).min(1.0)
    } else {
        1.0
    }
}

/// 整月差: (年差×12 + 月差)，忽略日
fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let year_diff = i64::from(to.year() - from.year());
    let month_diff = i64::from(to.month() as i32 - from.month() as i32);
    year_diff * 12 + month_diff
}

/// 解析入库日期；解析失败按当日兜底并告警（可恢复，不中止计算）
fn parse_received_date(item_id: i64, raw: &str, today: NaiveDate) -> NaiveDate {
    let trimmed = raw.trim();
    for format in RECEIVED_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date;
        }
    }

    tracing::warn!(
        item_id,
        received_date = raw,
        "入库日期无法解析，按当日处理"
    );
    today
}

/// 四舍五入到两位小数
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
