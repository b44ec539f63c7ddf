// ==========================================
// 存货跌价准备计算系统 - 批量计提引擎
// ==========================================
// 职责: 对台账快照逐项计提并落库
// 流程: 取数 → 查上次计提 → 校验 → 计算 → 单事务落库
// 红线: 任一 item 失败即整批中止回滚，不跳过、不部分提交
// ==========================================
// 已知并发口径: 多个批次同时作用于重叠 item 集时不做协调，
// “上次计提额”按最后提交者生效，由 Store 事务隔离兜底
// ==========================================

use crate::domain::reserve::ReserveCalculation;
use crate::domain::types::ReserveMethod;
use crate::engine::calculator::ReserveCalculator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::validator::ItemValidator;
use crate::repository::item_repo::InventoryItemRepository;
use crate::repository::reserve_repo::ReserveCalculationRepository;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Instant;

// ==========================================
// BatchScope - 计提目标集
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchScope {
    /// 全部台账行
    All,
    /// 一个导入批次（批次标记按整秒粒度相等匹配）
    Upload(DateTime<Utc>),
}

// ==========================================
// BatchOutcome - 批量计提结果
// ==========================================
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub method: ReserveMethod,        // 所用计提方法
    pub calculation_date: NaiveDate,  // 本次运行的计提日期（全批同一天）
    pub items_processed: usize,       // 落库的计提记录数（= 目标 item 数）
    pub elapsed_ms: i64,              // 运行耗时（毫秒）
}

// ==========================================
// ReserveBatchRunner - 批量计提引擎
// ==========================================
pub struct ReserveBatchRunner {
    item_repo: Arc<InventoryItemRepository>,
    reserve_repo: Arc<ReserveCalculationRepository>,
    validator: ItemValidator,
    calculator: ReserveCalculator,
}

impl ReserveBatchRunner {
    /// 构造函数
    ///
    /// # 参数
    /// - item_repo: 台账仓储
    /// - reserve_repo: 计提记录仓储
    pub fn new(
        item_repo: Arc<InventoryItemRepository>,
        reserve_repo: Arc<ReserveCalculationRepository>,
    ) -> Self {
        Self {
            item_repo,
            reserve_repo,
            validator: ItemValidator::new(),
            calculator: ReserveCalculator::new(),
        }
    }

    /// 对目标集执行一次批量计提
    ///
    /// # 参数
    /// - scope: 目标 item 集（全部 / 单个导入批次）
    /// - method: 计提方法
    ///
    /// # 返回
    /// - Ok(BatchOutcome): 全批成功落库
    /// - Err(EngineError::BatchAborted): 任一环节失败，无任何行落库
    pub fn run(&self, scope: BatchScope, method: ReserveMethod) -> EngineResult<BatchOutcome> {
        self.run_inner(scope, method).map_err(|source| {
            tracing::error!(method = %method, error = %source, "批量计提中止，已回滚");
            EngineError::BatchAborted {
                method,
                source: Box::new(source),
            }
        })
    }

    fn run_inner(&self, scope: BatchScope, method: ReserveMethod) -> EngineResult<BatchOutcome> {
        let started = Instant::now();
        let today = Local::now().date_naive();

        // === 步骤 1: 确定目标 item 集 ===
        let items = match scope {
            BatchScope::All => self.item_repo.fetch_all()?,
            BatchScope::Upload(upload_timestamp) => {
                self.item_repo.fetch_by_upload_timestamp(upload_timestamp)?
            }
        };
        tracing::info!(
            count = items.len(),
            method = %method,
            calculation_date = %today,
            "开始批量计提"
        );

        // === 步骤 2-4: 逐项 查上次计提 → 校验 → 计算 ===
        let mut calculations = Vec::with_capacity(items.len());
        for item in &items {
            let prev_reserve = self
                .reserve_repo
                .fetch_latest_for_item(item.id)?
                .map(|(amount, _date)| amount)
                .unwrap_or(0.0);

            if let Err(e) = self.validator.validate(item) {
                tracing::error!(item_id = item.id, error = %e, "台账行校验失败");
                return Err(e.into());
            }

            let reserve = self
                .calculator
                .calculate(item, method, prev_reserve, today)?;

            calculations.push(ReserveCalculation::new(item.id, reserve, method, today));
        }

        // === 步骤 5: 单事务落库（全有或全无）===
        let inserted = self.reserve_repo.insert_batch(&calculations)?;

        let elapsed_ms = started.elapsed().as_millis() as i64;
        tracing::info!(
            inserted,
            method = %method,
            elapsed_ms,
            "批量计提完成"
        );

        Ok(BatchOutcome {
            method,
            calculation_date: today,
            items_processed: inserted,
            elapsed_ms,
        })
    }
}
