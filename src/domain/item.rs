// ==========================================
// 存货跌价准备计算系统 - 存货领域模型
// ==========================================
// 用途: 导入层写入，引擎层只读
// 约束: InventoryItem 为不可变值对象，由 Store 构造后按引用传入
//       Validator/Calculator，引擎不得修改
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryItem - 存货台账行
// ==========================================
// 数值字段允许缺失：电子表格来源的数据可能残缺，
// 缺失/越界由 Validator 判定为校验失败，不做静默修正
// 对齐: inventory_item 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    // ===== 主键 =====
    pub id: i64, // Store 赋值，构造后不变

    // ===== 基础信息 =====
    pub name: Option<String>,     // 物料名称
    pub category: Option<String>, // 分类

    // ===== 计提输入 =====
    pub quantity: Option<i64>,          // 数量（非负整数）
    pub price: Option<f64>,             // 账面单价（非负）
    pub shelf_life_months: Option<i64>, // 保质期月数（0 = 无保质期约束）
    pub received_date: Option<String>,  // 入库日期原始串（解析失败按当日处理）
    pub usage_probability: Option<f64>, // 使用概率 [0,100]，缺省按 100
    pub market_price: Option<f64>,      // 市场单价（缺失时禁用市价相关调整）

    // ===== 批次信息 =====
    pub upload_timestamp: DateTime<Utc>, // 导入批次标记（同批全同，整秒粒度）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
}

// ==========================================
// NewInventoryItem - 入库前的台账行
// ==========================================
// 用途: 导入管道产物，尚未获得 Store 分配的 id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub shelf_life_months: Option<i64>,
    pub received_date: Option<String>,
    pub usage_probability: Option<f64>,
    pub market_price: Option<f64>,
}

// ==========================================
// RawItemRecord - 导入中间结构体
// ==========================================
// 用途: 导入管道中间产物（文件解析 → 字段映射 → 此结构）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItemRecord {
    // 源字段（已类型转换）
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub shelf_life_months: Option<i64>,
    pub received_date: Option<String>,
    pub usage_probability: Option<f64>,
    pub market_price: Option<f64>,

    // 元信息
    pub row_number: usize, // 原始文件行号（用于导入报告）
}

impl RawItemRecord {
    /// 转换为待入库台账行（去掉导入元信息）
    pub fn into_new_item(self) -> NewInventoryItem {
        NewInventoryItem {
            name: self.name,
            category: self.category,
            quantity: self.quantity,
            price: self.price,
            shelf_life_months: self.shelf_life_months,
            received_date: self.received_date,
            usage_probability: self.usage_probability,
            market_price: self.market_price,
        }
    }
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 用途: 记录导入批次元信息
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                   // 批次 ID（UUID）
    pub file_name: Option<String>,          // 源文件名
    pub total_rows: i64,                    // 总行数
    pub success_rows: i64,                  // 成功导入行数
    pub failed_rows: i64,                   // 映射失败行数
    pub upload_timestamp: DateTime<Utc>,    // 本批次所有台账行共享的批次标记
    pub imported_at: Option<DateTime<Utc>>, // 导入时间
    pub elapsed_ms: Option<i64>,            // 导入耗时（毫秒）
    pub row_errors_json: Option<String>,    // 行级错误明细 JSON
}

// ==========================================
// ImportRowError - 行级导入错误
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row_number: usize, // 原始文件行号
    pub field: String,     // 出错字段（无法定位时为空串）
    pub message: String,   // 错误描述
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
// 用途: 导入接口返回值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch: ImportBatch,              // 批次信息
    pub row_errors: Vec<ImportRowError>, // 行级错误明细
}
