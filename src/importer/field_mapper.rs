// ==========================================
// 存货跌价准备计算系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准字段映射 + 类型转换
// 说明: 同一字段接受多个列名写法（中英文别名），
//       入库日期保留原始串，解析留给计提引擎
// ==========================================

use crate::domain::item::RawItemRecord;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

pub struct ItemFieldMapper;

impl ItemFieldMapper {
    pub fn new() -> Self {
        Self {}
    }

    /// 将一行表格数据映射为 RawItemRecord
    ///
    /// # 参数
    /// - row: 表头键控的单元格文本
    /// - row_number: 原始文件行号（数据区从 1 起）
    pub fn map_to_raw_item(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawItemRecord> {
        Ok(RawItemRecord {
            name: self.get_string(row, "名称"),
            category: self.get_string(row, "类别"),
            quantity: self.parse_i64(row, "数量", row_number)?,
            price: self.parse_f64(row, "单价", row_number)?,
            shelf_life_months: self.parse_i64(row, "保质期月数", row_number)?,
            received_date: self.get_string(row, "入库日期"),
            usage_probability: self.parse_f64(row, "使用概率", row_number)?,
            market_price: self.parse_f64(row, "市场单价", row_number)?,
            row_number,
        })
    }

    /// 提取字符串字段（返回 Option），支持多个可能的列名（别名）
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        // 列名别名映射
        let aliases: Vec<&str> = match key {
            "名称" => vec!["名称", "物料名称", "name", "item_name"],
            "类别" => vec!["类别", "分类", "category"],
            "数量" => vec!["数量", "库存数量", "quantity", "qty"],
            "单价" => vec!["单价", "账面单价", "price", "unit_price"],
            "保质期月数" => vec!["保质期月数", "保质期(月)", "保质期", "shelf_life_months"],
            "入库日期" => vec!["入库日期", "收货日期", "received_date", "receipt_date"],
            "使用概率" => vec!["使用概率", "动用概率", "usage_probability"],
            "市场单价" => vec!["市场单价", "市价", "市场价", "market_price"],
            _ => vec![key],
        };

        // 尝试所有可能的列名
        for alias in aliases {
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    /// 解析浮点数
    fn parse_f64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value.parse::<f64>().map(Some).map_err(|_| {
                ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为数值: {}", value),
                }
            }),
        }
    }

    /// 解析整数
    fn parse_i64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<i64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value.parse::<i64>().map(Some).map_err(|_| {
                ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为整数: {}", value),
                }
            }),
        }
    }
}

impl Default for ItemFieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_chinese_headers() {
        let mapper = ItemFieldMapper::new();
        let record = mapper
            .map_to_raw_item(
                &row(&[
                    ("名称", "轴承A"),
                    ("数量", "10"),
                    ("单价", "35.5"),
                    ("保质期月数", "12"),
                    ("入库日期", "2025-08-06"),
                ]),
                1,
            )
            .unwrap();

        assert_eq!(record.name.as_deref(), Some("轴承A"));
        assert_eq!(record.quantity, Some(10));
        assert_eq!(record.price, Some(35.5));
        assert_eq!(record.shelf_life_months, Some(12));
        assert_eq!(record.received_date.as_deref(), Some("2025-08-06"));
        assert_eq!(record.usage_probability, None);
    }

    #[test]
    fn test_map_english_alias_headers() {
        let mapper = ItemFieldMapper::new();
        let record = mapper
            .map_to_raw_item(
                &row(&[
                    ("name", "Bearing B"),
                    ("qty", "4"),
                    ("unit_price", "120"),
                    ("market_price", "95"),
                ]),
                3,
            )
            .unwrap();

        assert_eq!(record.name.as_deref(), Some("Bearing B"));
        assert_eq!(record.quantity, Some(4));
        assert_eq!(record.price, Some(120.0));
        assert_eq!(record.market_price, Some(95.0));
        assert_eq!(record.row_number, 3);
    }

    #[test]
    fn test_map_type_conversion_error() {
        let mapper = ItemFieldMapper::new();
        let err = mapper
            .map_to_raw_item(&row(&[("数量", "十个")]), 5)
            .unwrap_err();

        match err {
            ImportError::TypeConversionError { row, field, .. } => {
                assert_eq!(row, 5);
                assert_eq!(field, "数量");
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
    }

    #[test]
    fn test_received_date_kept_raw() {
        // 日期不在导入期解析；畸形串原样入库，由计提引擎兜底
        let mapper = ItemFieldMapper::new();
        let record = mapper
            .map_to_raw_item(&row(&[("入库日期", "2025年8月")]), 1)
            .unwrap();
        assert_eq!(record.received_date.as_deref(), Some("2025年8月"));
    }
}
