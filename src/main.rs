// ==========================================
// 存货跌价准备计算系统 - 命令行入口
// ==========================================
// 职责: 薄壳入口，参数分发到 ReserveApi
// 技术栈: Rust + SQLite
// ==========================================

use inventory_reserve::app::{get_default_db_path, AppState};
use inventory_reserve::logging;
use std::path::Path;

#[tokio::main]
async fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", inventory_reserve::APP_NAME);
    tracing::info!("系统版本: {}", inventory_reserve::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径（环境变量优先）
    let db_path =
        std::env::var("INVENTORY_RESERVE_DB").unwrap_or_else(|_| get_default_db_path());
    tracing::info!("使用数据库: {}", db_path);

    let app_state = match AppState::new(&db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "无法初始化应用状态");
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = dispatch(&app_state, &args).await {
        tracing::error!(error = %e, "命令执行失败");
        std::process::exit(1);
    }
}

/// 命令分发
async fn dispatch(state: &AppState, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let api = &state.reserve_api;

    match args.first().map(String::as_str) {
        Some("import") => {
            let file = args
                .get(1)
                .ok_or("用法: import <台账文件.xlsx|.csv>")?;
            let report = api.import_items(Path::new(file)).await?;
            println!(
                "导入完成: 批次 {} 成功 {} 行 / 失败 {} 行 (批次标记 {})",
                report.batch.batch_id,
                report.batch.success_rows,
                report.batch.failed_rows,
                report.batch.upload_timestamp.format("%Y-%m-%d %H:%M:%S"),
            );
            for err in &report.row_errors {
                println!("  行 {}: {}", err.row_number, err.message);
            }
        }
        Some("calc") => {
            let method = args.get(1).map(String::as_str);
            let outcome = api.calculate_all(method)?;
            println!(
                "计提完成: {} 行, 方法 {}, 计提日期 {}",
                outcome.items_processed, outcome.method, outcome.calculation_date
            );
        }
        Some("calc-batch") => {
            let ts = args
                .get(1)
                .ok_or("用法: calc-batch <批次标记> [方法]")?;
            let method = args.get(2).map(String::as_str);
            let outcome = api.calculate_upload_batch(ts, method)?;
            println!(
                "计提完成: {} 行, 方法 {}, 计提日期 {}",
                outcome.items_processed, outcome.method, outcome.calculation_date
            );
        }
        Some("batches") => {
            for (ts, count) in api.list_upload_batches()? {
                println!("{}  {} 行", ts.format("%Y-%m-%d %H:%M:%S"), count);
            }
        }
        Some("history") => {
            let item_id: i64 = args
                .get(1)
                .ok_or("用法: history <item_id>")?
                .parse()
                .map_err(|_| "item_id 必须是整数")?;
            for calc in api.reserve_history(item_id)? {
                println!(
                    "{}  {:>12.2}  {}",
                    calc.calculation_date,
                    calc.calculated_reserve,
                    calc.method_used
                );
            }
        }
        Some("delete-batch") => {
            let ts = args.get(1).ok_or("用法: delete-batch <批次标记>")?;
            let deleted = api.delete_upload_batch(ts)?;
            println!("已删除 {} 行台账及其计提历史", deleted);
        }
        Some("export") => {
            let path = args.get(1).ok_or("用法: export <输出文件.csv>")?;
            let rows = api.export_csv(Path::new(path))?;
            println!("已导出 {} 行到 {}", rows, path);
        }
        _ => {
            println!("用法:");
            println!("  import <台账文件.xlsx|.csv>        导入台账");
            println!("  calc [方法]                        对全部台账计提");
            println!("  calc-batch <批次标记> [方法]       对单个批次计提");
            println!("  batches                            列出导入批次");
            println!("  history <item_id>                  查看计提历史");
            println!("  delete-batch <批次标记>            删除导入批次");
            println!("  export <输出文件.csv>              导出最近计提结果");
            println!();
            println!("方法: standard | shelf_life | market | conservative");
        }
    }

    Ok(())
}
