// ==========================================
// ReserveApi 端到端测试
// ==========================================
// 测试目标: 导入 → 计提 → 查询 → 导出 → 删除 全链路
// 覆盖范围: 未知方法显式报错 / 批次标记往返 / CSV 导出内容
// ==========================================


use inventory_reserve::api::error::ApiError;
use inventory_reserve::app::AppState;
use inventory_reserve::ReserveMethod;
use std::io::Write;
use tempfile::NamedTempFile;
use test_helpers::create_test_db;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[tokio::test]
async fn test_full_flow_import_calculate_export_delete() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(&db_path).unwrap();
    let api = &state.reserve_api;

    // === 导入 ===
    let csv = write_csv(&[
        "名称,数量,单价,保质期月数,入库日期,使用概率,市场单价",
        "轴承A,10,100,12,2024-08-06,0,",
        "润滑油,5,40,6,2026-07-01,100,25",
    ]);
    let report = api.import_items(csv.path()).await.unwrap();
    assert_eq!(report.batch.success_rows, 2);

    // === 按批次计提 ===
    let batch_ts = report
        .batch
        .upload_timestamp
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let outcome = api
        .calculate_upload_batch(&batch_ts, Some("standard"))
        .unwrap();
    assert_eq!(outcome.items_processed, 2);
    assert_eq!(outcome.method, ReserveMethod::Standard);

    // === 查询 ===
    let items = api.list_items().unwrap();
    assert_eq!(items.len(), 2);

    // 轴承A: 入库 24 个月前 coef=1, 概率 0 ⇒ 全额 1000
    let bearing = items
        .iter()
        .find(|i| i.name.as_deref() == Some("轴承A"))
        .unwrap();
    let (reserve, date) = api.latest_reserve(bearing.id).unwrap().unwrap();
    assert_eq!(reserve, 1000.0);
    assert_eq!(date, outcome.calculation_date);

    // 润滑油: 概率 100 ⇒ 使用侵蚀 0，市价缺口 (40-25)×5=75
    let oil = items
        .iter()
        .find(|i| i.name.as_deref() == Some("润滑油"))
        .unwrap();
    let (reserve, _) = api.latest_reserve(oil.id).unwrap().unwrap();
    assert_eq!(reserve, 75.0);

    let history = api.reserve_history(bearing.id).unwrap();
    assert_eq!(history.len(), 1);

    // === 导出 ===
    let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    let rows = api.export_csv(out.path()).unwrap();
    assert_eq!(rows, 2);
    let content = std::fs::read_to_string(out.path()).unwrap();
    assert!(content.contains("计提额"));
    assert!(content.contains("1000.00"));
    assert!(content.contains("standard"));

    // === 删除批次 ===
    let deleted = api.delete_upload_batch(&batch_ts).unwrap();
    assert_eq!(deleted, 2);
    assert!(api.list_items().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_method_fails_loudly() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(&db_path).unwrap();
    let api = &state.reserve_api;

    let csv = write_csv(&["名称,数量,单价,保质期月数,入库日期", "物料A,1,10,6,2026-01-01"]);
    api.import_items(csv.path()).await.unwrap();

    // 未知方法在边界报错，不进入计提引擎、不产生计提记录
    let err = api.calculate_all(Some("aggressive")).unwrap_err();
    match err {
        ApiError::UnknownMethod(raw) => assert_eq!(raw, "aggressive"),
        other => panic!("意外的错误类型: {:?}", other),
    }

    let items = api.list_items().unwrap();
    assert!(api.reserve_history(items[0].id).unwrap().is_empty());
}

#[tokio::test]
async fn test_default_method_used_when_unspecified() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(&db_path).unwrap();
    let api = &state.reserve_api;

    let csv = write_csv(&["名称,数量,单价,保质期月数,入库日期", "物料A,1,10,6,2026-01-01"]);
    api.import_items(csv.path()).await.unwrap();

    // 未显式指定 ⇒ 配置默认 standard
    let outcome = api.calculate_all(None).unwrap();
    assert_eq!(outcome.method, ReserveMethod::Standard);

    // 改默认方法后生效
    api.set_default_method("market").unwrap();
    let outcome = api.calculate_all(None).unwrap();
    assert_eq!(outcome.method, ReserveMethod::Market);
}

#[tokio::test]
async fn test_invalid_batch_timestamp_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(&db_path).unwrap();
    let api = &state.reserve_api;

    let err = api
        .calculate_upload_batch("2026/08/01", Some("standard"))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_history_for_missing_item_not_found() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(&db_path).unwrap();
    let api = &state.reserve_api;

    assert!(matches!(
        api.reserve_history(42).unwrap_err(),
        ApiError::NotFound(_)
    ));
}
