// ==========================================
// 台账导入集成测试
// ==========================================
// 测试目标: 文件 → 解析 → 映射 → 落库全链路
// 覆盖范围: 成功导入 / 行级错误跳过 / 批次标记一致 / 批次审计
// ==========================================


use inventory_reserve::importer::error::ImportError;
use inventory_reserve::importer::file_parser::UniversalFileParser;
use inventory_reserve::importer::item_importer::{ItemImporter, ItemImporterImpl};
use inventory_reserve::repository::item_import_repo_impl::ItemImportRepositoryImpl;
use inventory_reserve::repository::item_repo::InventoryItemRepository;
use rusqlite::params;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use test_helpers::{create_test_db, open_test_connection};

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[tokio::test]
async fn test_import_csv_success() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let csv = write_csv(&[
        "名称,类别,数量,单价,保质期月数,入库日期,使用概率,市场单价",
        "轴承A,备件,10,35.5,12,2025-08-06,80,30",
        "润滑油,耗材,4,120,6,2025-06-01,,110",
    ]);

    let importer = ItemImporterImpl::new(
        ItemImportRepositoryImpl::from_connection(conn.clone()),
        Box::new(UniversalFileParser),
    );
    let report = importer.import_file(csv.path()).await.unwrap();

    assert_eq!(report.batch.total_rows, 2);
    assert_eq!(report.batch.success_rows, 2);
    assert_eq!(report.batch.failed_rows, 0);
    assert!(report.row_errors.is_empty());

    // 落库内容与批次标记
    let item_repo = InventoryItemRepository::from_connection(conn.clone());
    let items = item_repo.fetch_all().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name.as_deref(), Some("轴承A"));
    assert_eq!(items[0].quantity, Some(10));
    assert_eq!(items[0].price, Some(35.5));
    assert_eq!(items[0].usage_probability, Some(80.0));
    assert_eq!(items[1].usage_probability, None);

    // 同一次导入的所有行共享同一批次标记
    assert_eq!(items[0].upload_timestamp, items[1].upload_timestamp);
    assert_eq!(items[0].upload_timestamp, report.batch.upload_timestamp);
    assert_eq!(items[0].upload_timestamp.timestamp_subsec_nanos(), 0);

    // 批次过滤取回同一集合
    let batch_items = item_repo
        .fetch_by_upload_timestamp(report.batch.upload_timestamp)
        .unwrap();
    assert_eq!(batch_items.len(), 2);
}

#[tokio::test]
async fn test_import_skips_bad_rows_and_reports() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let csv = write_csv(&[
        "名称,数量,单价",
        "物料A,10,100",
        "物料B,十个,100", // 数量无法转换
        "物料C,3,12.5",
    ]);

    let importer = ItemImporterImpl::new(
        ItemImportRepositoryImpl::from_connection(conn.clone()),
        Box::new(UniversalFileParser),
    );
    let report = importer.import_file(csv.path()).await.unwrap();

    assert_eq!(report.batch.total_rows, 3);
    assert_eq!(report.batch.success_rows, 2);
    assert_eq!(report.batch.failed_rows, 1);
    assert_eq!(report.row_errors.len(), 1);
    assert_eq!(report.row_errors[0].row_number, 2);
    assert_eq!(report.row_errors[0].field, "数量");

    let item_repo = InventoryItemRepository::from_connection(conn.clone());
    let items = item_repo.fetch_all().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name.as_deref(), Some("物料A"));
    assert_eq!(items[1].name.as_deref(), Some("物料C"));

    // 行级错误明细随批次审计落库
    let conn = conn.lock().unwrap();
    let errors_json: Option<String> = conn
        .query_row(
            "SELECT row_errors_json FROM import_batch WHERE batch_id = ?1",
            params![report.batch.batch_id],
            |row| row.get(0),
        )
        .unwrap();
    assert!(errors_json.unwrap().contains("数量"));
}

#[tokio::test]
async fn test_import_writes_batch_audit_row() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let csv = write_csv(&["名称,数量,单价", "物料A,1,10"]);

    let importer = ItemImporterImpl::new(
        ItemImportRepositoryImpl::from_connection(conn.clone()),
        Box::new(UniversalFileParser),
    );
    let report = importer.import_file(csv.path()).await.unwrap();

    let conn = conn.lock().unwrap();
    let (total, success, failed): (i64, i64, i64) = conn
        .query_row(
            "SELECT total_rows, success_rows, failed_rows FROM import_batch WHERE batch_id = ?1",
            params![report.batch.batch_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(success, 1);
    assert_eq!(failed, 0);
}

#[tokio::test]
async fn test_import_received_date_kept_raw() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    // 畸形日期照常入库，由计提引擎在计算时兜底
    let csv = write_csv(&["名称,数量,单价,入库日期", "物料A,1,10,2025年8月"]);

    let importer = ItemImporterImpl::new(
        ItemImportRepositoryImpl::from_connection(conn.clone()),
        Box::new(UniversalFileParser),
    );
    importer.import_file(csv.path()).await.unwrap();

    let item_repo = InventoryItemRepository::from_connection(conn);
    let items = item_repo.fetch_all().unwrap();
    assert_eq!(items[0].received_date.as_deref(), Some("2025年8月"));
}

#[tokio::test]
async fn test_import_unsupported_extension() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let importer = ItemImporterImpl::new(
        ItemImportRepositoryImpl::from_connection(conn),
        Box::new(UniversalFileParser),
    );
    let result = importer.import_file(Path::new("台账.pdf")).await;
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
}
