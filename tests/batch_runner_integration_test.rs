// ==========================================
// ReserveBatchRunner 引擎集成测试
// ==========================================
// 测试目标: 批量计提的取数/落库/回滚语义
// 覆盖范围: N 行进 N 行出 / 批次过滤 / 上次计提口径 / 整批回滚
// ==========================================


use chrono::Local;
use inventory_reserve::engine::batch_runner::{BatchScope, ReserveBatchRunner};
use inventory_reserve::engine::error::EngineError;
use inventory_reserve::repository::item_repo::{parse_upload_timestamp, InventoryItemRepository};
use inventory_reserve::repository::reserve_repo::ReserveCalculationRepository;
use inventory_reserve::ReserveMethod;
use std::sync::Arc;
use test_helpers::{create_test_db, insert_test_item, open_test_connection, ItemFixture};

fn setup_runner(
    db_path: &str,
) -> (
    Arc<InventoryItemRepository>,
    Arc<ReserveCalculationRepository>,
    ReserveBatchRunner,
) {
    let conn = open_test_connection(db_path).unwrap();
    let item_repo = Arc::new(InventoryItemRepository::from_connection(conn.clone()));
    let reserve_repo = Arc::new(ReserveCalculationRepository::from_connection(conn));
    let runner = ReserveBatchRunner::new(item_repo.clone(), reserve_repo.clone());
    (item_repo, reserve_repo, runner)
}

// ==========================================
// 测试用例 1: N 行台账产生恰好 N 条计提记录
// ==========================================

#[test]
fn test_run_all_inserts_one_row_per_item() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let mut item_ids = Vec::new();
    {
        let conn = conn.lock().unwrap();
        for i in 0..5 {
            let fixture = ItemFixture {
                name: Some(format!("物料{}", i)),
                quantity: Some(10 + i),
                ..ItemFixture::default()
            };
            item_ids.push(insert_test_item(&conn, &fixture));
        }
    }

    let (_item_repo, reserve_repo, runner) = setup_runner(&db_path);
    let outcome = runner
        .run(BatchScope::All, ReserveMethod::Standard)
        .unwrap();

    assert_eq!(outcome.items_processed, 5);
    assert_eq!(outcome.method, ReserveMethod::Standard);
    assert_eq!(outcome.calculation_date, Local::now().date_naive());

    // 每个 item 恰好一条记录，计提日期与方法一致
    for item_id in item_ids {
        let history = reserve_repo.fetch_history_for_item(item_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].method_used, ReserveMethod::Standard);
        assert_eq!(history[0].calculation_date, outcome.calculation_date);
    }

    drop(temp_file);
}

// ==========================================
// 测试用例 2: 批次范围只触达目标批次
// ==========================================

#[test]
fn test_run_upload_batch_scope_filters_items() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let (first_batch_id, second_batch_id) = {
        let conn = conn.lock().unwrap();
        let first = insert_test_item(
            &conn,
            &ItemFixture {
                upload_timestamp: "2026-08-01 09:00:00".to_string(),
                ..ItemFixture::default()
            },
        );
        let second = insert_test_item(
            &conn,
            &ItemFixture {
                upload_timestamp: "2026-08-02 10:30:00".to_string(),
                ..ItemFixture::default()
            },
        );
        (first, second)
    };

    let (_item_repo, reserve_repo, runner) = setup_runner(&db_path);
    let ts = parse_upload_timestamp("2026-08-01 09:00:00").unwrap();
    let outcome = runner
        .run(BatchScope::Upload(ts), ReserveMethod::ShelfLife)
        .unwrap();

    assert_eq!(outcome.items_processed, 1);
    assert_eq!(reserve_repo.count_for_item(first_batch_id).unwrap(), 1);
    assert_eq!(reserve_repo.count_for_item(second_batch_id).unwrap(), 0);
}

// ==========================================
// 测试用例 3: 上次计提口径（无历史按 0，重算取最近）
// ==========================================

#[test]
fn test_repeated_runs_append_history() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let item_id = {
        let conn = conn.lock().unwrap();
        insert_test_item(
            &conn,
            &ItemFixture {
                usage_probability: Some(0.0), // 全额计提
                ..ItemFixture::default()
            },
        )
    };

    let (_item_repo, reserve_repo, runner) = setup_runner(&db_path);

    runner.run(BatchScope::All, ReserveMethod::Standard).unwrap();
    runner.run(BatchScope::All, ReserveMethod::Market).unwrap();
    runner
        .run(BatchScope::All, ReserveMethod::Conservative)
        .unwrap();

    // 历史仅追加，不覆盖
    let history = reserve_repo.fetch_history_for_item(item_id).unwrap();
    assert_eq!(history.len(), 3);

    // 最近一次为 conservative（同日多条，id 断序）
    let (latest_reserve, latest_date) =
        reserve_repo.fetch_latest_for_item(item_id).unwrap().unwrap();
    assert_eq!(history[0].method_used, ReserveMethod::Conservative);
    assert_eq!(latest_reserve, history[0].calculated_reserve);
    assert_eq!(latest_date, Local::now().date_naive());
}

// ==========================================
// 测试用例 4: 任一行校验失败 ⇒ 整批回滚
// ==========================================

#[test]
fn test_validation_failure_aborts_whole_batch() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let item_ids = {
        let conn = conn.lock().unwrap();
        let good_first = insert_test_item(&conn, &ItemFixture::default());
        let bad = insert_test_item(
            &conn,
            &ItemFixture {
                quantity: Some(-3),
                ..ItemFixture::default()
            },
        );
        let good_last = insert_test_item(&conn, &ItemFixture::default());
        vec![good_first, bad, good_last]
    };

    let (_item_repo, reserve_repo, runner) = setup_runner(&db_path);
    let err = runner
        .run(BatchScope::All, ReserveMethod::Standard)
        .unwrap_err();

    // 聚合错误点名方法
    match err {
        EngineError::BatchAborted { method, .. } => {
            assert_eq!(method, ReserveMethod::Standard);
        }
        other => panic!("意外的错误类型: {:?}", other),
    }

    // 无任何行落库（包括坏行之前的好行）
    for item_id in item_ids {
        assert_eq!(reserve_repo.count_for_item(item_id).unwrap(), 0);
    }
}

// ==========================================
// 测试用例 5: 必填字段缺失同样整批中止
// ==========================================

#[test]
fn test_missing_field_aborts_whole_batch() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();

    let item_ids = {
        let conn = conn.lock().unwrap();
        let good = insert_test_item(&conn, &ItemFixture::default());
        let missing_date = insert_test_item(
            &conn,
            &ItemFixture {
                received_date: None,
                ..ItemFixture::default()
            },
        );
        vec![good, missing_date]
    };

    let (_item_repo, reserve_repo, runner) = setup_runner(&db_path);
    assert!(runner.run(BatchScope::All, ReserveMethod::Market).is_err());

    for item_id in item_ids {
        assert_eq!(reserve_repo.count_for_item(item_id).unwrap(), 0);
    }
}

// ==========================================
// 测试用例 6: 空目标集正常完成
// ==========================================

#[test]
fn test_empty_target_set_is_noop() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (_item_repo, _reserve_repo, runner) = setup_runner(&db_path);

    let outcome = runner
        .run(BatchScope::All, ReserveMethod::Standard)
        .unwrap();
    assert_eq!(outcome.items_processed, 0);
}
