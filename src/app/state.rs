// ==========================================
// 存货跌价准备计算系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use crate::api::ReserveApi;
use crate::config::ConfigManager;
use crate::db;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::item_importer::ItemImporterImpl;
use crate::repository::item_import_repo_impl::ItemImportRepositoryImpl;
use crate::repository::item_repo::InventoryItemRepository;
use crate::repository::reserve_repo::ReserveCalculationRepository;

/// 应用状态
///
/// 持有共享连接与业务接口实例
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 计提业务接口
    pub reserve_api: Arc<ReserveApi>,
}

impl AppState {
    /// 创建应用状态
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 流程
    /// 打开连接（统一 PRAGMA）→ 初始化 schema → 装配仓储与接口
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = db::open_sqlite_connection(db_path)?;
        db::initialize_schema(&conn)?;

        let conn = Arc::new(Mutex::new(conn));

        let item_repo = Arc::new(InventoryItemRepository::from_connection(conn.clone()));
        let reserve_repo = Arc::new(ReserveCalculationRepository::from_connection(conn.clone()));
        let import_repo = ItemImportRepositoryImpl::from_connection(conn.clone());
        let importer = ItemImporterImpl::new(import_repo, Box::new(UniversalFileParser));
        let config = ConfigManager::from_connection(conn.clone());

        let reserve_api = Arc::new(ReserveApi::new(item_repo, reserve_repo, importer, config));

        Ok(Self {
            db_path: db_path.to_string(),
            reserve_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先用户数据目录，目录不可用时回退当前目录
pub fn get_default_db_path() -> String {
    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("inventory-reserve");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            return app_dir
                .join("inventory_reserve.db")
                .to_string_lossy()
                .to_string();
        }
    }
    "inventory_reserve.db".to_string()
}
