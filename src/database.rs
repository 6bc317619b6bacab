//! # 数据库模块
//!
//! 连接初始化与迁移管理，连接参数来自 `DatabaseConfig`

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// 按配置建立数据库连接
///
/// SQLite 文件库会先确保目录存在；sqlx 的逐条查询日志默认关闭。
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let url = config
        .get_connection_url()
        .map_err(|e| DbErr::Custom(e.to_string()))?;

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(memory = config.is_memory_database(), "数据库连接成功");
    Ok(db)
}

/// 应用全部未执行的迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    ::migration::Migrator::up(db, None).await?;
    info!("数据库迁移完成");
    Ok(())
}

/// 报告未应用的迁移数量
pub async fn check_database_status(db: &DatabaseConnection) -> Result<(), DbErr> {
    let pending = ::migration::Migrator::get_pending_migrations(db).await?;
    if pending.is_empty() {
        info!("所有迁移都已应用");
    } else {
        warn!(pending = pending.len(), "存在待应用的迁移");
    }
    Ok(())
}
