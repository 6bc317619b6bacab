//! # 市场后端主程序
//!
//! 迁移、演示数据与运维命令入口。业务逻辑全部在服务层，
//! 这里只做配置装载、连接初始化与命令分发。

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use entity::{products, products::Entity as Products, vendors, vendors::Entity as Vendors};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};

use market_api::{
    AppConfig, MarketError, Result,
    error::Context,
    types::VendorStatus,
};

#[derive(Parser)]
#[command(name = "market-api", version, about = "Multi-vendor marketplace backend")]
struct Cli {
    /// 配置文件路径（TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// 日志级别，覆盖 RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 执行数据库迁移
    Migrate,
    /// 写入演示数据（空库时）
    Seed,
    /// 审核通过全部待审商户
    ApproveVendors,
    /// 将销量最高的商品标记为精选
    MarkFeatured {
        /// 精选数量
        #[arg(long, default_value_t = 8)]
        count: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    market_api::logging::init_logging(cli.log_level.as_ref());

    let config = AppConfig::load(cli.config.as_deref())?;
    let db = market_api::database::init_database(&config.database)
        .await
        .map_err(|e| MarketError::Database {
            message: "数据库初始化失败".to_string(),
            source: Some(e.into()),
        })?;

    market_api::database::run_migrations(&db)
        .await
        .map_err(|e| MarketError::Database {
            message: "数据库迁移失败".to_string(),
            source: Some(e.into()),
        })?;

    match cli.command {
        None | Some(Command::Migrate) => {
            market_api::database::check_database_status(&db)
                .await
                .map_err(|e| MarketError::Database {
                    message: "数据库状态检查失败".to_string(),
                    source: Some(e.into()),
                })?;
        }
        Some(Command::Seed) => {
            market_api::seed::seed_demo_data(&db).await?;
        }
        Some(Command::ApproveVendors) => {
            approve_pending_vendors(&db).await?;
        }
        Some(Command::MarkFeatured { count }) => {
            mark_featured_products(&db, count).await?;
        }
    }

    Ok(())
}

/// 批量通过待审商户
async fn approve_pending_vendors(db: &DatabaseConnection) -> Result<()> {
    let result = Vendors::update_many()
        .col_expr(
            vendors::Column::Status,
            Expr::value(VendorStatus::Approved.as_str()),
        )
        .filter(vendors::Column::Status.eq(VendorStatus::Pending.as_str()))
        .exec(db)
        .await
        .context("Failed to approve vendors")?;

    tracing::info!(approved = result.rows_affected, "待审商户已全部通过");
    Ok(())
}

/// 按销量重置精选商品集合
async fn mark_featured_products(db: &DatabaseConnection, count: u64) -> Result<()> {
    let top_ids: Vec<i32> = Products::find()
        .select_only()
        .column(products::Column::Id)
        .filter(products::Column::IsActive.eq(true))
        .order_by_desc(products::Column::SalesCount)
        .limit(count)
        .into_tuple()
        .all(db)
        .await
        .context("Failed to fetch top products")?;

    Products::update_many()
        .col_expr(products::Column::IsFeatured, Expr::value(false))
        .exec(db)
        .await
        .context("Failed to clear featured flags")?;

    if !top_ids.is_empty() {
        Products::update_many()
            .col_expr(products::Column::IsFeatured, Expr::value(true))
            .filter(products::Column::Id.is_in(top_ids.clone()))
            .exec(db)
            .await
            .context("Failed to mark featured products")?;
    }

    tracing::info!(featured = top_ids.len(), "精选商品已更新");
    Ok(())
}
