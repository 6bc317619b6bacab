use sea_orm_migration::prelude::*;
use std::env;

#[tokio::main]
async fn main() {
    // 未显式指定数据库时使用本地开发库
    if env::var("DATABASE_URL").is_err() {
        let in_member_dir = env::current_dir()
            .map(|dir| dir.ends_with("migration"))
            .unwrap_or(false);
        let db_path = if in_member_dir {
            "../data/market.db"
        } else {
            "data/market.db"
        };
        unsafe {
            env::set_var("DATABASE_URL", format!("sqlite://{db_path}"));
        }
    }
    cli::run_cli(migration::Migrator).await;
}
