pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_addresses_table;
mod m20250101_000003_create_vendors_table;
mod m20250101_000004_create_categories_table;
mod m20250101_000005_create_products_table;
mod m20250101_000006_create_product_images_table;
mod m20250101_000007_create_carts_table;
mod m20250101_000008_create_cart_items_table;
mod m20250101_000009_create_orders_table;
mod m20250101_000010_create_order_items_table;
mod m20250101_000011_create_wishlist_items_table;
mod m20250101_000012_create_revoked_tokens_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_addresses_table::Migration),
            Box::new(m20250101_000003_create_vendors_table::Migration),
            Box::new(m20250101_000004_create_categories_table::Migration),
            Box::new(m20250101_000005_create_products_table::Migration),
            Box::new(m20250101_000006_create_product_images_table::Migration),
            Box::new(m20250101_000007_create_carts_table::Migration),
            Box::new(m20250101_000008_create_cart_items_table::Migration),
            Box::new(m20250101_000009_create_orders_table::Migration),
            Box::new(m20250101_000010_create_order_items_table::Migration),
            Box::new(m20250101_000011_create_wishlist_items_table::Migration),
            Box::new(m20250101_000012_create_revoked_tokens_table::Migration),
        ]
    }
}
