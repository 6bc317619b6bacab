//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod users;
pub mod addresses;
pub mod vendors;
pub mod categories;
pub mod products;
pub mod product_images;
pub mod carts;
pub mod cart_items;
pub mod orders;
pub mod order_items;
pub mod revoked_tokens;
pub mod wishlist_items;

pub use users::Entity as Users;
pub use addresses::Entity as Addresses;
pub use vendors::Entity as Vendors;
pub use categories::Entity as Categories;
pub use products::Entity as Products;
pub use product_images::Entity as ProductImages;
pub use carts::Entity as Carts;
pub use cart_items::Entity as CartItems;
pub use orders::Entity as Orders;
pub use order_items::Entity as OrderItems;
pub use revoked_tokens::Entity as RevokedTokens;
pub use wishlist_items::Entity as WishlistItems;
