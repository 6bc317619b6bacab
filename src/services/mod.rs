//! # 服务层
//!
//! 所有业务逻辑集中在服务结构体中，服务持有数据库连接引用，
//! 以 `AuthContext` 作为已解析的调用方身份。

pub mod accounts;
pub mod addresses;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod shared;
pub mod statistics;
pub mod vendors;
pub mod wishlist;

pub use accounts::AccountsService;
pub use addresses::AddressesService;
pub use cart::CartService;
pub use categories::CategoriesService;
pub use orders::OrdersService;
pub use products::ProductsService;
pub use statistics::StatisticsService;
pub use vendors::VendorsService;
pub use wishlist::WishlistService;
