pub mod memory_product_store;
pub mod models;
pub mod pg_product_store;

pub use memory_product_store::InMemoryProductStore;
pub use pg_product_store::PgProductStore;
