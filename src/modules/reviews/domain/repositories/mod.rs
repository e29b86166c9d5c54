pub mod product_store;

pub use product_store::ProductStore;
#[cfg(test)]
pub use product_store::MockProductStore;
