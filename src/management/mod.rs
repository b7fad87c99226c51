mod file;
mod store;

pub use file::FileTokenStore;
pub use store::MemoryTokenStore;
pub use store::StoreKey;
pub use store::TokenStore;
