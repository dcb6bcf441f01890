pub mod config;
pub mod s3;
pub mod sign;
pub mod traits;
pub mod types;

pub use config::StoreConfig;
pub use s3::S3Store;
pub use traits::ObjectStore;
