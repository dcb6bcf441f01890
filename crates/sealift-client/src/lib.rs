//! Client-side multipart upload orchestration: chunk a file, fetch a signed
//! URL per part, upload parts in bounded batches with per-part retries, and
//! finalize only a verified, contiguous part set.

pub mod chunk;
pub mod complete;
pub mod config;
pub mod gateway;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testutil;

pub use chunk::{Chunk, plan_chunks};
pub use config::UploadConfig;
pub use gateway::{HttpSignerGateway, SignerGateway};
pub use progress::ProgressFn;
pub use session::{AbortHandle, UploadedObject, Uploader};
pub use uploader::{HttpPartUploader, PartUploader};
