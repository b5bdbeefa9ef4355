pub mod data;
pub mod error;
pub mod memo;
pub mod record;

pub use data::GraphStore;
pub use error::{Result, StoreError};
pub use memo::MemoMap;
pub use record::CrawlRecord;
