pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{expand_store_path, load_records_from_file, parse_record_line};
