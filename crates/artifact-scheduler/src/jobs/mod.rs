//! Jobs registered with the scheduler.
//!
//! - **scan**: periodic repository scans pushed onto the indexing queue

pub mod scan;

pub use scan::{enqueue_repository_scan, register_repository_scan, ScanJobConfig};
