//! CLI command implementations

pub mod config;
pub mod count;
pub mod mode;
pub mod records;

pub use config::execute as config;
pub use count::execute as count;
pub use mode::execute as mode;
pub use records::execute as records;
