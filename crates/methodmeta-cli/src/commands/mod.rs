pub mod aggregate;
pub mod error_kinds;
