pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod pdf;
pub mod scanner;
pub mod store;
pub mod sync;

pub use error::unpack_error;
