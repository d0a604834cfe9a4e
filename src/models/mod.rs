pub mod error;
pub mod function_url;

pub use error::AdapterError;
pub use function_url::*;
