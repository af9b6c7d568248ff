mod error;
mod http_mapping;
mod policy;
mod traits;

pub use error::{FetchError, LookupError, Result};
pub use http_mapping::lookup_error_to_status_code;
pub use policy::CachePolicy;
pub use traits::ReadingFetcher;
