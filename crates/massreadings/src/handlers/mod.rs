pub mod error;
pub mod health;
pub mod mass;
pub mod root;

pub use error::AppError;
