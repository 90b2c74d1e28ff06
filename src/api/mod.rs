pub mod handlers;
pub mod requests;
pub mod validation;

pub use handlers::{ApiResponse, Controller};
pub use validation::ValidationErrors;
