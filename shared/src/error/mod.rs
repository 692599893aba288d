//! Error codes and the `AppError` response type
//!
//! | Range | Category   |
//! |-------|------------|
//! | 0xxx  | General    |
//! | 1xxx  | Auth       |
//! | 2xxx  | Permission |
//! | 3xxx  | Resource   |
//! | 9xxx  | System     |
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::validation("row 3: missing required fields: sku")
//!     .with_detail("row", 3);
//! let body = ApiResponse::from(&err);
//! assert_eq!(body.code, ErrorCode::ValidationFailed);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
