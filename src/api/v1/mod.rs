mod error;
mod gate;
mod handler;
mod router;

pub use error::{ApiErrorCode, recover_error};
pub use gate::{bearer_token, with_principal};
pub use router::{api, routes};
