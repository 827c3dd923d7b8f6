#![allow(clippy::must_use_candidate)]

mod envelope;
mod error;
mod identity;

pub use envelope::ApiResponse;
pub use error::HttpError;
pub use identity::RequestIdentity;
