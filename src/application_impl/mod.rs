mod argon2_hasher;
mod auth_service_impl;
mod jwt_codec;
mod session_registry_impl;
mod token_lifecycle_impl;

#[cfg(test)]
mod tests;

pub use argon2_hasher::*;
pub use auth_service_impl::*;
pub use jwt_codec::*;
pub use session_registry_impl::*;
pub use token_lifecycle_impl::*;
