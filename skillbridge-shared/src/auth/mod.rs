/// Identity gate for skillbridge
///
/// The rest of the system never sees credentials; it consumes a resolved
/// [`Principal`] (user ID + role) per request.
///
/// - [`jwt`]: HS256 access/refresh tokens carrying the identity
/// - [`password`]: Argon2id hashing and strength validation
/// - [`middleware`]: the `Principal` request extension and role gate
///
/// [`Principal`]: middleware::Principal

pub mod jwt;
pub mod middleware;
pub mod password;

pub use middleware::{Principal, RoleError};
