// Token issuance, password hashing and the request extractor for private routes.

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::AuthUser;
