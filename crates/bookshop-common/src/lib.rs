//! Shared pieces of the BookShop platform.
//!
//! Holds the wire-protocol constants used by both the API server and the
//! HTTP client crate, plus the logging bootstrap.

pub mod logging;

/// Request header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-API-key";

/// Request header selecting the API surface version.
pub const API_VERSION_HEADER: &str = "ApiVersion-BooksStore";

/// Role granted to store administrators.
pub const ROLE_ADMIN: &str = "admin";

/// Role granted to regular shoppers.
pub const ROLE_USER: &str = "user";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_stable() {
        // Both tiers hardcode these; changing them is a wire break.
        assert_eq!(API_KEY_HEADER, "x-API-key");
        assert_eq!(API_VERSION_HEADER, "ApiVersion-BooksStore");
    }
}
