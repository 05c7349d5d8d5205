//! HTTP seam between the importers and the network.
//!
//! Every request an import makes goes through the [`HttpClient`] trait so the
//! whole pipeline can run against [`MockClient`] in tests.

mod client;
mod mock;

pub use client::{
    HttpClient, HttpRequest, HttpResponse, RequestBody, ReqwestClient, ReqwestClientBuilder,
};
pub use mock::{MockClient, MockResponse};

/// Join a base URL and a path without doubling or dropping the slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) if !path.is_empty() => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/api", "/recipes"), "http://a/api/recipes");
        assert_eq!(join_url("http://a/api/", "/recipes"), "http://a/api/recipes");
        assert_eq!(join_url("http://a/api", "recipes"), "http://a/api/recipes");
        assert_eq!(join_url("http://a/api/", "recipes"), "http://a/api/recipes");
        assert_eq!(join_url("http://a/api", ""), "http://a/api");
    }
}
