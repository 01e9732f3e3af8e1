use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

#[allow(clippy::module_inception)]
mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

/// A typed API call: knows its route, method, body and response shape
pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}

/// Append `segments` to the path of `base`, percent-encoding each one.
///
/// Entry paths are split on `/` so every segment is encoded on its own and
/// the separators survive.
pub fn api_url<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// URL of an entry-addressed v0 route such as `entries` or `sync`
pub fn entry_url(base: &Url, route: &str, ident: &str) -> Url {
    let segments = ["api", "v0", route]
        .into_iter()
        .chain(ident.trim_matches('/').split('/'));
    api_url(base, segments)
}
