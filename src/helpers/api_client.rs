// Use reqwest to make HTTP requests
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use std::time::Duration;

// One client for the whole run, every request shares the same timeout.
pub fn create_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

// Join `path` onto the API base and append the query pairs, encoding values.
pub fn endpoint_url(api_base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let raw = format!("{}/{}", api_base.trim_end_matches('/'), path.trim_start_matches('/'));
    let mut url = Url::parse(&raw).with_context(|| format!("Invalid endpoint URL {}", raw))?;

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}

// `{api_base}/{collection}/{id}/{child}` with `id` as a single encoded segment.
pub fn resource_url(api_base: &str, collection: &str, id: &str, child: &str) -> Result<Url> {
    let mut url = endpoint_url(api_base, collection, &[])?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("{} cannot take path segments", api_base))?
        .push(id)
        .push(child);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_without_query() {
        let url = endpoint_url("https://shop.example/wp-json/wc/v3", "subscriptions/12/orders", &[]).unwrap();
        assert_eq!(url.as_str(), "https://shop.example/wp-json/wc/v3/subscriptions/12/orders");
    }

    #[test]
    fn test_endpoint_url_encodes_email() {
        let url = endpoint_url(
            "https://shop.example/wp-json/wc/v3/",
            "/customers",
            &[("email", "jane+shop@example.com"), ("per_page", "1")],
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://shop.example/wp-json/wc/v3/customers?email=jane%2Bshop%40example.com&per_page=1"
        );
    }

    #[test]
    fn test_resource_url_encodes_id_segment() {
        let url = resource_url("https://shop.example/wp-json/wc/v3", "subscriptions", "812", "orders").unwrap();
        assert_eq!(url.as_str(), "https://shop.example/wp-json/wc/v3/subscriptions/812/orders");

        let url = resource_url("https://shop.example/wp-json/wc/v3", "subscriptions", "../a/b?c#d", "orders").unwrap();
        assert_eq!(
            url.as_str(),
            "https://shop.example/wp-json/wc/v3/subscriptions/..%2Fa%2Fb%3Fc%23d/orders"
        );
        assert_eq!(url.query(), None);
    }
}
