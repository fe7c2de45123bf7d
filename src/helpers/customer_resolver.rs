use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

use crate::helpers::{
    api_client::endpoint_url,
    config::Credentials,
    data_fetcher::get_data,
    types::EmailFields,
};

// Look the customer up by email. Any failure just means "not found", the
// caller falls back to filtering by email.
pub async fn find_customer_by_email(
    client: &Client,
    api_base: &str,
    email: &str,
    credentials: &Credentials,
) -> Option<u64> {
    let url = match endpoint_url(api_base, "customers", &[("email", email), ("per_page", "1")]) {
        Ok(url) => url,
        Err(e) => {
            warn!("Could not build customer lookup URL: {:#}", e);
            return None;
        }
    };

    debug!("GET {}", url);
    let response = get_data(client, &url, credentials).await;

    if response.status != 200 {
        debug!("Customer lookup returned status {}", response.status);
        return None;
    }

    match response.body {
        Ok(Value::Array(customers)) => customers.first().and_then(customer_id),
        Ok(customer @ Value::Object(_)) => customer_id(&customer),
        Ok(_) => None,
        Err(e) => {
            debug!("Customer lookup failed: {}", e);
            None
        }
    }
}

fn customer_id(customer: &Value) -> Option<u64> {
    let id = match customer.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id != 0)
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn matches_email(record: &Value, email: &str) -> bool {
    let target = normalize(email);
    EmailFields::from_record(record)
        .candidates()
        .any(|candidate| normalize(candidate) == target)
}

pub fn filter_by_email(records: Vec<Value>, email: &str) -> Vec<Value> {
    records.into_iter().filter(|record| matches_email(record, email)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::api_client::create_client;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn creds() -> Credentials {
        Credentials::new("ck_test_key", "cs_test_secret").unwrap()
    }

    #[test]
    fn test_email_match_ignores_case_and_whitespace() {
        let record = json!({ "billing": { "email": "  A@B.com " } });
        assert!(matches_email(&record, "a@b.com"));
        assert!(matches_email(&record, " A@b.COM"));
        assert!(!matches_email(&record, "b@a.com"));
    }

    #[test]
    fn test_email_match_checks_every_alias() {
        assert!(matches_email(&json!({ "customer_email": "x@y.com" }), "X@Y.com"));
        assert!(matches_email(&json!({ "email": "x@y.com" }), "x@y.com"));
        assert!(matches_email(
            &json!({ "billing": { "email": "other@y.com" }, "customer_email": "x@y.com" }),
            "x@y.com"
        ));
        assert!(!matches_email(&json!({ "id": 1 }), "x@y.com"));
    }

    #[test]
    fn test_filter_by_email_keeps_order() {
        let records = vec![
            json!({ "id": 1, "billing": { "email": "a@b.com" } }),
            json!({ "id": 2, "billing": { "email": "someone@else.com" } }),
            json!({ "id": 3, "email": "A@B.COM" }),
        ];
        let kept = filter_by_email(records, "a@b.com");
        let ids: Vec<&Value> = kept.iter().map(|r| &r["id"]).collect();
        assert_eq!(ids, vec![&json!(1), &json!(3)]);
    }

    #[tokio::test]
    async fn test_find_customer_returns_first_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/wp-json/wc/v3/customers")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("email".into(), "jane@example.com".into()),
                Matcher::UrlEncoded("per_page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id": 42, "email": "jane@example.com"}]"#)
            .create_async()
            .await;

        let client = create_client(Duration::from_secs(5)).unwrap();
        let api_base = format!("{}/wp-json/wc/v3", server.url());
        let id = find_customer_by_email(&client, &api_base, "jane@example.com", &creds()).await;

        mock.assert_async().await;
        assert_eq!(id, Some(42));
    }

    #[tokio::test]
    async fn test_find_customer_none_when_empty_or_failing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/wp-json/wc/v3/customers")
            .match_query(Matcher::UrlEncoded("email".into(), "nobody@example.com".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        server
            .mock("GET", "/wp-json/wc/v3/customers")
            .match_query(Matcher::UrlEncoded("email".into(), "denied@example.com".into()))
            .with_status(403)
            .with_body(r#"{"code":"woocommerce_rest_cannot_view","message":"Sorry"}"#)
            .create_async()
            .await;

        let client = create_client(Duration::from_secs(5)).unwrap();
        let api_base = format!("{}/wp-json/wc/v3", server.url());

        assert_eq!(find_customer_by_email(&client, &api_base, "nobody@example.com", &creds()).await, None);
        assert_eq!(find_customer_by_email(&client, &api_base, "denied@example.com", &creds()).await, None);
    }

    #[test]
    fn test_customer_id_accepts_numeric_strings() {
        assert_eq!(customer_id(&json!({ "id": "17" })), Some(17));
        assert_eq!(customer_id(&json!({ "id": 0 })), None);
        assert_eq!(customer_id(&json!({ "name": "x" })), None);
    }
}
