use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::helpers::errors::FetchError;

// One GET, as seen by the caller. Transport failures carry status 0.
#[derive(Debug)]
pub struct ApiResponse {
    pub body: Result<Value, FetchError>,
    pub elapsed: Duration,
    pub status: u16,
}

// Items accumulated over every page of one endpoint.
#[derive(Debug, Default)]
pub struct Paginated {
    pub items: Vec<Value>,
    pub elapsed: Duration,
    // Status of the last page requested.
    pub status: u16,
    pub pages: u32,
    pub truncated: bool,
    pub error: Option<FetchError>,
}

impl Paginated {
    pub fn is_success(&self) -> bool {
        self.status == 200 && self.error.is_none()
    }
}

// Email aliases a subscription or order may carry. Anything that is not a
// string is read as absent.
#[derive(Debug, Default, Deserialize)]
pub struct EmailFields {
    #[serde(default, deserialize_with = "lenient_billing")]
    pub billing: Option<BillingFields>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BillingFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

impl EmailFields {
    pub fn from_record(record: &Value) -> Self {
        Self::deserialize(record).unwrap_or_default()
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.billing
            .as_ref()
            .and_then(|b| b.email.as_deref())
            .into_iter()
            .chain(self.customer_email.as_deref())
            .chain(self.email.as_deref())
    }
}

fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(value.as_str().map(str::to_string))
}

fn lenient_billing<'de, D>(d: D) -> Result<Option<BillingFields>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(BillingFields::deserialize(&value).ok())
}

// Per-endpoint timing record that lands in `test_summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointResult {
    pub time_seconds: f64,
    pub time_ms: f64,
    pub status_code: u16,
    pub pages: u32,
    // Set when the page ceiling cut the fetch short.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointResult {
    pub fn from_fetch(fetch: &Paginated, count: usize) -> Self {
        let seconds = fetch.elapsed.as_secs_f64();
        let (count, error) = match &fetch.error {
            None => (Some(count), None),
            // Later page failed, keep what we got alongside the error.
            Some(e) if count > 0 => (Some(count), Some(e.to_string())),
            Some(e) => (None, Some(e.to_string())),
        };

        Self {
            time_seconds: seconds,
            time_ms: seconds * 1000.0,
            status_code: fetch.status,
            pages: fetch.pages,
            truncated: fetch.truncated,
            count,
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOrdersResult {
    pub subscription_id: Value,
    #[serde(flatten)]
    pub result: EndpointResult,
}

#[derive(Debug, Default, Serialize)]
pub struct Results {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<EndpointResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<EndpointResult>,
    pub subscription_orders: Vec<SubscriptionOrdersResult>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub test_timestamp: String,
    #[serde(rename = "woocommerce_store_url")]
    pub store_url: String,
    #[serde(rename = "woocommerce_api_base")]
    pub api_base: String,
    pub email: String,
    pub customer_id: Option<u64>,
    pub results: Results,
    pub total_time_seconds: f64,
    pub total_time_ms: f64,
}
