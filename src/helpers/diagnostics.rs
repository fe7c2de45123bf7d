use chrono::Local;
use log::error;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Instant;

use crate::helpers::{
    api_client::{endpoint_url, resource_url},
    config::Settings,
    customer_resolver::{filter_by_email, find_customer_by_email},
    data_fetcher::fetch_all_paginated,
    report_writer::{
        ORDERS_FILE, SUBSCRIPTIONS_FILE, SUMMARY_FILE, display_id, format_count, format_time,
        print_summary, rule, save_json_file, subscription_orders_file,
    },
    types::{EndpointResult, Paginated, Results, SubscriptionOrdersResult, Summary},
};

/*
    Customer lookup, then subscriptions, orders and the orders of every
    subscription, one request at a time. Every stage records its own failure
    and the run carries on, so a summary is always produced.
*/
pub async fn run(client: &Client, settings: &Settings) -> Summary {
    let started = Instant::now();
    let mut results = Results::default();

    println!("🔍 Looking up customer by email...");
    let customer_id =
        find_customer_by_email(client, &settings.api_base, &settings.email, &settings.credentials).await;
    match customer_id {
        Some(id) => println!("✓ Found customer ID: {}", id),
        None => println!("⚠️  Customer not found by email. Will filter subscriptions/orders by email."),
    }
    println!();

    println!("📋 Test 1: Fetching Subscriptions");
    println!("{}", rule('-'));
    let (subscriptions, subscriptions_ok) =
        fetch_customer_collection(client, settings, "subscriptions", customer_id).await;
    if let Some((fetch, items)) = &subscriptions {
        results.subscriptions = Some(EndpointResult::from_fetch(fetch, items.len()));
        write_collection(settings, SUBSCRIPTIONS_FILE, "subscriptions", customer_id, fetch, items);
    }
    println!();

    println!("📦 Test 2: Fetching All Orders");
    println!("{}", rule('-'));
    let (orders, _) = fetch_customer_collection(client, settings, "orders", customer_id).await;
    if let Some((fetch, items)) = &orders {
        results.orders = Some(EndpointResult::from_fetch(fetch, items.len()));
        write_collection(settings, ORDERS_FILE, "orders", customer_id, fetch, items);
    }
    println!();

    println!("🔗 Test 3: Fetching Orders for Each Subscription");
    println!("{}", rule('-'));
    match subscriptions {
        Some((_, items)) if subscriptions_ok => {
            if items.is_empty() {
                println!("No subscriptions found, skipping subscription orders test.");
            }
            for (idx, subscription) in items.iter().enumerate() {
                let Some(subscription_id) = subscription_id(subscription) else {
                    continue;
                };
                if let Some(record) = fetch_subscription_orders(client, settings, idx + 1, subscription_id).await {
                    results.subscription_orders.push(record);
                }
            }
        }
        _ => println!("Cannot fetch subscription orders - subscriptions endpoint failed."),
    }
    println!();

    let total = started.elapsed().as_secs_f64();
    let summary = Summary {
        test_timestamp: Local::now().to_rfc3339(),
        store_url: settings.store_url.clone(),
        api_base: settings.api_base.clone(),
        email: settings.email.clone(),
        customer_id,
        results,
        total_time_seconds: total,
        total_time_ms: total * 1000.0,
    };

    print_summary(&summary);
    persist(settings, SUMMARY_FILE, &summary);
    summary
}

// `None` only when the endpoint URL itself could not be built. The bool says
// whether the fetch fully succeeded.
async fn fetch_customer_collection(
    client: &Client,
    settings: &Settings,
    path: &str,
    customer_id: Option<u64>,
) -> (Option<(Paginated, Vec<Value>)>, bool) {
    let customer = customer_id.map(|id| id.to_string());
    let query: Vec<(&str, &str)> = customer.iter().map(|id| ("customer", id.as_str())).collect();

    let url = match endpoint_url(&settings.api_base, path, &query) {
        Ok(url) => url,
        Err(e) => {
            error!("Skipping {}: {:#}", path, e);
            return (None, false);
        }
    };
    println!("URL: {}", url);

    let mut fetch = fetch_all_paginated(
        client,
        &url,
        &settings.credentials,
        settings.per_page,
        settings.max_pages,
    )
    .await;

    println!("Status Code: {}", fetch.status);
    println!("Time Taken: {}", format_time(fetch.elapsed));

    let mut items = std::mem::take(&mut fetch.items);
    // A resolved customer id already scopes the query.
    if customer_id.is_none() {
        items = filter_by_email(items, &settings.email);
    }

    let ok = fetch.is_success();
    match &fetch.error {
        None => println!("{} Found: {}", title(path), format_count(items.len())),
        Some(e) => {
            println!("❌ Error: {}", e);
            if !items.is_empty() {
                println!("Partial {} kept: {}", path, format_count(items.len()));
            }
        }
    }
    print_page_limit(&fetch, "");

    (Some((fetch, items)), ok)
}

async fn fetch_subscription_orders(
    client: &Client,
    settings: &Settings,
    idx: usize,
    subscription_id: &Value,
) -> Option<SubscriptionOrdersResult> {
    let id = display_id(subscription_id);
    println!("\n  Subscription {}: ID {}", idx, id);

    let url = match resource_url(&settings.api_base, "subscriptions", &id, "orders") {
        Ok(url) => url,
        Err(e) => {
            error!("Skipping subscription {}: {:#}", id, e);
            return None;
        }
    };
    println!("  URL: {}", url);

    let fetch = fetch_all_paginated(
        client,
        &url,
        &settings.credentials,
        settings.per_page,
        settings.max_pages,
    )
    .await;

    println!("  Status Code: {}", fetch.status);
    println!("  Time Taken: {}", format_time(fetch.elapsed));

    let filename = subscription_orders_file(&id);
    match &fetch.error {
        None => {
            println!("  Orders Found: {}", format_count(fetch.items.len()));
            print_page_limit(&fetch, "  ");
            let doc = json!({
                "success": true,
                "subscriptionId": subscription_id,
                "count": fetch.items.len(),
                "truncated": fetch.truncated,
                "orders": fetch.items,
            });
            persist(settings, &filename, &doc);
        }
        Some(e) => {
            println!("  ❌ Error: {}", e);
            let header = json!({ "subscriptionId": subscription_id });
            persist(settings, &filename, &error_document(&fetch, header, "orders", &fetch.items));
        }
    }

    Some(SubscriptionOrdersResult {
        subscription_id: subscription_id.clone(),
        result: EndpointResult::from_fetch(&fetch, fetch.items.len()),
    })
}

fn write_collection(
    settings: &Settings,
    filename: &str,
    key: &str,
    customer_id: Option<u64>,
    fetch: &Paginated,
    items: &[Value],
) {
    let header = json!({ "email": settings.email, "customerId": customer_id });
    let doc = match fetch.error {
        None => {
            let mut doc = header;
            doc["success"] = json!(true);
            doc["count"] = json!(items.len());
            doc["truncated"] = json!(fetch.truncated);
            doc[key] = json!(items);
            doc
        }
        Some(_) => error_document(fetch, header, key, items),
    };
    persist(settings, filename, &doc);
}

// The error payload as-is, unless a later page failed and there are partial
// items worth keeping.
fn error_document(fetch: &Paginated, header: Value, key: &str, items: &[Value]) -> Value {
    let Some(error) = &fetch.error else {
        return header;
    };
    if items.is_empty() {
        return error.payload();
    }

    let mut doc = header;
    doc["success"] = json!(false);
    doc["error"] = error.payload();
    doc["count"] = json!(items.len());
    doc[key] = json!(items);
    doc
}

fn print_page_limit(fetch: &Paginated, indent: &str) {
    if fetch.truncated {
        println!(
            "{}⚠️  Reached maximum page limit ({} pages). Some items may be missing.",
            indent, fetch.pages
        );
    }
}

fn persist<T: Serialize + ?Sized>(settings: &Settings, filename: &str, data: &T) {
    if let Err(e) = save_json_file(&settings.output_dir, filename, data) {
        error!("{:#}", e);
    }
}

// Ids that are missing, null, zero or empty are skipped.
fn subscription_id(subscription: &Value) -> Option<&Value> {
    let id = subscription.get("id")?;
    let usable = match id {
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        _ => false,
    };
    usable.then_some(id)
}

fn title(path: &str) -> String {
    let mut chars = path.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
