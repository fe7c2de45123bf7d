use anyhow::{Context, Result};
use log::debug;
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::helpers::{config::Settings, types::Summary};

pub const SUBSCRIPTIONS_FILE: &str = "subscriptions_response.json";
pub const ORDERS_FILE: &str = "orders_response.json";
pub const SUMMARY_FILE: &str = "test_summary.json";

const RULE_WIDTH: usize = 80;

// Anything outside `[A-Za-z0-9_-]` becomes `_` so the id can't leave the
// output directory.
pub fn subscription_orders_file(subscription_id: &str) -> String {
    let safe: String = subscription_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("subscription_{}_orders_response.json", safe)
}

// Pretty-printed UTF-8 JSON, overwriting whatever was there.
pub fn save_json_file<T: Serialize + ?Sized>(dir: &Path, filename: &str, data: &T) -> Result<PathBuf> {
    let path = dir.join(filename);
    let json = serde_json::to_string_pretty(data).context("Failed to serialize JSON")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    println!("  ✓ Saved to: {}", path.display());
    Ok(path)
}

// 1.2345s -> "1.234s (1234.50ms)"
pub fn format_time(elapsed: Duration) -> String {
    format_seconds(elapsed.as_secs_f64())
}

pub fn format_seconds(seconds: f64) -> String {
    format!("{:.3}s ({:.2}ms)", seconds, seconds * 1000.0)
}

pub fn format_count(count: usize) -> String {
    count.to_formatted_string(&Locale::en)
}

pub fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

pub fn print_banner(settings: &Settings, timestamp: &str) {
    println!("{}", rule('='));
    println!("Store REST API Direct Test");
    println!("{}", rule('='));
    println!("Store URL: {}", settings.store_url);
    println!("API Base: {}", settings.api_base);
    println!("Email: {}", settings.email);
    println!("Timestamp: {}", timestamp);
    println!("{}", rule('='));
    println!();
}

pub fn print_summary(summary: &Summary) {
    println!("{}", rule('='));
    println!("📊 PERFORMANCE SUMMARY");
    println!("{}", rule('='));
    println!();

    if let Some(sub) = &summary.results.subscriptions {
        println!("1. Subscriptions Endpoint:");
        println!("   Time: {}", format_seconds(sub.time_seconds));
        println!("   Status: {}", sub.status_code);
        if let Some(count) = sub.count {
            println!("   Count: {} subscriptions", format_count(count));
        }
        if sub.truncated {
            println!("   ⚠️  Stopped at the page limit ({} pages)", sub.pages);
        }
        println!();
    }

    if let Some(ord) = &summary.results.orders {
        println!("2. Orders Endpoint:");
        println!("   Time: {}", format_seconds(ord.time_seconds));
        println!("   Status: {}", ord.status_code);
        if let Some(count) = ord.count {
            println!("   Count: {} orders", format_count(count));
        }
        if ord.truncated {
            println!("   ⚠️  Stopped at the page limit ({} pages)", ord.pages);
        }
        println!();
    }

    let sub_orders = &summary.results.subscription_orders;
    if !sub_orders.is_empty() {
        let total: f64 = sub_orders.iter().map(|r| r.result.time_seconds).sum();
        let average = total / sub_orders.len() as f64;

        println!("3. Subscription Orders Endpoint:");
        println!("   Total Time: {}", format_seconds(total));
        println!("   Average Time: {}", format_seconds(average));
        println!("   Requests: {}", sub_orders.len());
        for r in sub_orders {
            println!(
                "   - Subscription {}: {}",
                display_id(&r.subscription_id),
                format_seconds(r.result.time_seconds)
            );
        }
        println!();
    }

    println!("Total Test Time: {}", format_seconds(summary.total_time_seconds));
    println!();
}

pub fn print_generated_files() {
    println!("{}", rule('='));
    println!("✅ Test Complete!");
    println!("{}", rule('='));
    println!("\nGenerated Files:");
    println!("  - {}", SUBSCRIPTIONS_FILE);
    println!("  - {}", ORDERS_FILE);
    println!("  - subscription_*_orders_response.json (one per subscription)");
    println!("  - {}", SUMMARY_FILE);
}

// Strings print without their JSON quotes.
pub fn display_id(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
