use log::{debug, warn};
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Instant;

use crate::helpers::{
    config::{Credentials, RAW_BODY_PREVIEW_CHARS},
    errors::FetchError,
    types::{ApiResponse, Paginated},
};

/*
    One GET with Basic Auth. Never fails: transport errors come back as status 0
    with a FetchError body, the timeout is whatever the client was built with.
*/
pub async fn get_data(client: &Client, url: &Url, credentials: &Credentials) -> ApiResponse {
    let start = Instant::now();

    let response = client
        .get(url.clone())
        .basic_auth(&credentials.key, Some(&credentials.secret))
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            return ApiResponse {
                body: Err(transport_error(e)),
                elapsed: start.elapsed(),
                status: 0,
            };
        }
    };

    let status = response.status().as_u16();

    // A body that stalls past the timeout is still a timeout.
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            return ApiResponse {
                body: Err(transport_error(e)),
                elapsed: start.elapsed(),
                status: 0,
            };
        }
    };
    let elapsed = start.elapsed();

    let body = serde_json::from_str::<Value>(&text).map_err(|_| FetchError::InvalidJson {
        raw: text.chars().take(RAW_BODY_PREVIEW_CHARS).collect(),
    });

    ApiResponse { body, elapsed, status }
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

/*
    Walk `page=1..=max_pages` until a short page, an error, or the ceiling.
    Items keep the order the API returned them in.
*/
pub async fn fetch_all_paginated(
    client: &Client,
    url: &Url,
    credentials: &Credentials,
    per_page: u32,
    max_pages: u32,
) -> Paginated {
    let mut result = Paginated::default();
    let mut current_page: u32 = 1;

    loop {
        let mut page_url = url.clone();
        page_url
            .query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &current_page.to_string());

        debug!("GET {}", page_url);
        let response = get_data(client, &page_url, credentials).await;
        result.elapsed += response.elapsed;
        result.status = response.status;
        result.pages = current_page;

        if response.status != 200 {
            let error = match response.body {
                Ok(body) => FetchError::from_status(body),
                Err(e) => e,
            };
            debug!("Page {} failed with status {}: {}", current_page, response.status, error);
            // First page failing leaves `items` empty anyway.
            result.error = Some(error);
            break;
        }

        let page_items = match response.body {
            Ok(Value::Array(items)) => items,
            Ok(Value::Object(map)) => {
                if map.contains_key("code") || map.contains_key("message") {
                    result.items.clear();
                    result.error = Some(FetchError::from_embedded(Value::Object(map)));
                    break;
                }
                vec![Value::Object(map)]
            }
            Ok(other) => {
                debug!("Page {} returned a non-collection body: {}", current_page, other);
                break;
            }
            Err(e) => {
                result.error = Some(e);
                break;
            }
        };

        if page_items.is_empty() {
            break;
        }

        let page_len = page_items.len();
        result.items.extend(page_items);
        debug!("Page {} returned {} items", current_page, page_len);

        if page_len < per_page as usize {
            break;
        }

        if current_page >= max_pages {
            warn!(
                "Reached maximum page limit ({} pages) for {}. Some items may be missing.",
                max_pages, url
            );
            result.truncated = true;
            break;
        }

        current_page += 1;
    }

    result
}
