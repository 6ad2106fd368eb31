//! Resource Fetcher
//!
//! List responses come as `{"value": [...], "nextLink": "..."}`; this module
//! follows `nextLink` until the collection is exhausted.

use crate::azure::client::ArmClient;
use crate::error::Result;
use serde_json::Value;
use std::collections::HashSet;

/// One page of a list response
pub struct Page {
    pub items: Vec<Value>,
    pub next_link: Option<String>,
}

/// Fetch a single page
pub async fn fetch_page(client: &ArmClient, url: &str) -> Result<Page> {
    let response = client.get(url).await?;

    let items = response
        .get("value")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let next_link = response
        .get("nextLink")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Ok(Page { items, next_link })
}

/// Fetch every page starting at `url`
pub async fn fetch_all(client: &ArmClient, url: &str) -> Result<Vec<Value>> {
    let mut all_items = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(url.to_string());

    while let Some(current) = next {
        let page = fetch_page(client, &current).await?;
        visited.insert(current);
        all_items.extend(page.items);

        // Stop on a link cycle instead of looping forever
        next = page.next_link.filter(|link| {
            let seen = visited.contains(link);
            if seen {
                tracing::warn!("Pagination revisits {}, stopping", link);
            }
            !seen
        });
    }
    let pages = visited.len();

    tracing::debug!("Fetched {} items in {} pages", all_items.len(), pages);
    Ok(all_items)
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}
