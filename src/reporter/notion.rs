//! Notion sink — one page per report in the bug-tracker database.
//!
//! Page shape: properties (title, date, Pending status, frontend type tag,
//! endpoint URL) plus a body of headings and code blocks. Long descriptions
//! are split into consecutive 2000-character code blocks because Notion caps
//! rich-text content per block.

use anyhow::{bail, Result};
use chrono::{FixedOffset, Offset as _, Utc};
use serde_json::{json, Value};

use super::ErrorReport;

const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects rich-text contents beyond 2000 characters per block.
pub const MAX_CHUNK_CHARS: usize = 2000;
/// Report timestamps are recorded in the team's home timezone (UTC+05:30).
const REPORT_UTC_OFFSET_SECS: i32 = 5 * 3600 + 1800;

pub(super) async fn create_bug_page(
    client: &reqwest::Client,
    api_base: &str,
    token: &str,
    database_id: &str,
    server_address: &str,
    report: &ErrorReport,
) -> Result<()> {
    let payload = page_payload(database_id, server_address, report, &report_timestamp());
    let url = format!("{api_base}/pages");
    let resp = client
        .post(&url)
        .bearer_auth(token)
        .header("Notion-Version", NOTION_VERSION)
        .json(&payload)
        .send()
        .await?;
    if !resp.status().is_success() {
        bail!("notion api returned {}", resp.status());
    }
    Ok(())
}

/// Current time in the report timezone, `YYYY-MM-DDTHH:MM:SS`.
fn report_timestamp() -> String {
    let offset = FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    Utc::now()
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn page_payload(
    database_id: &str,
    server_address: &str,
    report: &ErrorReport,
    timestamp: &str,
) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Error": {
                "title": [{ "type": "text", "text": { "content": report.title } }]
            },
            "Date": { "date": { "start": timestamp } },
            "Status": { "status": { "name": "Pending" } },
            "Type": { "select": { "name": "frontend" } },
            "API": { "url": report.endpoint },
        },
        "children": content_blocks(server_address, report),
    })
}

fn content_blocks(server_address: &str, report: &ErrorReport) -> Vec<Value> {
    let raw = report.input_body.as_deref().unwrap_or_default();
    // Pretty-print the captured input when it parses as JSON; otherwise keep
    // it verbatim.
    let formatted = match serde_json::from_str::<Value>(raw) {
        Ok(parsed) => serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    };

    let mut blocks = vec![
        heading("Input request:", "blue"),
        code_block("json", &format!("URL: \"{server_address}\"\n{formatted}")),
        heading("Error Traceback:", "red"),
    ];
    blocks.extend(
        chunk_description(&report.description)
            .iter()
            .map(|chunk| code_block("plain text", chunk)),
    );
    blocks.push(heading("Solution:", "green"));
    blocks
}

fn heading(text: &str, color: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_2",
        "heading_2": {
            "rich_text": [{
                "type": "text",
                "text": { "content": text },
                "annotations": { "color": color }
            }]
        }
    })
}

fn code_block(language: &str, content: &str) -> Value {
    json!({
        "object": "block",
        "type": "code",
        "code": {
            "language": language,
            "rich_text": [{ "type": "text", "text": { "content": content } }]
        }
    })
}

/// Split a description into consecutive windows of [`MAX_CHUNK_CHARS`]
/// characters. The last window may be shorter; concatenating the windows in
/// order reproduces the input exactly. Empty input yields no chunks.
pub fn chunk_description(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut len = 0usize;
    for ch in text.chars() {
        current.push(ch);
        len += 1;
        if len == MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
            len = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ─── Tests ───────────────────────────────────────────────────────────────────
