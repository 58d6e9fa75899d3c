//! Discord sink — one red embed per report.

use anyhow::{bail, Result};
use serde_json::{json, Value};

use super::ErrorReport;

const EMBED_TITLE: &str = "Bug report";
const EMBED_COLOR: u32 = 0xff0000;
/// Discord truncates long field values; the embed carries a preview only —
/// the full description lives on the Notion page.
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

pub(super) async fn send_embed(
    client: &reqwest::Client,
    webhook_url: &str,
    report: &ErrorReport,
) -> Result<()> {
    let payload = embed_payload(report);
    let resp = client.post(webhook_url).json(&payload).send().await?;
    if !resp.status().is_success() {
        bail!("discord webhook returned {}", resp.status());
    }
    Ok(())
}

fn embed_payload(report: &ErrorReport) -> Value {
    let preview: String = report
        .description
        .chars()
        .take(DESCRIPTION_PREVIEW_CHARS)
        .collect();
    json!({
        "embeds": [{
            "title": EMBED_TITLE,
            "color": EMBED_COLOR,
            "fields": [
                { "name": "api_endpoint", "value": report.endpoint, "inline": true },
                { "name": "error_name", "value": report.title, "inline": true },
                { "name": "error_description", "value": preview, "inline": true },
            ],
        }]
    })
}
