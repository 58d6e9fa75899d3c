//! Best-effort error reporting.
//!
//! Failures are fanned out to two independent sinks — a Discord webhook and a
//! Notion bug-tracker database. Reporting is fire-and-forget: it is active
//! only in production, each sink's failure is logged and swallowed, and the
//! caller never observes an error.

pub mod discord;
pub mod notion;

use tracing::{debug, warn};

use crate::config::AppConfig;

/// One failure, constructed at the failure site and discarded after fan-out.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub title: String,
    pub endpoint: String,
    pub description: String,
    /// Raw request payload for context, when the failure site has one.
    pub input_body: Option<String>,
}

impl ErrorReport {
    pub fn new(
        title: impl Into<String>,
        endpoint: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            endpoint: endpoint.into(),
            description: description.into(),
            input_body: None,
        }
    }

    pub fn with_input_body(mut self, body: impl Into<String>) -> Self {
        self.input_body = Some(body.into());
        self
    }
}

#[derive(Clone)]
pub struct ErrorReporter {
    enabled: bool,
    discord_webhook_url: Option<String>,
    notion_token: Option<String>,
    notion_database_id: Option<String>,
    notion_api_base: String,
    server_address: String,
}

impl ErrorReporter {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            enabled: config.environment.is_production(),
            discord_webhook_url: config.discord_webhook_url.clone(),
            notion_token: config.notion_token.clone(),
            notion_database_id: config.notion_database_id.clone(),
            notion_api_base: config.notion_api_base.clone(),
            server_address: config.server_address.clone(),
        }
    }

    /// Queue a report for delivery. Never blocks and never fails; outside
    /// production the report is dropped.
    pub fn report(&self, report: ErrorReport) {
        if !self.enabled {
            debug!(title = %report.title, "error reporting inactive — dropping report");
            return;
        }
        let reporter = self.clone();
        tokio::spawn(async move {
            reporter.dispatch(report).await;
        });
    }

    /// Deliver to both sinks. Each sink's failure is logged and swallowed;
    /// neither sink can prevent the other from being attempted.
    pub async fn dispatch(&self, report: ErrorReport) {
        let client = match reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                warn!("error reporter: failed to build HTTP client: {e:#}");
                return;
            }
        };

        match (&self.notion_token, &self.notion_database_id) {
            (Some(token), Some(database_id)) => {
                if let Err(e) = notion::create_bug_page(
                    &client,
                    &self.notion_api_base,
                    token,
                    database_id,
                    &self.server_address,
                    &report,
                )
                .await
                {
                    warn!("error reporter: notion sink failed: {e:#}");
                }
            }
            _ => debug!("error reporter: notion sink not configured"),
        }

        match &self.discord_webhook_url {
            Some(url) => {
                if let Err(e) = discord::send_embed(&client, url, &report).await {
                    warn!("error reporter: discord sink failed: {e:#}");
                }
            }
            None => debug!("error reporter: discord sink not configured"),
        }
    }
}
