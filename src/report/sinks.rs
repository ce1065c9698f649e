//! Built-in notification sinks.

use std::sync::Arc;

use serde_json::json;

use super::{DispatchError, DispatchFuture, NotificationSink, RunSummary, render_report};
use crate::transport::{HttpRequest, Method, Transport};

/// Writes the rendered report to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn deliver<'a>(&'a self, summary: &'a RunSummary) -> DispatchFuture<'a> {
        Box::pin(async move {
            tracing::info!(
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                report = %render_report(summary),
                "snapshot run report"
            );
            Ok(())
        })
    }
}

/// POSTs the report as JSON to a webhook.
#[derive(Debug)]
pub struct WebhookSink<T> {
    transport: Arc<T>,
    url: String,
}

impl<T> WebhookSink<T> {
    /// Creates a sink posting to `url` through `transport`.
    #[must_use]
    pub fn new(transport: Arc<T>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }
}

impl<T: Transport> NotificationSink for WebhookSink<T> {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn deliver<'a>(&'a self, summary: &'a RunSummary) -> DispatchFuture<'a> {
        Box::pin(async move {
            let payload = json!({
                "subject": summary.subject(),
                "text": render_report(summary),
                "summary": summary,
            });
            let request = HttpRequest::new(Method::Post, self.url.as_str())
                .header("Content-Type", "application/json")
                .json(payload);
            let response =
                self.transport
                    .send(request)
                    .await
                    .map_err(|err| DispatchError::Delivery {
                        sink: self.name().to_owned(),
                        message: err.to_string(),
                    })?;
            if response.is_success() {
                Ok(())
            } else {
                Err(DispatchError::Rejected {
                    sink: self.name().to_owned(),
                    status: response.status,
                })
            }
        })
    }
}
