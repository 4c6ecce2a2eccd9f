//! HTTP PublisherClient.
//!
//! Posts each batch as a JSON array to `{endpoint}/event-types/{event_type}/events`.
//!
//! | Response | Outcome |
//! |----------|---------|
//! | 207 with `{"failed": [eid, ...]}` | partially published |
//! | other 2xx | published |
//! | 408, 429, 5xx, network, timeout | transient failure |
//! | other 4xx | permanent failure |

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::event_log::{EventLogEntry, Operation};
use crate::domain::foundation::{DomainError, Eid, ErrorCode, Timestamp};
use crate::ports::{PublishError, PublishOutcome, PublisherClient};

/// Configuration for the HTTP publisher.
#[derive(Debug, Clone)]
pub struct HttpPublisherConfig {
    /// Base URL of the broker ingestion API.
    pub endpoint: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpPublisherConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Wire shape of one event.
#[derive(Debug, Serialize)]
struct WireEvent<'a> {
    eid: Eid,
    event_type: &'a str,
    operation: Operation,
    occurred_at: Timestamp,
    payload: &'a str,
}

#[derive(Debug, Deserialize)]
struct PartialFailureBody {
    #[serde(default)]
    failed: Vec<Eid>,
}

/// Publisher that talks to the broker over HTTP.
pub struct HttpPublisherClient {
    config: HttpPublisherConfig,
    base: Url,
    client: Client,
}

impl HttpPublisherClient {
    pub fn new(config: HttpPublisherConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        let base = Url::parse(&config.endpoint)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("Invalid publisher endpoint: {}", config.endpoint),
                )
            })?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// `{endpoint}/event-types/{event_type}/events`, with the event type
    /// percent-encoded as a single path segment.
    fn events_url(&self, event_type: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["event-types", event_type, "events"]);
        }
        url
    }
}

#[async_trait]
impl PublisherClient for HttpPublisherClient {
    async fn publish(
        &self,
        event_type: &str,
        events: &[EventLogEntry],
    ) -> Result<PublishOutcome, PublishError> {
        let body: Vec<WireEvent<'_>> = events
            .iter()
            .map(|e| WireEvent {
                eid: e.eid,
                event_type: &e.event_type,
                operation: e.operation,
                occurred_at: e.created_at,
                payload: &e.payload,
            })
            .collect();

        let response = self
            .client
            .post(self.events_url(event_type))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::transient(format!(
                        "Request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    PublishError::transient(format!("Connection failed: {}", e))
                } else {
                    PublishError::transient(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        classify_response(status, &text)
    }
}

/// Maps a broker response onto a publish outcome.
fn classify_response(status: StatusCode, body: &str) -> Result<PublishOutcome, PublishError> {
    if status == StatusCode::MULTI_STATUS {
        let parsed: PartialFailureBody = serde_json::from_str(body).map_err(|e| {
            PublishError::transient(format!("Unreadable partial failure body: {}", e))
        })?;
        if parsed.failed.is_empty() {
            return Ok(PublishOutcome::Published);
        }
        return Ok(PublishOutcome::PartiallyPublished {
            failed: parsed.failed,
        });
    }

    if status.is_success() {
        return Ok(PublishOutcome::Published);
    }

    match status.as_u16() {
        408 | 429 | 500..=599 => Err(PublishError::transient(format!(
            "Broker error {}: {}",
            status, body
        ))),
        400..=499 => Err(PublishError::permanent(format!(
            "Broker rejected batch {}: {}",
            status, body
        ))),
        _ => Err(PublishError::transient(format!(
            "Unexpected status {}: {}",
            status, body
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn success_is_published() {
        assert_eq!(
            classify_response(StatusCode::ACCEPTED, "").unwrap(),
            PublishOutcome::Published
        );
    }

    #[test]
    fn multi_status_lists_failed_eids() {
        let eid = Uuid::new_v4();
        let body = format!(r#"{{"failed": ["{}"]}}"#, eid);

        let outcome = classify_response(StatusCode::MULTI_STATUS, &body).unwrap();

        assert_eq!(
            outcome,
            PublishOutcome::PartiallyPublished {
                failed: vec![Eid::from_uuid(eid)]
            }
        );
    }

    #[test]
    fn multi_status_without_failures_is_published() {
        let outcome = classify_response(StatusCode::MULTI_STATUS, r#"{"failed": []}"#).unwrap();
        assert_eq!(outcome, PublishOutcome::Published);
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = classify_response(StatusCode::UNPROCESSABLE_ENTITY, "bad").unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn server_errors_and_throttling_are_transient() {
        for status in [
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::REQUEST_TIMEOUT,
        ] {
            assert!(classify_response(status, "").unwrap_err().is_transient());
        }
    }

    #[test]
    fn events_url_joins_endpoint_and_type() {
        let client = HttpPublisherClient::new(HttpPublisherConfig::new("http://broker:8080/")).unwrap();
        assert_eq!(
            client.events_url("order").as_str(),
            "http://broker:8080/event-types/order/events"
        );
    }

    #[test]
    fn events_url_encodes_event_type_as_one_segment() {
        let client =
            HttpPublisherClient::new(HttpPublisherConfig::new("http://broker:8080/api")).unwrap();
        assert_eq!(
            client.events_url("orders/eu west?x").as_str(),
            "http://broker:8080/api/event-types/orders%2Feu%20west%3Fx/events"
        );
    }

    #[test]
    fn unparseable_endpoint_is_rejected() {
        assert!(HttpPublisherClient::new(HttpPublisherConfig::new("not a url")).is_err());
    }

    #[test]
    fn wire_event_serializes_operation_and_eid() {
        let eid = Eid::from_uuid(Uuid::new_v4());
        let wire = WireEvent {
            eid,
            event_type: "order",
            operation: Operation::Delete,
            occurred_at: Timestamp::from_epoch_millis(1_700_000_000_000).unwrap(),
            payload: "{}",
        };

        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(json["eid"], eid.to_string());
        assert_eq!(json["event_type"], "order");
        assert!(json["operation"].is_string());
    }
}
