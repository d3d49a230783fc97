//! Bounded retry around the transport, with rate-limit aware waits.

use crate::error::{QueryError, QueryResult};
use crate::pacing::Sleeper;
use crate::search::events::LogSink;
use crate::seller::models::AuthContext;
use crate::seller::transport::{GraphQlRequest, Transport};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt budget and backoff schedule.
///
/// 429 responses and every other failure draw from the same attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_base: Duration,
    pub rate_limit_step: Duration,
    pub error_base: Duration,
    pub error_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_base: Duration::from_secs(15),
            rate_limit_step: Duration::from_secs(15),
            error_base: Duration::from_secs(2),
            error_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), ..Self::default() }
    }

    /// Wait after a 429 on the zero-based `attempt`.
    pub fn rate_limit_wait(&self, attempt: u32) -> Duration {
        self.rate_limit_base + self.rate_limit_step * attempt
    }

    /// Wait after any other failure on the zero-based `attempt`.
    pub fn error_wait(&self, attempt: u32) -> Duration {
        self.error_base + self.error_step * attempt
    }
}

/// Issues GraphQL queries with retry and backoff. No caching.
pub struct RetryingClient<T> {
    transport: T,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingClient<T> {
    pub fn new(transport: T, sleeper: Arc<dyn Sleeper>, policy: RetryPolicy) -> Self {
        Self { transport, sleeper, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request` until it yields a payload or the attempt budget runs out.
    pub async fn send(
        &self,
        request: &GraphQlRequest,
        auth: &AuthContext,
        log: &mut (dyn LogSink + Send),
    ) -> QueryResult<Value> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = QueryError::RateLimited;

        for attempt in 0..max_attempts {
            debug!("{} attempt {}/{}", request.operation_name, attempt + 1, max_attempts);

            let error = match self.transport.post(request, auth).await {
                Ok(response) if response.is_rate_limited() => {
                    let wait = self.policy.rate_limit_wait(attempt);
                    warn!("Rate limited on {} (attempt {})", request.operation_name, attempt + 1);
                    log.log(&format!(
                        "Rate limit hit (attempt {}), waiting {}s...",
                        attempt + 1,
                        wait.as_secs()
                    ));
                    self.sleeper.sleep(wait).await;
                    last_error = QueryError::RateLimited;
                    continue;
                }
                Ok(response) if !response.is_success() => {
                    QueryError::Http { status: response.status, body: response.body }
                }
                Ok(response) => match decode_payload(&response.body) {
                    Ok(payload) => return Ok(payload),
                    Err(e) => e,
                },
                Err(e) => QueryError::Transport(format!("{:#}", e)),
            };

            warn!("{} failed (attempt {}): {}", request.operation_name, attempt + 1, error);
            last_error = error;

            if attempt + 1 == max_attempts {
                break;
            }

            log.log(&format!("Request failed (attempt {}). Retrying...", attempt + 1));
            self.sleeper.sleep(self.policy.error_wait(attempt)).await;
        }

        Err(QueryError::ExhaustedRetries { attempts: max_attempts, last: Box::new(last_error) })
    }
}

/// Parses a 2xx body and rejects payloads carrying GraphQL errors.
fn decode_payload(body: &str) -> QueryResult<Value> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| QueryError::Decode(e.to_string()))?;

    if let Some(errors) = payload.get("errors") {
        if has_errors(errors) {
            return Err(QueryError::Application(errors.to_string()));
        }
    }

    Ok(payload)
}

fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Null | Value::Bool(false) => false,
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use crate::pacing::testing::RecordingSleeper;
    use crate::seller::transport::RelayResponse;
    use serde_json::json;

    fn make_request() -> GraphQlRequest {
        GraphQlRequest {
            query: "query q { x }".to_string(),
            operation_name: "getNiches".to_string(),
            variables: json!({}),
        }
    }

    fn ok(body: &str) -> anyhow::Result<RelayResponse> {
        Ok(RelayResponse::new(200, body))
    }

    fn status(code: u16) -> anyhow::Result<RelayResponse> {
        Ok(RelayResponse::new(code, format!("status {}", code)))
    }

    fn make_client(
        script: Vec<anyhow::Result<RelayResponse>>,
    ) -> (RetryingClient<ScriptedTransport>, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = RetryingClient::new(
            ScriptedTransport::new(script),
            sleeper.clone(),
            RetryPolicy::default(),
        );
        (client, sleeper)
    }

    #[test]
    fn test_policy_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.rate_limit_wait(0), Duration::from_secs(15));
        assert_eq!(policy.rate_limit_wait(1), Duration::from_secs(30));
        assert_eq!(policy.rate_limit_wait(2), Duration::from_secs(45));
        assert_eq!(policy.error_wait(0), Duration::from_secs(2));
        assert_eq!(policy.error_wait(1), Duration::from_secs(3));
    }

    #[test]
    fn test_policy_minimum_one_attempt() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts, 1);
        assert_eq!(RetryPolicy::with_max_attempts(5).max_attempts, 5);
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let (client, sleeper) = make_client(vec![ok(r#"{"data":{"niches":[]}}"#)]);
        let mut log: Vec<String> = Vec::new();

        let payload = client
            .send(&make_request(), &AuthContext::default(), &mut log)
            .await
            .unwrap();

        assert_eq!(payload["data"]["niches"], json!([]));
        assert_eq!(client.transport().call_count(), 1);
        assert!(sleeper.durations().is_empty());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let (client, sleeper) = make_client(vec![status(429), status(429), ok(r#"{"data":{}}"#)]);
        let mut log: Vec<String> = Vec::new();

        let result = client.send(&make_request(), &AuthContext::default(), &mut log).await;

        assert!(result.is_ok());
        assert_eq!(client.transport().call_count(), 3);
        assert_eq!(sleeper.durations(), vec![Duration::from_secs(15), Duration::from_secs(30)]);
        assert_eq!(log[0], "Rate limit hit (attempt 1), waiting 15s...");
        assert_eq!(log[1], "Rate limit hit (attempt 2), waiting 30s...");
    }

    #[tokio::test]
    async fn test_three_failures_exhaust_retries() {
        let (client, sleeper) = make_client(vec![status(500), status(502), status(503)]);
        let mut log: Vec<String> = Vec::new();

        let err = client
            .send(&make_request(), &AuthContext::default(), &mut log)
            .await
            .unwrap_err();

        match &err {
            QueryError::ExhaustedRetries { attempts, last } => {
                assert_eq!(*attempts, 3);
                assert!(matches!(**last, QueryError::Http { status: 503, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.transport().call_count(), 3);
        // No wait after the final attempt
        assert_eq!(sleeper.durations(), vec![Duration::from_secs(2), Duration::from_secs(3)]);
        assert_eq!(
            log,
            vec![
                "Request failed (attempt 1). Retrying...".to_string(),
                "Request failed (attempt 2). Retrying...".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limits_share_attempt_budget() {
        let (client, _sleeper) = make_client(vec![status(429), status(500), status(429)]);
        let mut log: Vec<String> = Vec::new();

        let err = client
            .send(&make_request(), &AuthContext::default(), &mut log)
            .await
            .unwrap_err();

        assert_eq!(client.transport().call_count(), 3);
        assert!(matches!(err.root(), QueryError::RateLimited));
    }

    #[tokio::test]
    async fn test_graphql_errors_are_retried() {
        let (client, _sleeper) = make_client(vec![
            ok(r#"{"errors":[{"message":"Unauthorized"}]}"#),
            ok(r#"{"data":{"niche":null}}"#),
        ]);
        let mut log: Vec<String> = Vec::new();

        let payload = client
            .send(&make_request(), &AuthContext::default(), &mut log)
            .await
            .unwrap();

        assert_eq!(payload["data"]["niche"], Value::Null);
        assert_eq!(client.transport().call_count(), 2);
        assert_eq!(log, vec!["Request failed (attempt 1). Retrying...".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_or_null_errors_are_not_failures() {
        let (client, _sleeper) = make_client(vec![ok(r#"{"data":{},"errors":[]}"#)]);
        let mut log: Vec<String> = Vec::new();
        assert!(client.send(&make_request(), &AuthContext::default(), &mut log).await.is_ok());

        let (client, _sleeper) = make_client(vec![ok(r#"{"data":{},"errors":null}"#)]);
        assert!(client.send(&make_request(), &AuthContext::default(), &mut log).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_json_is_retried_then_exhausted() {
        let (client, _sleeper) = make_client(vec![ok("<html>"), ok("not json"), ok("")]);
        let mut log: Vec<String> = Vec::new();

        let err = client
            .send(&make_request(), &AuthContext::default(), &mut log)
            .await
            .unwrap_err();
        assert!(matches!(err.root(), QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_retried() {
        let (client, _sleeper) =
            make_client(vec![Err(anyhow::anyhow!("connection reset")), ok(r#"{"data":{}}"#)]);
        let mut log: Vec<String> = Vec::new();

        assert!(client.send(&make_request(), &AuthContext::default(), &mut log).await.is_ok());
        assert_eq!(client.transport().call_count(), 2);
    }

    #[test]
    fn test_has_errors() {
        assert!(!has_errors(&json!(null)));
        assert!(!has_errors(&json!(false)));
        assert!(!has_errors(&json!([])));
        assert!(!has_errors(&json!("")));
        assert!(has_errors(&json!([{"message": "x"}])));
        assert!(has_errors(&json!({"message": "x"})));
        assert!(has_errors(&json!("denied")));
    }
}
