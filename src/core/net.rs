use reqwest::{Client, RequestBuilder, Response};
use url::Url;

use crate::core::{FinnhubError, client::RetryConfig};

/// Sends `req`, retrying transient failures according to `retry`.
///
/// Non-retryable statuses are returned as a normal response so the caller can
/// decide how to report them.
pub(crate) async fn send_with_retry(
    req: RequestBuilder,
    retry: &RetryConfig,
) -> Result<Response, FinnhubError> {
    let mut attempt: u32 = 0;
    loop {
        let Some(this_try) = req.try_clone() else {
            return req.send().await.map_err(|e| e.without_url().into());
        };
        let can_retry = retry.enabled && attempt < retry.max_retries;

        match this_try.send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if !(can_retry && retry.should_retry_status(status)) {
                    return Ok(resp);
                }
                tracing::warn!(status, attempt, path = %resp.url().path(), "upstream returned retryable status");
            }
            Err(e) => {
                if !(can_retry && retry.should_retry_error(&e)) {
                    return Err(e.without_url().into());
                }
                tracing::warn!(attempt, error = %e.without_url(), "upstream request failed, retrying");
            }
        }

        tokio::time::sleep(retry.backoff.delay_for(attempt)).await;
        attempt += 1;
    }
}

/// GETs `url` and returns the body text of a successful response.
///
/// Transport errors have their URL stripped since it carries the API token.
///
/// Takes owned arguments so the returned future can outlive the caller, which the
/// cache needs when it shares the computation between waiters.
pub(crate) async fn fetch_text(
    http: Client,
    url: Url,
    retry: RetryConfig,
) -> Result<String, FinnhubError> {
    let req = http.get(url).header("accept", "application/json");
    let resp = send_with_retry(req, &retry).await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FinnhubError::Status {
            status: status.as_u16(),
            body,
        });
    }

    resp.text().await.map_err(|e| e.without_url().into())
}
