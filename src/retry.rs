use std::time::Duration;
use log::warn;
use reqwest::{Client, Response};

const MAX_ATTEMPTS: u32 = 5;
const RETRY_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Sends a GET request, retrying transport failures and throttling/server
/// statuses with exponential backoff.
///
/// The final response is returned whatever its status, so callers keep their
/// own success check.
///
/// # Arguments
///
/// * 'client' - the client to send through
/// * 'url' - request URL without query parameters
/// * 'query' - query parameters to append
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<Response, reqwest::Error> {
    let mut delay = Duration::from_secs(1);
    let mut attempt = 1;

    loop {
        let result = client.get(url).query(query).send().await;

        match result {
            Ok(response) => {
                if attempt >= MAX_ATTEMPTS || !RETRY_STATUS.contains(&response.status().as_u16()) {
                    return Ok(response);
                }
                warn!(
                    "GET {} returned {}, retrying (attempt {}/{})",
                    url,
                    response.status(),
                    attempt,
                    MAX_ATTEMPTS
                );
            }
            Err(e) => {
                if attempt >= MAX_ATTEMPTS {
                    return Err(e);
                }
                warn!("GET {} failed: {}, retrying (attempt {}/{})", url, e, attempt, MAX_ATTEMPTS);
            }
        }

        tokio::time::sleep(delay).await;
        delay *= 2;
        attempt += 1;
    }
}
