use crate::alerts::payload::WebhookMessage;
use crate::error::AlertError;
use log::debug;
use reqwest::Client;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Default bound on a single webhook delivery
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

/// Delivery channel for rendered alerts
///
/// `deliver` returns `Ok(())` only when the channel confirmed acceptance;
/// any other outcome is an error and must not be treated as delivered.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn deliver(&self, message: &WebhookMessage) -> Result<(), AlertError>;
}

/// Posts alerts as JSON to an HTTP webhook
///
/// Delivery is synchronous from the caller's point of view: the request is
/// driven to completion on a private current-thread runtime and bounded by
/// the client timeout.
pub struct WebhookNotifier {
    client: Client,
    runtime: Runtime,
    url: String,
}

impl WebhookNotifier {
    /// Create a notifier for the given webhook URL
    ///
    /// # Arguments
    /// * `url` - Webhook endpoint (e.g. a Slack incoming-webhook URL)
    /// * `timeout` - Upper bound for connect + request + response
    ///
    /// # Errors
    ///
    /// Returns `AlertError` if the HTTP client or runtime cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AlertError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(url, client)
    }

    /// Create a notifier around a preconfigured HTTP client
    ///
    /// The client's own timeout bounds each delivery.
    pub fn with_client(url: impl Into<String>, client: Client) -> Result<Self, AlertError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        Ok(Self {
            client,
            runtime,
            url: url.into(),
        })
    }

    async fn post(&self, message: &WebhookMessage) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!("Webhook accepted notification with status {}", status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AlertError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

impl Notifier for WebhookNotifier {
    fn deliver(&self, message: &WebhookMessage) -> Result<(), AlertError> {
        self.runtime.block_on(self.post(message))
    }
}

fn classify_transport_error(error: reqwest::Error) -> AlertError {
    if error.is_timeout() {
        AlertError::Timeout
    } else {
        AlertError::HttpError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::payload::{Alert, PayloadBuilder};
    use crate::events::AlertCategory;
    use chrono::Utc;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    fn test_message() -> WebhookMessage {
        let alert = Alert::new(AlertCategory::Recovery, "Primary pool *blue* has recovered")
            .with_detail("Pool", "blue");
        PayloadBuilder::default().build(&alert, Utc::now())
    }

    /// Read one HTTP request (headers plus Content-Length body)
    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    return text[header_end + 4..].to_string();
                }
            }
        }
        String::new()
    }

    /// Serve a single request with the given status line, returning the body it received
    fn serve_once(status_line: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let body = read_request(&mut stream);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    status_line
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
                let _ = tx.send(body);
            }
        });

        (url, rx)
    }

    /// Local stub endpoints must not go through a proxy from the environment
    fn local_notifier(url: String, timeout: Duration) -> WebhookNotifier {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .unwrap();
        WebhookNotifier::with_client(url, client).unwrap()
    }

    #[test]
    fn test_deliver_success_posts_json() {
        let (url, rx) = serve_once("200 OK");
        let notifier = local_notifier(url, Duration::from_secs(5));

        let result = notifier.deliver(&test_message());
        assert!(result.is_ok(), "unexpected error: {:?}", result);

        let body = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["text"], ":warning: *RECOVERY ALERT*");
        assert_eq!(json["attachments"][0]["color"], "#4CAF50");
    }

    #[test]
    fn test_deliver_accepts_any_2xx() {
        let (url, _rx) = serve_once("202 Accepted");
        let notifier = local_notifier(url, Duration::from_secs(5));
        assert!(notifier.deliver(&test_message()).is_ok());
    }

    #[test]
    fn test_deliver_rejected_status_is_error() {
        let (url, _rx) = serve_once("500 Internal Server Error");
        let notifier = local_notifier(url, Duration::from_secs(5));

        match notifier.deliver(&test_message()) {
            Err(AlertError::Rejected { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "ok");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_deliver_unreachable_endpoint_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        drop(listener);

        let notifier = local_notifier(url, Duration::from_secs(5));
        assert!(notifier.deliver(&test_message()).is_err());
    }

    #[test]
    fn test_deliver_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());

        // Accept but never answer
        let handle = thread::spawn(move || {
            let accepted = listener.accept();
            thread::sleep(Duration::from_secs(2));
            drop(accepted);
        });

        let notifier = local_notifier(url, Duration::from_millis(300));
        match notifier.deliver(&test_message()) {
            Err(AlertError::Timeout) => {}
            other => panic!("Expected timeout, got {:?}", other),
        }

        handle.join().unwrap();
    }
}
