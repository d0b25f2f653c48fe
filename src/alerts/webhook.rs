//! HTTP webhook delivery

use crate::alerts::Notifier;
use crate::error::AlertError;
use log::debug;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
}

/// POSTs `{"subject": ..., "body": ...}` to a URL
pub struct WebhookNotifier {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Create a notifier whose requests give up after `timeout`
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AlertError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            timeout,
        })
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { subject, body })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AlertError::Timeout(self.timeout.as_secs())
                } else {
                    AlertError::HttpError(e)
                }
            })?;

        let status = response.status();
        debug!("Webhook answered {}", status);
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(AlertError::NotificationFailed(format!(
                "Webhook returned {}: {}",
                status,
                text.trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread::{self, JoinHandle};
    use std::time::Instant;

    /// Answer one request with `status_line` and return the request body
    fn serve_once(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            let body = loop {
                let read = socket.read(&mut chunk).unwrap();
                request.extend_from_slice(&chunk[..read]);
                let text = String::from_utf8_lossy(&request).into_owned();
                if let Some((head, body)) = text.split_once("\r\n\r\n") {
                    let length = head
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if body.len() >= length || read == 0 {
                        break body.to_string();
                    }
                }
                if read == 0 {
                    break String::new();
                }
            };

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                status_line
            );
            socket.write_all(response.as_bytes()).unwrap();
            body
        });

        (url, handle)
    }

    #[test]
    fn test_posts_subject_and_body_as_json() {
        let (url, server) = serve_once("200 OK");
        let notifier = WebhookNotifier::new(&url, Duration::from_secs(5)).unwrap();

        notifier.send("[prod] Log alert: ERROR", "4 errors").unwrap();

        let received: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(received["subject"], "[prod] Log alert: ERROR");
        assert_eq!(received["body"], "4 errors");
    }

    #[test]
    fn test_non_success_status_fails() {
        let (url, server) = serve_once("500 Internal Server Error");
        let notifier = WebhookNotifier::new(&url, Duration::from_secs(5)).unwrap();

        let result = notifier.send("subject", "body");
        server.join().unwrap();
        assert!(matches!(result, Err(AlertError::NotificationFailed(_))));
    }

    #[test]
    fn test_silent_endpoint_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let (release, hold) = mpsc::channel::<()>();
        let server = thread::spawn(move || {
            // Keep the connection open without ever answering
            let (_socket, _) = listener.accept().unwrap();
            let _ = hold.recv();
        });

        let notifier = WebhookNotifier::new(&url, Duration::from_secs(1)).unwrap();
        let started = Instant::now();
        let result = notifier.send("subject", "body");
        let elapsed = started.elapsed();

        drop(release);
        server.join().unwrap();
        assert!(matches!(result, Err(AlertError::Timeout(1))));
        assert!(elapsed < Duration::from_secs(10));
    }

    #[test]
    fn test_unreachable_endpoint_fails() {
        let notifier =
            WebhookNotifier::new("http://127.0.0.1:9/hook", Duration::from_secs(2)).unwrap();
        assert!(notifier.send("subject", "body").is_err());
    }
}
