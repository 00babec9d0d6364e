//! Loopback HTTP listener capturing the authorization redirect.
//!
//! The authorization flow ends with the provider redirecting the user's
//! browser to this listener. Recognized requests become `OauthCallback`
//! messages on the channel; everything else (favicons, stray probes) is
//! ignored without side effects. Runs on a dedicated thread for the
//! component's lifetime and is unblocked on drop.

use crate::domain::{DomainError, OauthCallback};
use std::sync::Arc;
use tiny_http::{Response, Server};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const SUCCESS_PAGE: &str = r#"<html>
<head><title>Dropbox linked</title>
<style>body { font-family: system-ui, sans-serif; text-align: center; padding: 50px; }</style>
</head>
<body>
<h1>Dropbox account linked</h1>
<p>You can close this window and return to the application.</p>
</body>
</html>"#;

const FAILURE_PAGE: &str = r#"<html>
<head><title>Authorization failed</title>
<style>body { font-family: system-ui, sans-serif; text-align: center; padding: 50px; }</style>
</head>
<body>
<h1>Authorization failed</h1>
<p>You can close this window and retry from the application.</p>
</body>
</html>"#;

/// Listener handle. Dropping it stops the server thread.
pub struct CallbackServer {
    server: Arc<Server>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind the listener and start forwarding callbacks into `tx`.
    pub fn bind(
        addr: &str,
        tx: mpsc::UnboundedSender<OauthCallback>,
    ) -> Result<Self, DomainError> {
        let server = Server::http(addr)
            .map_err(|e| DomainError::Callback(format!("could not listen on {}: {}", addr, e)))?;
        let server = Arc::new(server);
        info!(%addr, "callback listener started");

        let worker = Arc::clone(&server);
        let thread = std::thread::spawn(move || serve(worker, tx));

        Ok(Self {
            server,
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.server_addr().to_ip()
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn serve(server: Arc<Server>, tx: mpsc::UnboundedSender<OauthCallback>) {
    loop {
        // recv() returns Err once unblock() is called from Drop.
        let request = match server.recv() {
            Ok(r) => r,
            Err(_) => break,
        };
        let url = request.url().to_string();

        match parse_callback(&url) {
            Some(callback) => {
                debug!(state = %callback.state, success = callback.success, "authorization redirect received");
                let page = if callback.success {
                    SUCCESS_PAGE
                } else {
                    FAILURE_PAGE
                };
                respond_html(request, page);
                if tx.send(callback).is_err() {
                    warn!("callback consumer is gone; dropping authorization result");
                }
            }
            None => {
                debug!(%url, "ignoring request without a recognized callback shape");
                let _ = request.respond(Response::empty(204));
            }
        }
    }
    debug!("callback listener stopped");
}

/// A recognized callback carries a `state` plus either a `success` flag or the
/// standard OAuth error pair. Anything else is noise.
fn parse_callback(url: &str) -> Option<OauthCallback> {
    let state = query_param(url, "state")?;

    if let Some(error) = query_param(url, "error") {
        let message = query_param(url, "error_description").unwrap_or(error);
        return Some(OauthCallback {
            state,
            success: false,
            message: Some(message),
        });
    }

    let success = matches!(query_param(url, "success")?.as_str(), "true" | "1");
    Some(OauthCallback {
        state,
        success,
        message: query_param(url, "message"),
    })
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split('?').nth(1)?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| percent_decode(value))
    })
}

fn percent_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                bytes.push(byte);
            }
        } else if c == '+' {
            bytes.push(b' ');
        } else {
            bytes.extend_from_slice(c.to_string().as_bytes());
        }
    }

    String::from_utf8_lossy(&bytes).to_string()
}

fn respond_html(request: tiny_http::Request, body: &str) {
    let response = Response::from_string(body).with_header(
        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
            .unwrap(),
    );
    if let Err(e) = request.respond(response) {
        debug!(error = %e, "could not answer the callback request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    #[test]
    fn parses_the_success_form() {
        let callback = parse_callback("/?state=abc123&success=true").unwrap();
        assert_eq!(callback.state, "abc123");
        assert!(callback.success);
        assert!(callback.message.is_none());
    }

    #[test]
    fn parses_the_failure_form_with_a_message() {
        let callback =
            parse_callback("/?state=abc123&success=false&message=account%20mismatch").unwrap();
        assert!(!callback.success);
        assert_eq!(callback.message.as_deref(), Some("account mismatch"));
    }

    #[test]
    fn parses_the_oauth_error_form() {
        let callback =
            parse_callback("/?state=abc123&error=access_denied&error_description=user%20said%20no")
                .unwrap();
        assert!(!callback.success);
        assert_eq!(callback.message.as_deref(), Some("user said no"));
    }

    #[test]
    fn requests_without_a_state_are_not_callbacks() {
        assert!(parse_callback("/favicon.ico").is_none());
        assert!(parse_callback("/?success=true").is_none());
        assert!(parse_callback("/?state=abc123").is_none(), "state alone is not enough");
    }

    #[test]
    fn decodes_plus_and_percent_sequences() {
        assert_eq!(percent_decode("a+b%20c"), "a b c");
        assert_eq!(percent_decode("plain"), "plain");
    }

    fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[tokio::test]
    async fn forwards_redirects_into_the_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server = CallbackServer::bind("127.0.0.1:0", tx).unwrap();
        let addr = server.local_addr().unwrap();

        let response =
            tokio::task::spawn_blocking(move || http_get(addr, "/?state=abc123&success=true"))
                .await
                .unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        let callback = rx.recv().await.unwrap();
        assert_eq!(callback.state, "abc123");
        assert!(callback.success);
    }

    #[tokio::test]
    async fn unrecognized_requests_get_a_204_and_no_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server = CallbackServer::bind("127.0.0.1:0", tx).unwrap();
        let addr = server.local_addr().unwrap();

        let response = tokio::task::spawn_blocking(move || http_get(addr, "/favicon.ico"))
            .await
            .unwrap();

        assert!(response.starts_with("HTTP/1.1 204"));
        assert!(rx.try_recv().is_err());
    }
}
