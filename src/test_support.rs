//! Shared fixtures for unit tests: an in-memory transport and a tiny_http
//! stub server.

use crate::error::ScraperError;
use crate::fetcher::{FetchRequest, FetchResponse, Method, Transport};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::io::Read;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// In-memory [`Transport`] keyed by method and URL.
#[derive(Default)]
pub struct StubTransport {
    pages: HashMap<String, (u16, String)>,
    posts: HashMap<String, (u16, String)>,
    seen: Mutex<Vec<FetchRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), (200, html.to_string()));
        self
    }

    pub fn with_post(mut self, url: &str, status: u16, body: &str) -> Self {
        self.posts.insert(url.to_string(), (status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ScraperError> {
        self.seen.lock().unwrap().push(request.clone());

        let key = request.url.to_string();
        let route = match request.method {
            Method::Get => self.pages.get(&key),
            Method::PostForm(_) => self.posts.get(&key),
        };

        let Some((status, body)) = route else {
            return Err(ScraperError::Blocked {
                url: key,
                status: 404,
                reason: "Not Found".to_string(),
            });
        };

        if !(200..300).contains(status) {
            return Err(ScraperError::Blocked {
                url: key,
                status: *status,
                reason: "Stub failure".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        Ok(FetchResponse {
            status: *status,
            headers,
            body: body.clone().into_bytes(),
        })
    }
}

/// A request captured by [`StubServer`].
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

type Reply = (i32, Vec<(&'static str, &'static str)>, Vec<u8>);

/// Local HTTP server answering every request through a closure.
pub struct StubServer {
    pub base_url: String,
    captured: Arc<Mutex<Vec<Captured>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    pub fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&Captured) -> Reply + Send + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let seen = Captured {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|h| (h.field.to_string(), h.value.to_string()))
                        .collect(),
                    body,
                };

                let (status, headers, data) = handler(&seen);
                sink.lock().unwrap().push(seen);

                let mut response = tiny_http::Response::from_data(data).with_status_code(status);
                for (name, value) in headers {
                    let header = tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes())
                        .expect("valid header");
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            captured,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
