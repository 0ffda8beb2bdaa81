#![allow(dead_code)]

use async_trait::async_trait;
use loggly_sink::{DeliveryError, LogRecord, LogSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Semaphore};

/// Keeps every delivered batch together with the token it was sent with.
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<(String, Vec<LogRecord>)>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, records)| records.clone())
            .collect()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .map(|(token, _)| token.clone())
            .collect()
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn send_batch(&self, token: &str, records: &[LogRecord]) -> Result<(), DeliveryError> {
        self.batches
            .lock()
            .unwrap()
            .push((token.to_string(), records.to_vec()));
        Ok(())
    }
}

/// Fails every call and counts them.
#[derive(Default)]
pub struct FailingSink {
    pub calls: AtomicUsize,
}

#[async_trait]
impl LogSink for FailingSink {
    async fn send_batch(&self, _token: &str, _records: &[LogRecord]) -> Result<(), DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Network("connection refused".to_string()))
    }
}

/// Blocks each send until a permit is released, so tests can hold the
/// worker in place while they fill the queue.
pub struct GatedSink {
    pub gate: Semaphore,
    pub inner: RecordingSink,
    pub entered: AtomicUsize,
}

impl GatedSink {
    pub fn closed() -> Arc<Self> {
        Arc::new(GatedSink {
            gate: Semaphore::new(0),
            inner: RecordingSink::default(),
            entered: AtomicUsize::new(0),
        })
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl LogSink for GatedSink {
    async fn send_batch(&self, token: &str, records: &[LogRecord]) -> Result<(), DeliveryError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| DeliveryError::Other(e.to_string()))?;
        permit.forget();
        self.inner.send_batch(token, records).await
    }
}

/// One request seen by [`FakeCollector`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Minimal HTTP/1.1 server answering every request with a fixed status.
pub struct FakeCollector {
    pub base_url: String,
    pub requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl FakeCollector {
    pub async fn start(status: u16) -> FakeCollector {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(request) = read_request(&mut stream).await {
                        let _ = tx.send(request);
                    }
                    let response = format!(
                        "HTTP/1.1 {status} Status\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        FakeCollector {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0usize;
    let mut content_type = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().ok()?,
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        method,
        path,
        content_type,
        body,
    })
}
