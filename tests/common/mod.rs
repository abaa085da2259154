#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::DateTime;
use crl_monitor::{config::Config, crl::CrlMetrics, server::Server, telemetry};
use tokio::net::TcpListener;

// Helper function to spawn the metrics server on a random port
pub async fn spawn_server(metrics: Arc<CrlMetrics>) -> String {
    telemetry::init_tracing();

    let config = {
        let mut config = Config::load().unwrap();
        config.server.host = "127.0.0.1".to_string();
        // Use a random OS port
        config.server.port = 0;
        config
    };

    let server = Server::new(metrics, &config.server).await.unwrap();

    let port = server.port();
    tokio::spawn(server.run());

    format!("http://{}:{}", config.server.host, port)
}

struct Published {
    body: Vec<u8>,
    status: StatusCode,
    delay: Duration,
}

/// Stand-in for a CRL distribution point, serving `/crl`
#[derive(Clone)]
pub struct CrlEndpoint {
    published: Arc<Mutex<Published>>,
}

impl CrlEndpoint {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            published: Arc::new(Mutex::new(Published {
                body,
                status: StatusCode::OK,
                delay: Duration::ZERO,
            })),
        }
    }

    pub fn set_body(&self, body: Vec<u8>) {
        self.published.lock().unwrap().body = body;
    }

    pub fn set_status(&self, status: StatusCode) {
        self.published.lock().unwrap().status = status;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.published.lock().unwrap().delay = delay;
    }

    /// Serve on a random port and return the CRL URL
    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/crl", get(serve_crl))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://127.0.0.1:{port}/crl")
    }
}

async fn serve_crl(State(endpoint): State<CrlEndpoint>) -> (StatusCode, Vec<u8>) {
    let (body, status, delay) = {
        let published = endpoint.published.lock().unwrap();
        (published.body.clone(), published.status, published.delay)
    };
    tokio::time::sleep(delay).await;
    (status, body)
}

pub async fn scrape(addr: &str) -> String {
    reqwest::get(format!("{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

pub fn write_config(path: &Path, urls: &[&str]) {
    if urls.is_empty() {
        std::fs::write(path, "crls: []\n").unwrap();
        return;
    }
    let mut document = String::from("crls:\n");
    for url in urls {
        document.push_str(&format!("  - \"{url}\"\n"));
    }
    std::fs::write(path, document).unwrap();
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

fn utc_time(timestamp: i64) -> Vec<u8> {
    let time = DateTime::from_timestamp(timestamp, 0).unwrap();
    tlv(0x17, time.format("%y%m%d%H%M%SZ").to_string().as_bytes())
}

/// Minimal unsigned DER CRL with the given `thisUpdate` and `nextUpdate`
pub fn crl_der(this_update: i64, next_update: i64) -> Vec<u8> {
    // sha256WithRSAEncryption
    let oid = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];
    let algorithm = tlv(0x30, &[tlv(0x06, &oid), vec![0x05, 0x00]].concat());
    let common_name = tlv(
        0x30,
        &[tlv(0x06, &[0x55, 0x04, 0x03]), tlv(0x0c, b"Test CA")].concat(),
    );
    let issuer = tlv(0x30, &tlv(0x31, &common_name));

    let tbs = [
        tlv(0x02, &[0x01]),
        algorithm.clone(),
        issuer,
        utc_time(this_update),
        utc_time(next_update),
    ]
    .concat();

    tlv(
        0x30,
        &[tlv(0x30, &tbs), algorithm, tlv(0x03, &[0x00, 0x00])].concat(),
    )
}

/// Poll `condition` until it holds or a few seconds have passed
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}
