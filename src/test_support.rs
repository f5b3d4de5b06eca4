// src/test_support.rs
// Throwaway HTTP server that answers every request with one canned response.
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, http::StatusCode, web};
use base64::{Engine as _, engine::general_purpose};
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }
}

#[derive(Clone)]
struct MockState {
    status: u16,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    /// Must be called from inside an actix system, e.g. `#[actix_web::test]`.
    pub fn start(status: u16, body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock listener");
        let port = listener.local_addr().expect("mock listener address").port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body: body.into(),
            requests: requests.clone(),
        };

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .default_service(web::to(record))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("listen on mock listener")
        .run();
        actix_web::rt::spawn(server);

        MockServer {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::start(status, body.to_string())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("mock requests lock").clone()
    }
}

async fn record(req: HttpRequest, body: web::Bytes, state: web::Data<MockState>) -> HttpResponse {
    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    state
        .requests
        .lock()
        .expect("mock requests lock")
        .push(RecordedRequest {
            method: req.method().to_string(),
            path: req.path().to_string(),
            query: req.query_string().to_string(),
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        });

    HttpResponse::build(StatusCode::from_u16(state.status).expect("valid mock status"))
        .content_type("application/json")
        .body(state.body.clone())
}

/// Deterministic noisy gradient, close enough to photographic content for
/// JPEG to beat PNG by a wide margin.
pub fn sample_image(width: u32, height: u32) -> RgbImage {
    let mut seed: u32 = 0x9e37_79b9;
    RgbImage::from_fn(width, height, |x, y| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let noise = (seed % 24) as u8;
        let r = ((x * 255 / width.max(1)) as u8).saturating_add(noise);
        let g = ((y * 255 / height.max(1)) as u8).saturating_add(noise / 2);
        let b = (((x + y) * 127 / (width + height).max(1)) as u8).saturating_add(noise);
        Rgb([r, g, b])
    })
}

pub fn sample_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut output = Vec::new();
    sample_image(width, height)
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .expect("encode sample png");
    output
}

pub fn sample_png_base64(width: u32, height: u32) -> String {
    general_purpose::STANDARD.encode(sample_png_bytes(width, height))
}
