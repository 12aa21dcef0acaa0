// ============================================================================
// HTTP TRANSPORT - the only place that touches the network
// ============================================================================
// ApiClient builds `HttpRequest`s and interprets `HttpResponse`s; the
// transport just moves bytes. Browser builds use gloo-net, native builds use
// reqwest, tests use `testing::MockTransport`.
// ============================================================================

use crate::models::Credential;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A single file sent as `multipart/form-data`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(FilePart),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<Credential>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn bearer(mut self, credential: &Credential) -> Self {
        self.bearer = Some(credential.clone());
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, part: FilePart) -> Self {
        self.body = RequestBody::Multipart(part);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

// ============================================================================
// BROWSER (gloo-net)
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use browser::GlooTransport;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::*;
    use futures::future::{self, Either};
    use gloo_net::http::Request;
    use gloo_timers::future::TimeoutFuture;
    use web_sys::{Blob, BlobPropertyBag, FormData};

    /// fetch-based transport. Each request races a timer when a timeout is set.
    #[derive(Clone, Debug, Default)]
    pub struct GlooTransport {
        timeout: Option<Duration>,
    }

    impl GlooTransport {
        pub fn new(timeout: Option<Duration>) -> Self {
            Self { timeout }
        }
    }

    fn form_data(part: &FilePart) -> Result<FormData, TransportError> {
        let js_err = |e: wasm_bindgen::JsValue| TransportError::InvalidRequest(format!("{:?}", e));

        let bytes = js_sys::Uint8Array::from(part.bytes.as_slice());
        let parts = js_sys::Array::of1(&bytes);
        let options = BlobPropertyBag::new();
        options.set_type(&part.mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_err)?;

        let form = FormData::new().map_err(js_err)?;
        form.append_with_blob_and_filename(&part.field, &blob, &part.file_name)
            .map_err(js_err)?;
        Ok(form)
    }

    async fn dispatch(request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
            Method::Put => Request::put(&request.url),
            Method::Delete => Request::delete(&request.url),
        };
        if let Some(credential) = &request.bearer {
            builder = builder.header("Authorization", &format!("Bearer {}", credential.as_str()));
        }

        let built = match &request.body {
            RequestBody::Empty => builder.build(),
            RequestBody::Json(value) => builder.json(value),
            // The browser sets the multipart boundary header itself
            RequestBody::Multipart(part) => builder.body(form_data(part)?),
        }
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let response = built
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .binary()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }

    #[async_trait(?Send)]
    impl HttpTransport for GlooTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let Some(timeout) = self.timeout else {
                return dispatch(request).await;
            };

            let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
            let work = Box::pin(dispatch(request));
            match future::select(work, TimeoutFuture::new(millis)).await {
                Either::Left((result, _)) => result,
                Either::Right(((), _)) => {
                    log::warn!("⏱️ [HTTP] Request aborted after {:?}", timeout);
                    Err(TransportError::Timeout(timeout))
                }
            }
        }
    }
}

// ============================================================================
// NATIVE (reqwest)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;

    #[derive(Clone, Debug)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
        timeout: Option<Duration>,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            let client = builder
                .build()
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            Ok(Self { client, timeout })
        }

        fn map_error(&self, err: reqwest::Error) -> TransportError {
            match self.timeout {
                Some(timeout) if err.is_timeout() => TransportError::Timeout(timeout),
                _ => TransportError::Network(err.to_string()),
            }
        }
    }

    #[async_trait(?Send)]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Delete => reqwest::Method::DELETE,
            };

            let mut builder = self.client.request(method, &request.url);
            if let Some(credential) = &request.bearer {
                builder = builder.bearer_auth(credential.as_str());
            }
            builder = match request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(&value),
                RequestBody::Multipart(part) => {
                    let file = reqwest::multipart::Part::bytes(part.bytes)
                        .file_name(part.file_name)
                        .mime_str(&part.mime)
                        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                    builder.multipart(reqwest::multipart::Form::new().part(part.field, file))
                }
            };

            let response = builder.send().await.map_err(|e| self.map_error(e))?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| self.map_error(e))?.to_vec();

            Ok(HttpResponse { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_bearer_and_body() {
        let credential = Credential::new("tok");
        let request = HttpRequest::new(Method::Post, "http://api/api/appointments")
            .bearer(&credential)
            .json(serde_json::json!({"doctor": "Dr. Lee"}));
        assert_eq!(request.bearer, Some(credential));
        assert_eq!(request.body, RequestBody::Json(serde_json::json!({"doctor": "Dr. Lee"})));
    }

    #[test]
    fn success_range() {
        let ok = HttpResponse { status: 204, body: Vec::new() };
        let missing = HttpResponse { status: 404, body: b"gone".to_vec() };
        assert!(ok.is_success());
        assert!(!missing.is_success());
        assert_eq!(missing.text(), "gone");
    }
}
