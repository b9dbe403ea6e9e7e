use std::collections::HashMap;
use std::fmt::Display;
use std::fmt::Formatter;
use std::time::Duration;

use bytes::Bytes;
pub use http::HeaderName;
pub use http::header;
use reqwest::Method;
use reqwest::Url;
pub use reqwest::multipart;
use tracing::Instrument;
use tracing::debug;
use tracing::debug_span;

use crate::exception::CoreRsResult;

pub struct HttpClient {
    client: reqwest::Client,
}

pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<HeaderName, String>,
    body: Option<HttpBody>,
}

enum HttpBody {
    Text(String),
    Multipart(multipart::Form),
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: String) -> Self {
        HttpRequest {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn header(&mut self, name: HeaderName, value: impl Into<String>) {
        self.headers.insert(name, value.into());
    }

    pub fn body(&mut self, body: String, content_type: impl Into<String>) {
        self.body = Some(HttpBody::Text(body));
        self.headers.insert(header::CONTENT_TYPE, content_type.into());
    }

    /// content type and boundary are set by the client
    pub fn multipart(&mut self, form: multipart::Form) {
        self.body = Some(HttpBody::Multipart(form));
        self.headers.remove(&header::CONTENT_TYPE);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum HttpMethod {
    GET,
    POST,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => Method::GET,
            HttpMethod::POST => Method::POST,
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Method::from(*self).fmt(f)
    }
}

pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<HeaderName, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> CoreRsResult<&str> {
        Ok(std::str::from_utf8(&self.body)?)
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> CoreRsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(300))
            .connection_verbose(false)
            .build()?;
        Ok(HttpClient { client })
    }

    pub async fn execute(&self, request: HttpRequest) -> CoreRsResult<HttpResponse> {
        let span = debug_span!("http_client", url = %request.url, method = %request.method);
        async {
            debug!(method = %request.method, url = %request.url, "[request]");
            let url = Url::parse(&request.url)?;
            let mut builder = self.client.request(request.method.into(), url);
            for (key, value) in request.headers {
                if key == header::AUTHORIZATION {
                    debug!("[header] {key}=******");
                } else {
                    debug!("[header] {key}={value}");
                }
                builder = builder.header(key, value);
            }
            match request.body {
                Some(HttpBody::Text(body)) => {
                    debug!("[request] body={body}");
                    builder = builder.body(body);
                }
                Some(HttpBody::Multipart(form)) => {
                    debug!("[request] body=multipart");
                    builder = builder.multipart(form);
                }
                None => {}
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            debug!(status, "[response]");
            let mut headers = HashMap::new();
            for (key, value) in response.headers() {
                let value = value.to_str()?;
                debug!("[header] {key}={value}");
                headers.insert(key.to_owned(), value.to_owned());
            }

            let body = response.bytes().await?;
            if let Some(content_type) = headers.get(&header::CONTENT_TYPE)
                && (content_type.contains("json") || content_type.contains("text"))
            {
                debug!("[response] body={}", String::from_utf8_lossy(&body));
            } else {
                debug!("[response] body_length={}", body.len());
            }

            Ok(HttpResponse { status, headers, body })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;

    use super::HttpMethod;
    use super::HttpRequest;
    use super::HttpResponse;
    use super::header;

    #[test]
    fn body_sets_content_type() {
        let mut request = HttpRequest::new(HttpMethod::POST, "https://discord.test/api".to_owned());
        request.body("{}".to_owned(), "application/json");
        assert_eq!(
            request.headers.get(&header::CONTENT_TYPE).map(String::as_str),
            Some("application/json")
        );

        request.multipart(super::multipart::Form::new().text("payload_json", "{}"));
        assert!(!request.headers.contains_key(&header::CONTENT_TYPE));
    }

    #[test]
    fn response() {
        let response = HttpResponse {
            status: 204,
            headers: HashMap::new(),
            body: Bytes::from_static(b"ok"),
        };
        assert!(response.is_success());
        assert_eq!(response.text().unwrap(), "ok");

        let response = HttpResponse {
            status: 429,
            headers: HashMap::new(),
            body: Bytes::from_static(&[0xff, 0xfe]),
        };
        assert!(!response.is_success());
        assert!(response.text().is_err());
    }

    #[test]
    fn method_display() {
        assert_eq!(HttpMethod::POST.to_string(), "POST");
    }
}
