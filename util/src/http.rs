//! The HTTP transport seam.
//!
//! [`HttpClient`] is the capability contract a pluggable transport must
//! satisfy; [`Transport`] is the default implementation. The contract is
//! structural: anything that can perform one request/response exchange
//! qualifies.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("Server answered status {status} with a body that is not a SOAP envelope")]
    Status { status: u16, body: String },
}

/// Client-certificate material for mutual TLS. The record is handed to
/// the transport verbatim; the identity is only attached when both parts
/// are present.
#[derive(Default, Clone)]
pub struct SecurityMaterial {
    pub credential: Option<Vec<u8>>,
    pub passphrase: Option<String>,
}

/// A forward-proxy route together with the bounded request timeout that
/// applies while routing through it.
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability contract for transports: perform a single HTTP exchange.
///
/// Both the WSDL fetch and the operation dispatch go through this trait,
/// so a custom implementation sees every request a call makes.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// The default transport, backed by a dedicated reqwest client.
pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    /// Build a transport from the security material and optional proxy
    /// route. A PKCS#12 identity is attached when credential and
    /// passphrase are both present; a proxy route brings its bounded
    /// timeout and TCP keep-alive with it.
    pub fn new(
        security: &SecurityMaterial,
        route: Option<&ProxyRoute>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();

        if let (Some(credential), Some(passphrase)) = (&security.credential, &security.passphrase)
        {
            let identity = reqwest::Identity::from_pkcs12_der(credential, passphrase)?;
            builder = builder.identity(identity);
        }

        if let Some(route) = route {
            builder = builder
                .proxy(reqwest::Proxy::all(route.url.as_str())?)
                .timeout(route.timeout)
                .tcp_keepalive(Duration::from_secs(60));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl HttpClient for Transport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(url = %request.url, method = ?request.method, "dispatching request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_builds_without_material() {
        assert!(Transport::new(&SecurityMaterial::default(), None).is_ok());
    }

    #[test]
    fn proxy_route_with_a_bad_url_is_rejected() {
        let route = ProxyRoute {
            url: "not a proxy".to_owned(),
            timeout: Duration::from_secs(20),
        };

        assert!(Transport::new(&SecurityMaterial::default(), Some(&route)).is_err());
    }

    #[test]
    fn garbage_credential_is_rejected() {
        let security = SecurityMaterial {
            credential: Some(vec![0x13, 0x37]),
            passphrase: Some("secret".to_owned()),
        };

        assert!(Transport::new(&security, None).is_err());
    }

    #[test]
    fn request_builders_carry_headers_in_order() {
        let request = HttpRequest::post("http://example.com", "<xml/>")
            .header("Content-Type", "application/soap+xml")
            .header("SOAPAction", "\"urn:op\"");

        assert_eq!(request.headers[0].0, "Content-Type");
        assert_eq!(request.headers[1].0, "SOAPAction");
        assert_eq!(request.body.as_deref(), Some("<xml/>"));
    }
}
