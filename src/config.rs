use fisco_util::http::HttpClient;
use std::sync::Arc;

/// Override hook applied to the service location after the built-in
/// normalization. It receives the canonical location and the
/// authenticated-call flag; its return value is authoritative.
pub type LocationFormatter = Box<dyn Fn(&str, bool) -> String + Send + Sync>;

/// Per-call configuration. `Default` is the unauthenticated, all-default
/// configuration; set `certificate` and `password` together for endpoints
/// that require a client certificate.
#[derive(Default)]
pub struct Config {
    /// PKCS#12 container holding the client certificate and key.
    pub certificate: Option<Vec<u8>>,

    /// Passphrase unlocking the certificate. Required when a certificate
    /// is given.
    pub password: Option<String>,

    /// Raw SOAP header fragments, written into every request envelope in
    /// order.
    pub headers: Vec<String>,

    /// Custom transport. When set it carries both the WSDL fetch and the
    /// operation dispatch; TLS material is then the caller's concern.
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Escape XML special characters in request text content. Off by
    /// default: tax-authority payloads usually arrive pre-serialized.
    pub escape_xml: bool,

    /// Emit SOAP 1.2 envelope headers. Resolves to true when unset.
    pub force_soap12_headers: Option<bool>,

    /// Content-Type header value. Resolves to `application/soap+xml`
    /// when unset.
    pub content_type: Option<String>,

    /// Forward-proxy URL. Routing through a proxy brings a bounded
    /// request timeout with it.
    pub proxy: Option<String>,

    /// Endpoint override hook, applied after normalization.
    pub format_location: Option<LocationFormatter>,

    /// Resolve with the raw transport body instead of the decoded record.
    pub raw_response: bool,
}

impl Config {
    /// An authenticated invocation is one that can present the complete
    /// certificate material; it must also go out over https.
    pub(crate) fn is_https(&self) -> bool {
        self.certificate.is_some() && self.password.is_some()
    }
}
