//! Communicate with WSDL-described SOAP services that authenticate
//! clients with a PKCS#12 certificate, the way Brazilian tax-authority
//! (SEFAZ) endpoints do.
//!
//! A single entry point, [`communicate`], hides the whole pipeline:
//! option building, WSDL fetch and parse, method and port resolution,
//! endpoint-location normalization and the wire exchange itself. One
//! call performs exactly one exchange; nothing is cached or shared
//! between calls.
//!
//! # Example
//!
//! ```ignore
//! use fisco::{communicate, Config, Response};
//! use serde_json::json;
//!
//! let config = Config {
//!     certificate: Some(std::fs::read("certificate.pfx")?),
//!     password: Some("passphrase".to_owned()),
//!     ..Config::default()
//! };
//!
//! let message = json!({
//!     "nfeDadosMsg": { "$xml": "<consStatServ versao=\"4.00\">...</consStatServ>" }
//! });
//!
//! let response = communicate(
//!     "https://nfe.fazenda.sp.gov.br/ws/NFeStatusServico4.asmx",
//!     "nfeStatusServicoNF",
//!     message,
//!     &config,
//! )
//! .await?;
//! ```

mod client;
mod location;
mod method;
mod validate;

pub mod config;
pub mod error;
pub mod options;

pub use config::{Config, LocationFormatter};
pub use error::Error;
pub use fisco_util::http::{
    HttpClient, HttpRequest, HttpResponse, Method, TransportError,
};

use method::CallReply;
use serde_json::Value;
use tokio::sync::oneshot;

/// What a call resolves with: the decoded response record, or the raw
/// transport body when the configuration asks for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Parsed(Value),
    Raw(String),
}

impl Response {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Response::Parsed(value) => Some(value),
            Response::Raw(..) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Response::Raw(raw) => Some(raw),
            Response::Parsed(..) => None,
        }
    }
}

/// Invoke `method_name` on the service described by the WSDL at `url`.
///
/// Validation happens before any network activity. The WSDL is then
/// fetched and parsed, the operation resolved against the service's
/// ports, the advertised location normalized, and the request
/// dispatched. Every failure along the way surfaces unchanged; there is
/// no retry and no fallback.
pub async fn communicate(
    url: &str,
    method_name: &str,
    message: Value,
    config: &Config,
) -> Result<Response, Error> {
    validate::validate(url, method_name, &message, config)?;

    let url = ensure_wsdl_marker(url);
    let is_https = config.is_https();
    let options = options::build_options(config);

    let client = client::create_client(&url, options, config.headers.clone()).await?;
    let operation =
        method::resolve_method(&client, method_name, is_https, config.format_location.as_ref())?;

    let (sender, receiver) = oneshot::channel();
    let mut sender = Some(sender);

    operation
        .invoke(&message, move |outcome| {
            // Only the first completion counts; any later invocation of
            // the callback is a no-op.
            if let Some(sender) = sender.take() {
                let _ = sender.send(outcome);
            }
        })
        .await;

    let reply: CallReply = receiver.await.map_err(|_| Error::MissingResult)??;

    if config.raw_response {
        Ok(Response::Raw(reply.raw))
    } else {
        Ok(Response::Parsed(reply.body))
    }
}

/// Append a `?wsdl` marker to the fetch URL unless its query already
/// carries one (`wsdl`, `WSDL` and ASP.NET's `singleWsdl` all count).
/// Idempotent on URLs that already name the document.
fn ensure_wsdl_marker(url: &str) -> String {
    match url.split_once('?') {
        Some((_, query)) if query.to_ascii_lowercase().contains("wsdl") => url.to_owned(),
        Some(..) => format!("{}&wsdl", url),
        None => format!("{}?wsdl", url),
    }
}
