use crate::config::Config;
use fisco_util::http::{HttpClient, ProxyRoute, SecurityMaterial};
use std::sync::Arc;
use std::time::Duration;

/// Content type used when the configuration does not override it.
pub const DEFAULT_CONTENT_TYPE: &str = "application/soap+xml";

/// Request timeout applied when routing through a forward proxy.
const PROXY_TIMEOUT: Duration = Duration::from_secs(20);

/// The option record handed to the toolkit layer. Built once per call.
pub struct SoapOptions {
    pub escape_xml: bool,
    /// Always true: faults are decoded and surfaced as response data.
    pub return_fault: bool,
    /// Always true: WSDL metadata is fetched fresh on every call.
    pub disable_cache: bool,
    pub force_soap12_headers: bool,
    pub content_type: String,
    pub security: SecurityMaterial,
    pub route: Option<ProxyRoute>,
    pub http_client: Option<Arc<dyn HttpClient>>,
}

/// Map the user configuration onto toolkit options. Pure; no I/O.
pub fn build_options(config: &Config) -> SoapOptions {
    SoapOptions {
        escape_xml: config.escape_xml,
        return_fault: true,
        disable_cache: true,
        force_soap12_headers: config.force_soap12_headers.unwrap_or(true),
        content_type: config
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
        security: SecurityMaterial {
            credential: config.certificate.clone(),
            passphrase: config.password.clone(),
        },
        route: config.proxy.clone().map(|url| ProxyRoute {
            url,
            timeout: PROXY_TIMEOUT,
        }),
        http_client: config.http_client.clone(),
    }
}
