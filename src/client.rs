use crate::{error::Error, options::SoapOptions};
use fisco_util::http::{HttpClient, HttpRequest, Transport, TransportError};
use fisco_wsdl::types::Definition;
use std::sync::Arc;
use tracing::debug;

/// A client built for exactly one call: the resolved transport, the
/// parsed WSDL metadata and the header fragments to write into the
/// request. Never cached or shared between calls.
pub struct Client {
    pub(crate) transport: Arc<dyn HttpClient>,
    pub(crate) definition: Definition,
    pub(crate) options: SoapOptions,
    pub(crate) soap_headers: Vec<String>,
}

/// Resolve the transport, fetch the WSDL document through it and parse
/// the service metadata. This is the first of the two suspension points
/// of a call; fetch and parse failures propagate unchanged.
pub async fn create_client(
    url: &str,
    options: SoapOptions,
    headers: Vec<String>,
) -> Result<Client, Error> {
    let transport: Arc<dyn HttpClient> = match &options.http_client {
        Some(client) => Arc::clone(client),
        None => Arc::new(Transport::new(&options.security, options.route.as_ref())?),
    };

    debug!(url, "fetching wsdl");

    let response = transport.request(HttpRequest::get(url)).await?;

    if !response.is_success() {
        return Err(Error::Transport(TransportError::Status {
            status: response.status,
            body: response.body,
        }));
    }

    let definition = fisco_wsdl::parse(response.body.as_bytes())?;

    Ok(Client {
        transport,
        definition,
        options,
        soap_headers: headers,
    })
}
