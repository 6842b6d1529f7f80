use crate::{
    client::Client, config::LocationFormatter, error::Error, location::normalize_location,
};
use fisco_util::{
    http::{HttpClient, HttpRequest, TransportError},
    soap,
};
use fisco_wsdl::types::{BindingOperation, Definition, Port};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// What a completed exchange hands to the completion callback: the
/// decoded response record together with the raw transport body.
pub struct CallReply {
    pub body: Value,
    pub raw: String,
}

/// An operation bound to its normalized network location, ready to
/// perform the wire exchange.
pub struct BoundOperation {
    name: String,
    action: Option<String>,
    location: String,
    content_type: String,
    soap12: bool,
    escape_xml: bool,
    headers: Vec<String>,
    transport: Arc<dyn HttpClient>,
}

/// Locate the port whose binding exposes `method_name` and bind the
/// operation to that port's normalized location.
///
/// Services and ports are scanned in definition order and the first
/// match is authoritative; a WSDL exposing the same operation on several
/// ports is not treated as ambiguous.
pub fn resolve_method(
    client: &Client,
    method_name: &str,
    is_https: bool,
    hook: Option<&LocationFormatter>,
) -> Result<BoundOperation, Error> {
    let (port, operation) = find_operation(&client.definition, method_name)
        .ok_or_else(|| Error::MethodNotFound(method_name.to_owned()))?;

    let location = normalize_location(&port.location, is_https, hook);

    debug!(method = method_name, %location, "bound operation");

    Ok(BoundOperation {
        name: operation.name.clone(),
        action: operation.action.clone(),
        location,
        content_type: client.options.content_type.clone(),
        soap12: client.options.force_soap12_headers,
        escape_xml: client.options.escape_xml,
        headers: client.soap_headers.clone(),
        transport: Arc::clone(&client.transport),
    })
}

fn find_operation<'a>(
    definition: &'a Definition,
    method_name: &str,
) -> Option<(&'a Port, &'a BindingOperation)> {
    definition
        .services
        .iter()
        .flat_map(|service| service.ports.iter())
        .find_map(|port| {
            let binding = definition.binding(&port.binding)?;
            let operation = binding.operation(method_name)?;
            Some((port, operation))
        })
}

impl BoundOperation {
    /// Perform the wire exchange and deliver the outcome through
    /// `on_complete`. This is the collaborator's callback-style
    /// primitive; adapting it into a single awaited result is the
    /// caller's concern.
    pub async fn invoke<F>(&self, message: &Value, mut on_complete: F)
    where
        F: FnMut(Result<CallReply, Error>),
    {
        on_complete(self.dispatch(message).await);
    }

    async fn dispatch(&self, message: &Value) -> Result<CallReply, Error> {
        let envelope =
            soap::build_envelope(message, &self.headers, self.soap12, self.escape_xml)?;

        let mut request = HttpRequest::post(self.location.clone(), envelope)
            .header("Content-Type", self.content_type.clone());

        // SOAP 1.1 names the operation through the SOAPAction header;
        // SOAP 1.2 carries it inside the envelope.
        if !self.soap12 {
            if let Some(action) = &self.action {
                request = request.header("SOAPAction", format!("\"{}\"", action));
            }
        }

        debug!(method = %self.name, url = %self.location, "invoking operation");

        let response = self.transport.request(request).await?;

        match soap::decode_envelope(&response.body) {
            Ok(body) => Ok(CallReply {
                body,
                raw: response.body,
            }),

            Err(error) if response.is_success() => Err(error.into()),

            Err(..) => Err(TransportError::Status {
                status: response.status,
                body: response.body,
            }
            .into()),
        }
    }
}
