use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Expected {expected} for {param}, got {actual}")]
    InvalidParameter {
        param: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("A password is required to unlock the provided certificate")]
    MissingPassword,

    #[error("Invalid proxy address")]
    InvalidProxy(#[source] url::ParseError),

    #[error("Method {0:?} does not exist in the WSDL")]
    MethodNotFound(String),

    #[error("Error parsing the WSDL document")]
    Wsdl(#[from] fisco_wsdl::error::Error),

    #[error("Transport error")]
    Transport(#[from] fisco_util::http::TransportError),

    #[error("Error decoding the SOAP response")]
    Envelope(#[from] fisco_util::soap::EnvelopeError),

    #[error("The operation completed without producing a result")]
    MissingResult,
}
