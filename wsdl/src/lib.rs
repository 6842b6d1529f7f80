//! Parsing of WSDL service metadata into a typed, immutable model.
//!
//! Only the subset a client needs to dispatch an operation is kept:
//! bindings with their operations (and `soapAction`), and services with
//! their ports and network locations. Schema and message sections are
//! skipped entirely.

mod parser;

pub mod error;
pub mod types;

/// Parse a WSDL document into a [`types::Definition`].
///
/// The document is parsed as a single file; `wsdl:import` chasing is not
/// performed. Definition order of services, ports and operations is
/// preserved.
pub fn parse(document: &[u8]) -> Result<types::Definition, error::Error> {
    parser::parse(document)
}
