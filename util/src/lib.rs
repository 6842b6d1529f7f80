//! Toolkit layer driven by the communicator crate: the HTTP transport
//! seam, SOAP envelope construction and decoding, and conversion between
//! structured records and XML.

pub mod http;
pub mod soap;
pub mod xml;
