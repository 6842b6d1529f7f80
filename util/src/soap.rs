//! SOAP envelope construction and decoding.
//!
//! Faults are decoded like any other body child and surfaced as response
//! data, so callers always see what the server said instead of a bare
//! transport failure.

use quick_xml::{
    events::{BytesDecl, BytesStart, BytesText, Event},
    Reader, Writer,
};
use serde_json::Value;
use std::io::Cursor;
use thiserror::Error;

use crate::xml;

/// SOAP 1.1 envelope namespace.
pub const SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.2 envelope namespace.
pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Envelope is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Response is not a SOAP envelope")]
    NotAnEnvelope,
}

/// Build a request envelope around `message`, with the raw `headers`
/// fragments written in order inside the envelope header.
pub fn build_envelope(
    message: &Value,
    headers: &[String],
    soap12: bool,
    escape_xml: bool,
) -> Result<String, EnvelopeError> {
    let namespace = if soap12 {
        SOAP12_NAMESPACE
    } else {
        SOAP11_NAMESPACE
    };

    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let envelope =
        BytesStart::owned_name("soapenv:Envelope").with_attributes([("xmlns:soapenv", namespace)]);
    let header = BytesStart::owned_name("soapenv:Header");
    let body = BytesStart::owned_name("soapenv:Body");

    writer.write_event(Event::Decl(BytesDecl::new(b"1.0", Some(b"utf-8"), None)))?;
    writer.write_event(Event::Start(envelope.to_borrowed()))?;

    writer.write_event(Event::Start(header.to_borrowed()))?;

    for fragment in headers {
        writer.write_event(Event::Text(BytesText::from_escaped_str(fragment.as_str())))?;
    }

    writer.write_event(Event::End(header.to_end()))?;

    writer.write_event(Event::Start(body.to_borrowed()))?;
    xml::write_value(&mut writer, message, escape_xml)?;
    writer.write_event(Event::End(body.to_end()))?;

    writer.write_event(Event::End(envelope.to_end()))?;

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Decode a response envelope into a record keyed by the body child's
/// local name, e.g. `{"nfeResultMsg": {...}}` or `{"Fault": {...}}`.
///
/// An empty body decodes to null. Anything that is not an envelope at
/// all (an HTML error page, plain text) is rejected.
pub fn decode_envelope(document: &str) -> Result<Value, EnvelopeError> {
    let mut reader = Reader::from_reader(document.as_bytes());
    reader.trim_text(true);

    let mut buffer = Vec::new();
    let mut in_envelope = false;
    let mut in_body = false;

    loop {
        match reader.read_event(&mut buffer)? {
            Event::Start(start) => {
                let name = reader.decode(start.name())?;
                let name = local_name(name).to_owned();

                if !in_envelope {
                    if name != "Envelope" {
                        return Err(EnvelopeError::NotAnEnvelope);
                    }

                    in_envelope = true;
                } else if !in_body {
                    if name == "Body" {
                        in_body = true;
                    } else {
                        // Skip over the response header subtree.
                        let end = start.name().to_owned();
                        reader.read_to_end(end, &mut Vec::new())?;
                    }
                } else {
                    let content = xml::read_value(&mut reader, &mut buffer)?;

                    let mut wrapped = serde_json::Map::new();
                    wrapped.insert(name, content);

                    return Ok(Value::Object(wrapped));
                }
            }

            Event::Empty(start) => {
                let name = reader.decode(start.name())?;

                if in_envelope && local_name(name) == "Body" {
                    return Ok(Value::Null);
                }
            }

            Event::End(..) => {
                if in_body {
                    // The body closed without any child element.
                    return Ok(Value::Null);
                }
            }

            Event::Eof => return Err(EnvelopeError::NotAnEnvelope),

            _ => (),
        }

        buffer.clear();
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
