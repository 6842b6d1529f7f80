//! Conversion between structured records ([`serde_json::Value`] objects)
//! and XML element content.
//!
//! Field order is preserved on the way out. A `"$xml"` field injects its
//! string value verbatim as inner XML, which is how pre-serialized
//! payloads are carried.

use quick_xml::{
    events::{BytesStart, BytesText, Event},
    Reader, Writer,
};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};

/// Key whose string value is written verbatim as the element's inner XML.
pub const RAW_XML_KEY: &str = "$xml";

/// Write a record as the content of the current element. Escaping of text
/// content is controlled by `escape`; raw `$xml` fragments are never
/// escaped.
pub fn write_value<W: Write>(
    writer: &mut Writer<W>,
    value: &Value,
    escape: bool,
) -> Result<(), quick_xml::Error> {
    match value {
        Value::Object(fields) => {
            for (name, value) in fields {
                if name == RAW_XML_KEY {
                    if let Value::String(raw) = value {
                        writer
                            .write_event(Event::Text(BytesText::from_escaped_str(raw.as_str())))?;
                    }

                    continue;
                }

                write_element(writer, name, value, escape)?;
            }

            Ok(())
        }

        other => write_text(writer, other, escape),
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
    escape: bool,
) -> Result<(), quick_xml::Error> {
    // An array repeats the element once per item rather than nesting.
    if let Value::Array(items) = value {
        for item in items {
            write_element(writer, name, item, escape)?;
        }

        return Ok(());
    }

    let start = BytesStart::owned_name(name);

    writer.write_event(Event::Start(start.to_borrowed()))?;
    write_value(writer, value, escape)?;
    writer.write_event(Event::End(start.to_end()))?;

    Ok(())
}

fn write_text<W: Write>(
    writer: &mut Writer<W>,
    value: &Value,
    escape: bool,
) -> Result<(), quick_xml::Error> {
    let text = match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };

    let event = if escape {
        BytesText::from_plain_str(&text)
    } else {
        BytesText::from_escaped_str(text.as_str())
    };

    writer.write_event(Event::Text(event))
}

/// Decode the content of the element whose start tag was just consumed.
///
/// Text-only content becomes a string, child elements become an object
/// keyed by local name (repeated siblings collect into an array), empty
/// content becomes an empty string.
pub fn read_value<B: BufRead>(
    reader: &mut Reader<B>,
    buffer: &mut Vec<u8>,
) -> Result<Value, quick_xml::Error> {
    let mut fields = Map::new();
    let mut text = String::new();

    loop {
        match reader.read_event(buffer)? {
            Event::Start(start) => {
                let name = local_name(reader.decode(start.name())?).to_owned();
                let value = read_value(reader, buffer)?;
                insert_field(&mut fields, name, value);
            }

            Event::Empty(start) => {
                let name = local_name(reader.decode(start.name())?).to_owned();
                insert_field(&mut fields, name, Value::String(String::new()));
            }

            Event::Text(event) => {
                let unescaped = event.unescaped()?;
                text.push_str(reader.decode(unescaped.as_ref())?);
            }

            Event::CData(event) => {
                text.push_str(reader.decode(event.escaped())?);
            }

            Event::End(..) | Event::Eof => break,

            _ => (),
        }
    }

    if fields.is_empty() {
        Ok(Value::String(text))
    } else {
        Ok(Value::Object(fields))
    }
}

fn insert_field(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),

        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }

        None => {
            fields.insert(name, value);
        }
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
