use crate::{config::Config, error::Error};
use serde_json::Value;
use url::Url;

/// Reject malformed input before any network activity. Purely a gate:
/// checks the type system already discharges are not repeated here.
pub fn validate(
    url: &str,
    method_name: &str,
    message: &Value,
    config: &Config,
) -> Result<(), Error> {
    if url.is_empty() {
        return Err(Error::InvalidParameter {
            param: "url",
            expected: "an absolute http or https URL",
            actual: "an empty string".to_owned(),
        });
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::InvalidParameter {
            param: "url",
            expected: "an absolute http or https URL",
            actual: format!("{:?}", url),
        });
    }

    if method_name.is_empty() {
        return Err(Error::InvalidParameter {
            param: "methodName",
            expected: "an operation name",
            actual: "an empty string".to_owned(),
        });
    }

    if !message.is_object() {
        return Err(Error::InvalidParameter {
            param: "message",
            expected: "an object",
            actual: kind_of(message).to_owned(),
        });
    }

    if let Some(certificate) = &config.certificate {
        if certificate.is_empty() {
            return Err(Error::InvalidParameter {
                param: "certificate",
                expected: "PKCS#12 archive bytes",
                actual: "an empty buffer".to_owned(),
            });
        }

        if config.password.is_none() {
            return Err(Error::MissingPassword);
        }
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy).map_err(Error::InvalidProxy)?;
    }

    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(..) => "a boolean",
        Value::Number(..) => "a number",
        Value::String(..) => "a string",
        Value::Array(..) => "an array",
        Value::Object(..) => "an object",
    }
}
