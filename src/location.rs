use crate::config::LocationFormatter;

/// Normalize the network address a WSDL port advertises.
///
/// The explicit default port is stripped first and the scheme upgraded
/// second, so an override hook always sees the canonical form. The hook
/// runs last and its return value is authoritative.
pub fn normalize_location(
    raw: &str,
    is_https: bool,
    hook: Option<&LocationFormatter>,
) -> String {
    let mut location = strip_default_port(raw);

    if is_https {
        if let Some(rest) = location.strip_prefix("http://") {
            location = format!("https://{}", rest);
        }
    }

    match hook {
        Some(hook) => hook(&location, is_https),
        None => location,
    }
}

/// Remove an explicit `:80` at the end of the authority component. Other
/// ports, and `80` digits appearing elsewhere, are left untouched.
fn strip_default_port(location: &str) -> String {
    let authority_start = location.find("://").map(|index| index + 3).unwrap_or(0);
    let authority_end = location[authority_start..]
        .find('/')
        .map(|index| authority_start + index)
        .unwrap_or(location.len());

    let (authority, path) = location.split_at(authority_end);

    match authority.strip_suffix(":80") {
        Some(stripped) => format!("{}{}", stripped, path),
        None => location.to_owned(),
    }
}
