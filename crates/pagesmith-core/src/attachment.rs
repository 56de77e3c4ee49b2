use crate::error::{PagesmithError, Result};
use crate::types::Attachment;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// An attachment after its payload has been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttachment {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DecodedAttachment {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

fn data_uri_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^data:([^;,]*)((?:;[^;,]+)*?);base64,(.*)$").expect("valid regex")
    })
}

/// Split a `data:<mime>[;params];base64,<payload>` URI into mime type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let caps = data_uri_re().captures(uri.trim()).ok_or_else(|| {
        PagesmithError::Generation("attachment url is not a base64 data URI".to_string())
    })?;
    let mime = match caps.get(1).map(|m| m.as_str()) {
        Some("") | None => "application/octet-stream".to_string(),
        Some(m) => m.to_ascii_lowercase(),
    };
    let payload: String = caps[3].chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| PagesmithError::Generation(format!("invalid base64 payload: {e}")))?;
    Ok((mime, bytes))
}

fn check_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.chars().any(char::is_control);
    if bad {
        return Err(PagesmithError::Generation(format!(
            "invalid attachment name '{name}'"
        )));
    }
    Ok(())
}

/// Decode every attachment in request order.
///
/// Inline strings become `attachment-<n>.txt` where `n` is the 1-based
/// position in the request.
pub fn decode_all(attachments: &[Attachment]) -> Result<Vec<DecodedAttachment>> {
    let mut seen = HashSet::new();
    let mut decoded = Vec::with_capacity(attachments.len());

    for (i, attachment) in attachments.iter().enumerate() {
        let item = match attachment {
            Attachment::Inline(text) => DecodedAttachment {
                name: format!("attachment-{}.txt", i + 1),
                mime: "text/plain".to_string(),
                bytes: text.as_bytes().to_vec(),
            },
            Attachment::File { name, url } => {
                let name = name.trim();
                check_name(name)?;
                let (mime, bytes) = decode_data_uri(url)?;
                DecodedAttachment {
                    name: name.to_string(),
                    mime,
                    bytes,
                }
            }
        };
        if !seen.insert(item.name.clone()) {
            return Err(PagesmithError::Generation(format!(
                "duplicate attachment name '{}'",
                item.name
            )));
        }
        decoded.push(item);
    }

    Ok(decoded)
}
