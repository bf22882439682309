use serde_json::Value;

/// Decodes a Move `vector<u8>` as returned by a view call into text.
///
/// The node may hand the vector back as a `0x`-prefixed hex string, as an
/// array of byte values, or already as plain text. Absent values, values of
/// any other shape, and bytes that are not valid UTF-8 all produce
/// `default`; an empty decode result does too.
pub fn decode_byte_vector(value: Option<&Value>, default: &str) -> String {
    let decoded = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => match text.strip_prefix("0x") {
            Some(hex_part) => hex_bytes(hex_part).and_then(utf8_text),
            None => Some(text.clone()),
        },
        Some(Value::Array(items)) => array_bytes(items).and_then(utf8_text),
        Some(_) => None,
    };

    match decoded {
        Some(text) if !text.is_empty() => text,
        _ => {
            tracing::trace!(?value, default, "byte vector not decodable, using default");
            default.to_string()
        }
    }
}

/// `0x`-prefixed lowercase hex of `bytes`.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parses the hex digits after the `0x` prefix. Odd lengths are rejected.
pub fn hex_bytes(hex_part: &str) -> Option<Vec<u8>> {
    if hex_part.len() % 2 != 0 {
        return None;
    }
    hex::decode(hex_part).ok()
}

fn array_bytes(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

fn utf8_text(bytes: Vec<u8>) -> Option<String> {
    String::from_utf8(bytes).ok()
}
