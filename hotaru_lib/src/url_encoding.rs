use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters that must survive unescaped in a URL path segment.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters that must survive unescaped in a query string component.
const QUERY_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes a single path segment.
pub fn encode_path(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SAFE).to_string()
}

/// Percent-encodes a query string key or value.
pub fn encode_query(component: &str) -> String {
    utf8_percent_encode(component, QUERY_SAFE).to_string()
}

/// Percent-decodes a URL component, lossily substituting invalid UTF-8.
pub fn decode(component: &str) -> String {
    percent_decode_str(component).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_reserved_characters() {
        let raw = "a b/c?d=e&f";
        let encoded = encode_query(raw);
        assert_eq!(decode(&encoded), raw);
    }

    #[test]
    fn path_encoding_preserves_slashes() {
        assert_eq!(encode_path("a/b c"), "a/b%20c");
    }
}
