//! Percent-encoding for URL path segments.
//!
//! Follows the RFC 3986 unreserved set, which is also what AWS SigV4 expects
//! for canonical URIs: `A-Z a-z 0-9 - _ . ~` pass through, everything else is
//! `%XX` with uppercase hex.

/// Encode a string for use inside a URL path.
///
/// When `keep_slash` is set, `/` is left as-is so multi-segment object keys
/// keep their structure.
pub fn encode_path(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_vendor_symbols() {
        assert_eq!(encode_path("^GSPC", false), "%5EGSPC");
        assert_eq!(encode_path("GC=F", false), "GC%3DF");
        assert_eq!(encode_path("000001.SS", false), "000001.SS");
    }

    #[test]
    fn slash_handling() {
        assert_eq!(encode_path("macro/result 1.csv", true), "macro/result%201.csv");
        assert_eq!(encode_path("a/b", false), "a%2Fb");
    }

    #[test]
    fn encodes_multibyte_utf8_per_byte() {
        assert_eq!(encode_path("é", false), "%C3%A9");
    }
}
