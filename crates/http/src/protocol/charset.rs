//! Text to body bytes for a named charset.
//!
//! Labels are resolved the WHATWG way through `encoding_rs`, so `utf8`,
//! `UTF-8` and ` utf-8 ` all name the same encoding, and `latin1` or
//! `iso-8859-1` name windows-1252. Encoding is strict: a character the
//! charset has no byte for fails instead of being replaced.

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};

use crate::ensure;
use crate::protocol::ResponseError;

pub(crate) fn encode(text: String, charset: &str) -> Result<Bytes, ResponseError> {
    let encoding = Encoding::for_label(charset.as_bytes()).ok_or_else(|| ResponseError::unknown_charset(charset))?;

    if encoding == UTF_8 {
        return Ok(Bytes::from(text));
    }

    let (bytes, _, had_errors) = encoding.encode(&text);
    ensure!(!had_errors, ResponseError::unencodable_content(charset));
    Ok(Bytes::from(bytes.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_passed_through() {
        let bytes = encode("héllo".to_string(), "utf-8").unwrap();
        assert_eq!(&bytes[..], "héllo".as_bytes());

        let bytes = encode("héllo".to_string(), "UTF8").unwrap();
        assert_eq!(&bytes[..], "héllo".as_bytes());
    }

    #[test]
    fn latin1() {
        let bytes = encode("café".to_string(), "latin1").unwrap();
        assert_eq!(&bytes[..], &[b'c', b'a', b'f', 0xE9][..]);
    }

    #[test]
    fn unknown_label() {
        let result = encode("hello".to_string(), "klingon");
        assert!(matches!(result, Err(ResponseError::UnknownCharset { charset }) if charset == "klingon"));
    }

    #[test]
    fn unrepresentable_character() {
        let result = encode("日本".to_string(), "iso-8859-1");
        assert!(matches!(result, Err(ResponseError::UnencodableContent { .. })));
    }
}
