use std::io;

use serde::{ser::Error as _, Serialize};
use serde_json::ser::{Formatter, Serializer};

use crate::Result;

/// Configures JSON encoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodeOptions {
    /// Escape `&`, `<`, `>`, U+2028 and U+2029 inside string literals so the
    /// output can be embedded in HTML.
    pub escape_html: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { escape_html: true }
    }
}

/// Compact formatter that additionally escapes HTML-significant characters.
#[derive(Clone, Copy, Debug, Default)]
struct HtmlEscapeFormatter;

impl Formatter for HtmlEscapeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            let escaped = match ch {
                '&' => "\\u0026",
                '<' => "\\u003c",
                '>' => "\\u003e",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..index].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Encodes `value` as compact JSON with HTML escaping enabled.
pub fn to_json<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    to_json_with(value, &EncodeOptions::default())
}

/// Encodes `value` as a compact JSON string with HTML escaping enabled.
pub fn to_json_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let bytes = to_json(value)?;
    String::from_utf8(bytes).map_err(|err| serde_json::Error::custom(err).into())
}

/// Encodes `value` as compact JSON using `options`.
pub fn to_json_with<T>(value: &T, options: &EncodeOptions) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut out = Vec::with_capacity(128);
    if options.escape_html {
        let mut serializer = Serializer::with_formatter(&mut out, HtmlEscapeFormatter);
        value.serialize(&mut serializer)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    Ok(out)
}
