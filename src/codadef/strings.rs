// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! String helpers for codadef XML content (§4.6 C6, §9 design notes).
//!
//! The original implementation's XML entity decoder maps `&gt;` to `<`
//! instead of `>` in expression text embedded in attributes; this decoder
//! maps every standard entity to its correct character, since §9 calls that
//! out as a bug to fix rather than a behavior to preserve.

use crate::core::{CodaError, Result};

/// Decode the five predefined XML entities plus numeric character
/// references (`&#NN;`, `&#xHH;`) in `text`.
pub fn decode_xml_entities(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let mut entity = String::new();
        let mut terminated = false;
        for next in chars.by_ref() {
            if next == ';' {
                terminated = true;
                break;
            }
            entity.push(next);
            if entity.len() > 10 {
                break;
            }
        }
        if !terminated {
            return Err(CodaError::Xml { message: format!("unterminated entity reference '&{entity}'") });
        }
        let decoded = match entity.as_str() {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "apos" => '\'',
            "quot" => '"',
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                let code = u32::from_str_radix(&entity[2..], 16)
                    .map_err(|_| CodaError::Xml { message: format!("invalid hex character reference '&{entity};'") })?;
                char::from_u32(code).ok_or_else(|| CodaError::Xml { message: format!("invalid codepoint &{entity};") })?
            }
            _ if entity.starts_with('#') => {
                let code = entity[1..]
                    .parse::<u32>()
                    .map_err(|_| CodaError::Xml { message: format!("invalid decimal character reference '&{entity};'") })?;
                char::from_u32(code).ok_or_else(|| CodaError::Xml { message: format!("invalid codepoint &{entity};") })?
            }
            other => return Err(CodaError::Xml { message: format!("unknown entity reference '&{other};'") }),
        };
        out.push(decoded);
    }
    Ok(out)
}

/// Decode C-style backslash escapes (`\n \t \\ \" \'`) as used in
/// `FixedValue` text and expression string literals embedded in XML.
pub fn decode_c_escapes(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let next = *bytes.get(i + 1).ok_or_else(|| CodaError::invalid_format("trailing backslash in escaped text"))?;
        let decoded = match next {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'0' => 0u8,
            b'\\' => b'\\',
            b'"' => b'"',
            b'\'' => b'\'',
            other => return Err(CodaError::invalid_format(format!("unknown escape sequence '\\{}'", other as char))),
        };
        out.push(decoded);
        i += 2;
    }
    Ok(out)
}

/// Promote a filename-matching literal pattern (containing `*`/`?`
/// wildcards, as used by `MatchFilename`) into an anchored regex.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if "\\.+()|[]{}^$".contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_standard_entities_correctly() {
        assert_eq!(decode_xml_entities("a &lt; b &gt; c &amp; &apos;&quot;").unwrap(), "a < b > c & '\"");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_xml_entities("&#65;&#x42;").unwrap(), "AB");
    }

    #[test]
    fn rejects_unknown_entity() {
        assert!(decode_xml_entities("&bogus;").is_err());
    }

    #[test]
    fn decodes_c_escapes() {
        assert_eq!(decode_c_escapes("a\\nb\\t\\\\c").unwrap(), b"a\nb\t\\c");
    }

    #[test]
    fn wildcard_pattern_escapes_regex_metacharacters() {
        let re = wildcard_to_regex("MIP_*_1P.N1");
        assert_eq!(re, r"^MIP_.*_1P\.N1$");
    }
}
