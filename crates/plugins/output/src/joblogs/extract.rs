//! Plain text extraction from a rendered HTML line.

use thiserror::Error;

/// Longest reference name looked at before a `&` is treated as literal text.
const MAX_ENTITY_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unterminated tag at byte {0}")]
    UnterminatedTag(usize),

    #[error("invalid character reference &{0};")]
    InvalidCharacterReference(String),
}

/// Drop all markup from `html` and decode character references.
///
/// Unknown named entities and a bare `&` are kept literally.
pub fn html_to_text(html: &str) -> Result<String, ExtractError> {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find(['<', '&']) {
        text.push_str(&rest[..pos]);
        let offset = html.len() - rest.len() + pos;
        rest = &rest[pos..];

        if rest.starts_with('<') {
            let end = tag_end(rest).ok_or(ExtractError::UnterminatedTag(offset))?;
            rest = &rest[end + 1..];
        } else {
            let (decoded, consumed) = decode_entity(rest)?;
            text.push_str(&decoded);
            rest = &rest[consumed..];
        }
    }

    text.push_str(rest);
    Ok(text)
}

/// Byte index of the `>` closing the tag at the start of `s`, skipping quoted
/// attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, ch) in s.char_indices().skip(1) {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Decode the reference at the start of `s` (which begins with `&`).
/// Returns the replacement text and the number of bytes consumed.
fn decode_entity(s: &str) -> Result<(String, usize), ExtractError> {
    let literal = || Ok(("&".to_string(), 1));

    let Some(semi) = s[1..]
        .char_indices()
        .take(MAX_ENTITY_LEN + 1)
        .find(|&(_, c)| c == ';')
        .map(|(i, _)| i + 1)
    else {
        return literal();
    };

    let name = &s[1..semi];
    let consumed = semi + 1;

    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse::<u32>().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map(|c| (c.to_string(), consumed))
            .ok_or_else(|| ExtractError::InvalidCharacterReference(name.to_string()));
    }

    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        _ => return literal(),
    };
    Ok((decoded.to_string(), consumed))
}
