//! Decoding of Lua literal source text into values.
//!
//! Returning `None` means "leave the literal alone": callers treat an
//! undecodable literal as something to skip, never as an error.

use crate::tree::LuaNumber;

/// Decodes the full source text of a string literal (quotes or long brackets
/// included) into the bytes the Lua runtime would see.
pub fn decode_string(raw: &str) -> Option<Vec<u8>> {
    let bytes = raw.as_bytes();
    match bytes.first()? {
        b'"' | b'\'' => decode_quoted(bytes),
        b'[' => decode_long_bracket(bytes),
        _ => None,
    }
}

fn decode_long_bracket(bytes: &[u8]) -> Option<Vec<u8>> {
    let level = bytes[1..].iter().take_while(|&&b| b == b'=').count();
    let open = level + 2;
    if bytes.get(open - 1) != Some(&b'[') || bytes.len() < open * 2 {
        return None;
    }
    let close = bytes.len() - open;
    if bytes[close] != b']' || bytes[bytes.len() - 1] != b']' {
        return None;
    }

    let mut body = &bytes[open..close];
    // A newline right after the opening bracket is not part of the string.
    if body.starts_with(b"\r\n") || body.starts_with(b"\n\r") {
        body = &body[2..];
    } else if body.starts_with(b"\n") || body.starts_with(b"\r") {
        body = &body[1..];
    }
    Some(normalize_line_breaks(body))
}

/// Folds `\r\n`, `\n\r`, `\r` and `\n` into a single `\n`, as the Lua
/// lexer does inside long brackets.
fn normalize_line_breaks(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let b = body[i];
        i += 1;
        if b == b'\n' || b == b'\r' {
            if let Some(&next) = body.get(i)
                && (next == b'\n' || next == b'\r')
                && next != b
            {
                i += 1;
            }
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    out
}

fn decode_quoted(bytes: &[u8]) -> Option<Vec<u8>> {
    let quote = bytes[0];
    if bytes.len() < 2 || bytes[bytes.len() - 1] != quote {
        return None;
    }
    unescape(&bytes[1..bytes.len() - 1])
}

/// Applies Lua escape rules to the body of a quoted string.
pub fn unescape(body: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;

    while i < body.len() {
        let b = body[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let esc = *body.get(i + 1)?;
        i += 2;
        match esc {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'\\' | b'"' | b'\'' => out.push(esc),
            b'\n' | b'\r' => {
                out.push(b'\n');
                // "\<CR><LF>" and "\<LF><CR>" count as one line break
                if let Some(&next) = body.get(i)
                    && (next == b'\n' || next == b'\r')
                    && next != esc
                {
                    i += 1;
                }
            }
            b'x' => {
                let digits = body.get(i..i + 2)?;
                let text = std::str::from_utf8(digits).ok()?;
                out.push(u8::from_str_radix(text, 16).ok()?);
                i += 2;
            }
            b'z' => {
                while matches!(
                    body.get(i).copied(),
                    Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
                ) {
                    i += 1;
                }
            }
            b'u' => {
                if body.get(i) != Some(&b'{') {
                    return None;
                }
                let close = body[i..].iter().position(|&c| c == b'}')? + i;
                let text = std::str::from_utf8(&body[i + 1..close]).ok()?;
                let code = u32::from_str_radix(text, 16).ok()?;
                let ch = char::from_u32(code)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                i = close + 1;
            }
            b'0'..=b'9' => {
                let mut value = u32::from(esc - b'0');
                let mut taken = 1;
                while taken < 3 {
                    match body.get(i) {
                        Some(d) if d.is_ascii_digit() => {
                            value = value * 10 + u32::from(d - b'0');
                            i += 1;
                            taken += 1;
                        }
                        _ => break,
                    }
                }
                out.push(u8::try_from(value).ok()?);
            }
            _ => return None,
        }
    }

    Some(out)
}

/// Decodes the source text of a number literal.
pub fn decode_number(raw: &str) -> Option<LuaNumber> {
    let text = raw.trim();
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        if hex.contains(['.', 'p', 'P']) {
            // Hex floats are valid Lua but rare; skip them.
            return None;
        }
        let value = u64::from_str_radix(hex, 16).ok()?;
        return i64::try_from(value).ok().map(LuaNumber::Integer);
    }

    if text.contains(['.', 'e', 'E']) {
        return text.parse::<f64>().ok().map(LuaNumber::Float);
    }

    text.parse::<i64>().ok().map(LuaNumber::Integer)
}

/// Renders bytes as a Lua double-quoted string using only decimal escapes.
///
/// The result contains no identifier characters outside of the escapes, and
/// those are all digits.
pub fn decimal_escaped(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4 + 2);
    out.push('"');
    for b in bytes {
        out.push('\\');
        out.push_str(&b.to_string());
    }
    out.push('"');
    out
}
