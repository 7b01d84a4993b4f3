//! Syntax gate for ICU MessageFormat text.
//!
//! The extractor treats this module as an opaque validate-and-normalize
//! step: `validate` either hands the message back unchanged or reports a
//! structured error with a byte offset. Nothing here interprets plural
//! rules or formats values.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct IcuError {
    pub message: String,
    pub offset: usize,
}

impl IcuError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Validate `message` against the ICU message grammar. On success the
/// message is returned unchanged (its round-trip form).
pub fn validate(message: &str) -> Result<&str, IcuError> {
    let mut cursor = Cursor::new(message);
    parse_message(&mut cursor, false)?;
    match cursor.peek() {
        None => Ok(message),
        // parse_message only stops early on a brace it did not open
        Some(_) => Err(IcuError::new("unmatched '}' in message text", cursor.pos)),
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat_whitespace(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_whitespace()) {
            self.bump();
        }
    }

    fn eat_word(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        &self.src[start..self.pos]
    }
}

/// Consume message text up to end-of-input or an unconsumed `}` belonging
/// to the enclosing argument.
fn parse_message(cursor: &mut Cursor, in_plural: bool) -> Result<(), IcuError> {
    while let Some(ch) = cursor.peek() {
        match ch {
            '{' => parse_argument(cursor)?,
            '}' => return Ok(()),
            '\'' => skip_quoted(cursor, in_plural),
            _ => {
                cursor.bump();
            }
        }
    }
    Ok(())
}

/// Apostrophe handling: `''` is a literal quote; a quote before a syntax
/// character opens a quoted literal that runs to the next single quote.
fn skip_quoted(cursor: &mut Cursor, in_plural: bool) {
    cursor.bump();
    match cursor.peek() {
        Some('\'') => {
            cursor.bump();
        }
        Some('{') | Some('}') => skip_quoted_literal(cursor),
        Some('#') if in_plural => skip_quoted_literal(cursor),
        _ => {}
    }
}

fn skip_quoted_literal(cursor: &mut Cursor) {
    while let Some(ch) = cursor.bump() {
        if ch == '\'' {
            if cursor.peek() == Some('\'') {
                cursor.bump();
            } else {
                return;
            }
        }
    }
}

fn parse_argument(cursor: &mut Cursor) -> Result<(), IcuError> {
    cursor.bump();
    cursor.eat_whitespace();

    let name_offset = cursor.pos;
    let name = cursor.eat_word();
    if name.is_empty() {
        return Err(IcuError::new("expected argument name", name_offset));
    }
    cursor.eat_whitespace();

    match cursor.bump() {
        Some('}') => Ok(()),
        Some(',') => {
            cursor.eat_whitespace();
            let type_offset = cursor.pos;
            let arg_type = cursor.eat_word().to_string();
            cursor.eat_whitespace();
            match arg_type.as_str() {
                "number" | "date" | "time" => parse_simple_style(cursor),
                "plural" | "selectordinal" => parse_options(cursor, true),
                "select" => parse_options(cursor, false),
                "" => Err(IcuError::new("expected argument type", type_offset)),
                other => Err(IcuError::new(
                    format!("invalid argument type \"{}\"", other),
                    type_offset,
                )),
            }
        }
        Some(_) => Err(IcuError::new(
            "expected ',' or '}' after argument name",
            cursor.pos - 1,
        )),
        None => Err(IcuError::new("unexpected end of message", cursor.pos)),
    }
}

/// Optional `, style` tail of number/date/time arguments. The style text is
/// free-form up to the argument's closing brace.
fn parse_simple_style(cursor: &mut Cursor) -> Result<(), IcuError> {
    match cursor.bump() {
        Some('}') => Ok(()),
        Some(',') => {
            cursor.eat_whitespace();
            let style_offset = cursor.pos;
            let mut depth = 1usize;
            let mut empty = true;
            while let Some(ch) = cursor.peek() {
                match ch {
                    '\'' => {
                        skip_quoted(cursor, false);
                        empty = false;
                        continue;
                    }
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            if empty {
                                return Err(IcuError::new("expected argument style", style_offset));
                            }
                            cursor.bump();
                            return Ok(());
                        }
                    }
                    _ => {}
                }
                if !ch.is_whitespace() {
                    empty = false;
                }
                cursor.bump();
            }
            Err(IcuError::new("unexpected end of message", cursor.pos))
        }
        Some(_) => Err(IcuError::new(
            "expected ',' or '}' after argument type",
            cursor.pos - 1,
        )),
        None => Err(IcuError::new("unexpected end of message", cursor.pos)),
    }
}

/// Branch list of plural/selectordinal/select arguments. Plural kinds allow
/// a leading `offset:n` and `=n` selectors; every kind requires an `other`
/// branch.
fn parse_options(cursor: &mut Cursor, plural: bool) -> Result<(), IcuError> {
    cursor.eat_whitespace();

    if plural && cursor.src[cursor.pos..].starts_with("offset") {
        let checkpoint = cursor.pos;
        cursor.eat_word();
        cursor.eat_whitespace();
        if cursor.peek() == Some(':') {
            cursor.bump();
            cursor.eat_whitespace();
            let digits_offset = cursor.pos;
            if cursor.eat_word().parse::<u64>().is_err() {
                return Err(IcuError::new("expected number after offset:", digits_offset));
            }
        } else {
            // "offset" was a plain selector after all
            cursor.pos = checkpoint;
        }
        cursor.eat_whitespace();
    }

    let mut saw_other = false;
    loop {
        cursor.eat_whitespace();
        match cursor.peek() {
            None => return Err(IcuError::new("unexpected end of message", cursor.pos)),
            Some('}') => {
                if !saw_other {
                    return Err(IcuError::new(
                        "plural and select arguments require an `other` branch",
                        cursor.pos,
                    ));
                }
                cursor.bump();
                return Ok(());
            }
            _ => {}
        }

        let selector_offset = cursor.pos;
        if plural && cursor.peek() == Some('=') {
            cursor.bump();
            if cursor.eat_word().parse::<u64>().is_err() {
                return Err(IcuError::new("expected number after '='", selector_offset));
            }
        } else {
            let selector = cursor.eat_word();
            if selector.is_empty() {
                return Err(IcuError::new("expected branch selector", selector_offset));
            }
            saw_other |= selector == "other";
        }

        cursor.eat_whitespace();
        if cursor.peek() != Some('{') {
            return Err(IcuError::new("expected '{' after branch selector", cursor.pos));
        }
        cursor.bump();
        parse_message(cursor, plural)?;
        if cursor.bump() != Some('}') {
            return Err(IcuError::new("unexpected end of message", cursor.pos));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes() {
        assert!(validate("Hello, World!").is_ok());
        assert!(validate("").is_ok());
    }

    #[test]
    fn simple_argument_passes() {
        assert!(validate("Hello, {name}!").is_ok());
        assert!(validate("{ count , number }").is_ok());
        assert!(validate("{when, date, short}").is_ok());
    }

    #[test]
    fn plural_argument_passes() {
        assert!(validate("{count, plural, one{1} other{#}}").is_ok());
        assert!(validate("{count, plural, offset:1 =0{none} one{one} other{# left}}").is_ok());
        assert!(validate("{rank, selectordinal, one{#st} two{#nd} few{#rd} other{#th}}").is_ok());
    }

    #[test]
    fn select_argument_passes() {
        assert!(validate("{gender, select, male{He} female{She} other{They}}").is_ok());
    }

    #[test]
    fn nested_arguments_pass() {
        assert!(
            validate("{count, plural, one{{name} has one} other{{name} has #}}").is_ok()
        );
    }

    #[test]
    fn quoting_passes() {
        assert!(validate("It''s '{literal}' text").is_ok());
    }

    #[test]
    fn unterminated_argument_fails() {
        let err = validate("{count, plural").unwrap_err();
        assert!(err.message.contains("unexpected end"));
    }

    #[test]
    fn unmatched_close_brace_fails() {
        assert!(validate("oops}").is_err());
    }

    #[test]
    fn missing_other_branch_fails() {
        let err = validate("{count, plural, one{1}}").unwrap_err();
        assert!(err.message.contains("other"));
    }

    #[test]
    fn unknown_argument_type_fails() {
        let err = validate("{count, cardinal, one{1} other{#}}").unwrap_err();
        assert!(err.message.contains("cardinal"));
    }

    #[test]
    fn missing_argument_name_fails() {
        assert!(validate("{, number}").is_err());
    }

    #[test]
    fn error_offsets_point_into_the_message() {
        let err = validate("abc {count, plural").unwrap_err();
        assert!(err.offset >= 4);
        assert!(err.offset <= "abc {count, plural".len());
    }
}
