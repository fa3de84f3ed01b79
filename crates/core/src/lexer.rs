use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Number literal -- kept as source text to preserve exact representation
    Number(String),
    True,
    False,
    Null,
    // Punctuation
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    // End of input
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;
    let mut line_start = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        // Whitespace
        if c == '\n' {
            line += 1;
            pos += 1;
            line_start = pos;
            continue;
        }
        if c == ' ' || c == '\t' || c == '\r' || c == '\u{feff}' {
            pos += 1;
            continue;
        }

        let tok_line = line;
        let tok_col = (pos - line_start) as u32 + 1;
        let push = |tokens: &mut Vec<Spanned>, token: Token| {
            tokens.push(Spanned {
                token,
                line: tok_line,
                column: tok_col,
            })
        };

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() || chars[pos] == '\n' {
                    return Err(ParseError::new(
                        tok_line,
                        tok_col,
                        "unterminated string literal",
                    ));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(ParseError::new(
                            tok_line,
                            tok_col,
                            "unterminated escape in string",
                        ));
                    }
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        '/' => s.push('/'),
                        'b' => s.push('\u{8}'),
                        'f' => s.push('\u{c}'),
                        'n' => s.push('\n'),
                        'r' => s.push('\r'),
                        't' => s.push('\t'),
                        'u' => {
                            let (ch, consumed) = unicode_escape(&chars, pos + 1)
                                .ok_or_else(|| {
                                    ParseError::new(tok_line, tok_col, "invalid unicode escape")
                                })?;
                            s.push(ch);
                            pos += consumed;
                        }
                        other => {
                            return Err(ParseError::new(
                                tok_line,
                                tok_col,
                                format!("invalid escape '\\{}'", other),
                            ));
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            push(&mut tokens, Token::Str(s));
            continue;
        }

        // Number
        if c.is_ascii_digit() || c == '-' {
            let start = pos;
            if c == '-' {
                pos += 1;
            }
            let int_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == int_start {
                return Err(ParseError::new(tok_line, tok_col, "expected digit after '-'"));
            }
            if pos < chars.len() && chars[pos] == '.' {
                pos += 1; // consume '.'
                let frac_start = pos;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos == frac_start {
                    return Err(ParseError::new(
                        tok_line,
                        tok_col,
                        "expected digit after decimal point",
                    ));
                }
            }
            if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
                pos += 1;
                if pos < chars.len() && (chars[pos] == '+' || chars[pos] == '-') {
                    pos += 1;
                }
                let exp_start = pos;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos == exp_start {
                    return Err(ParseError::new(tok_line, tok_col, "expected exponent digits"));
                }
            }
            let s: String = chars[start..pos].iter().collect();
            push(&mut tokens, Token::Number(s));
            continue;
        }

        // Punctuation
        let punct = match c {
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = punct {
            push(&mut tokens, token);
            pos += 1;
            continue;
        }

        // Literal words
        if c.is_ascii_alphabetic() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_alphabetic() {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            let token = match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                _ => {
                    return Err(ParseError::new(
                        tok_line,
                        tok_col,
                        format!("unexpected word '{}'", word),
                    ));
                }
            };
            push(&mut tokens, token);
            continue;
        }

        return Err(ParseError::new(
            tok_line,
            tok_col,
            format!("unexpected character '{}'", c),
        ));
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
        column: (pos - line_start) as u32 + 1,
    });
    Ok(tokens)
}

/// Decode the four hex digits starting at `at` (just past `\u`), joining a
/// following `\uXXXX` low surrogate when present. Returns the character and
/// how many chars past the `u` were consumed.
fn unicode_escape(chars: &[char], at: usize) -> Option<(char, usize)> {
    let hex4 = |from: usize| -> Option<u32> {
        let digits: String = chars.get(from..from + 4)?.iter().collect();
        u32::from_str_radix(&digits, 16).ok()
    };
    let first = hex4(at)?;
    if (0xD800..0xDC00).contains(&first) {
        if chars.get(at + 4) == Some(&'\\') && chars.get(at + 5) == Some(&'u') {
            let second = hex4(at + 6)?;
            if (0xDC00..0xE000).contains(&second) {
                let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                return Some((char::from_u32(code)?, 10));
            }
        }
        return None;
    }
    Some((char::from_u32(first)?, 4))
}
