use std::collections::HashSet;
use std::sync::Arc;

use super::{Entry, GroundedDoc, GroundedNode, GroundedValue, KeyNode, NodeId, Pos};
use crate::error::ParseError;
use crate::lexer::{lex, Spanned, Token};
use crate::REFERENCE_MARKER_KEY;

/// Deepest container nesting accepted before parsing gives up.
pub const MAX_DEPTH: usize = 512;

/// Parse JSON source text into a grounded document.
///
/// Every node records the line and column of its first token; mapping keys
/// record their own positions. Mappings carrying a string `$ref` entry are
/// marked as references.
pub fn parse(src: &str) -> Result<Arc<GroundedDoc>, ParseError> {
    let tokens = lex(src)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        doc: GroundedDoc::default(),
    };
    let root = parser.parse_value()?;
    if parser.peek() != &Token::Eof {
        return Err(parser.err(format!(
            "unexpected trailing content {:?}",
            parser.peek()
        )));
    }
    parser.doc.set_root(root);
    tracing::debug!(nodes = parser.doc.len(), "parsed grounded document");
    Ok(Arc::new(parser.doc))
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    /// Containers currently open.
    depth: usize,
    doc: GroundedDoc,
}

impl<'a> Parser<'a> {
    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn cur_pos(&self) -> Pos {
        let s = self.cur();
        Pos::new(s.line, s.column)
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let s = self.cur();
        ParseError::new(s.line, s.column, msg)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        if self.peek() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {}, got {:?}", what, self.peek())))
        }
    }

    fn scalar(&mut self, value: GroundedValue) -> NodeId {
        let pos = self.cur_pos();
        self.advance();
        self.doc.push(GroundedNode {
            value,
            pos,
            reference: None,
        })
    }

    fn parse_value(&mut self) -> Result<NodeId, ParseError> {
        match self.peek().clone() {
            Token::LBrace => self.nested(Self::parse_mapping),
            Token::LBracket => self.nested(Self::parse_sequence),
            Token::Str(s) => Ok(self.scalar(GroundedValue::Str(s))),
            Token::Number(n) => Ok(self.scalar(GroundedValue::Number(n))),
            Token::True => Ok(self.scalar(GroundedValue::Bool(true))),
            Token::False => Ok(self.scalar(GroundedValue::Bool(false))),
            Token::Null => Ok(self.scalar(GroundedValue::Null)),
            other => Err(self.err(format!("expected a value, got {:?}", other))),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<NodeId, ParseError>,
    ) -> Result<NodeId, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.err(format!("nesting too deep (limit {})", MAX_DEPTH)));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_sequence(&mut self) -> Result<NodeId, ParseError> {
        let pos = self.cur_pos();
        self.expect(Token::LBracket, "'['")?;
        let mut items = Vec::new();
        if self.peek() != &Token::RBracket {
            loop {
                items.push(self.parse_value()?);
                if self.peek() == &Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(Token::RBracket, "',' or ']'")?;
        Ok(self.doc.push(GroundedNode {
            value: GroundedValue::Sequence(items),
            pos,
            reference: None,
        }))
    }

    fn parse_mapping(&mut self) -> Result<NodeId, ParseError> {
        let pos = self.cur_pos();
        self.expect(Token::LBrace, "'{'")?;
        let mut entries: Vec<Entry> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        if self.peek() != &Token::RBrace {
            loop {
                let key_pos = self.cur_pos();
                let text = match self.peek().clone() {
                    Token::Str(s) => {
                        self.advance();
                        s
                    }
                    other => {
                        return Err(self.err(format!("expected string key, got {:?}", other)));
                    }
                };
                if !seen.insert(text.clone()) {
                    return Err(ParseError::new(
                        key_pos.line,
                        key_pos.column,
                        format!("duplicate key '{}'", text),
                    ));
                }
                self.expect(Token::Colon, "':'")?;
                let value = self.parse_value()?;
                entries.push(Entry {
                    key: KeyNode { text, pos: key_pos },
                    value,
                });
                if self.peek() == &Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(Token::RBrace, "',' or '}'")?;

        let reference = entries
            .iter()
            .find(|e| e.key.text == REFERENCE_MARKER_KEY)
            .and_then(|e| self.doc.node(e.value))
            .and_then(|n| match &n.value {
                GroundedValue::Str(target) => Some(target.clone()),
                _ => None,
            });
        Ok(self.doc.push(GroundedNode {
            value: GroundedValue::Mapping(entries),
            pos,
            reference,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_key_and_value_positions() {
        let doc = parse("{\n  \"thing\": \"ding\",\n  \"thong\": 1\n}").unwrap();
        let root = doc.root().unwrap();
        let entries = doc.node(root).unwrap().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key.text, "thing");
        assert_eq!(entries[0].key.pos, Pos::new(2, 3));
        let thong = doc.node(entries[1].value).unwrap();
        assert_eq!(thong.pos, Pos::new(3, 12));
        assert_eq!(thong.value(), &GroundedValue::Number("1".into()));
    }

    #[test]
    fn nested_values_and_empty_collections() {
        let doc = parse("{\"a\": [], \"b\": {}, \"c\": [true, null, \"x\"]}").unwrap();
        let root = doc.root().unwrap();
        let a = doc.get(root, "a").unwrap();
        assert!(doc.node(a).unwrap().items().is_empty());
        let c = doc.get(root, "c").unwrap();
        assert_eq!(doc.node(c).unwrap().items().len(), 3);
        assert!(doc.node(doc.get(root, "b").unwrap()).unwrap().entries().is_empty());
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = parse("{\"a\": 1,\n \"a\": 2}").unwrap_err();
        assert_eq!((err.line, err.column), (2, 2));
        assert!(err.message.contains("duplicate key 'a'"));
    }

    #[test]
    fn rejects_trailing_content() {
        let err = parse("{} {}").unwrap_err();
        assert_eq!(err.column, 4);
    }

    #[test]
    fn rejects_excessive_nesting() {
        let err = parse(&"[".repeat(200_000)).unwrap_err();
        assert_eq!((err.line, err.column), (1, MAX_DEPTH as u32 + 1));
        assert!(err.message.contains("nesting too deep"));

        let deep = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&deep).is_ok());
        let mixed = format!("{}1{}", "{\"a\": [".repeat(100), "]}".repeat(100));
        assert!(parse(&mixed).is_ok());
    }

    #[test]
    fn rejects_missing_colon() {
        let err = parse("{\"a\" 1}").unwrap_err();
        assert!(err.message.contains("expected ':'"));
    }
}
