//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::{LineIndex, Span};
use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code.
///
/// Every token carries its byte span plus the 1-based line and column of
/// its first character.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let lines = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lines.span(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                let slice = lexer.slice();
                let message = if slice.starts_with(|c: char| c.is_ascii_digit()) {
                    format!("invalid number literal: {slice}")
                } else {
                    format!("unexpected character: {slice:?}")
                };
                return Err(CompileError::lexer(message, span));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_tokenize_empty() {
        let tokens = tokenize("").unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("let fn return if else while true false"),
            vec![
                Token::Let,
                Token::Fn,
                Token::Return,
                Token::If,
                Token::Else,
                Token::While,
                Token::True,
                Token::False,
            ]
        );
    }

    #[test]
    fn test_tokenize_integer_literal() {
        let tokens = kinds("42");
        assert_eq!(tokens, vec![Token::IntLit(42)]);
    }

    #[test]
    fn test_tokenize_float_literal() {
        let tokens = kinds("1.5");
        assert!(matches!(&tokens[0], Token::FloatLit(n) if (*n - 1.5).abs() < f32::EPSILON));
    }

    #[test]
    fn test_tokenize_string_literal_with_escapes() {
        let tokens = kinds(r#""a\tb\n\"c\"""#);
        assert_eq!(tokens, vec![Token::StringLit("a\tb\n\"c\"".to_string())]);
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("+ - * / = == < > <= >="),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Eq,
                Token::EqEq,
                Token::Lt,
                Token::Gt,
                Token::LtEq,
                Token::GtEq,
            ]
        );
    }

    #[test]
    fn test_tokenize_identifier_prefixed_by_keyword() {
        let tokens = kinds("letter iffy fn_ptr");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("letter".into()),
                Token::Ident("iffy".into()),
                Token::Ident("fn_ptr".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_negative_integer_as_minus_then_int() {
        assert_eq!(kinds("-42"), vec![Token::Minus, Token::IntLit(42)]);
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let tokens = kinds("let // trailing comment\nx");
        assert_eq!(tokens, vec![Token::Let, Token::Ident("x".into())]);
    }

    #[test]
    fn test_tokenize_line_and_column() {
        let tokens = tokenize("let a = 1;\n  a = 2;").unwrap();
        let (_, let_span) = &tokens[0];
        assert_eq!((let_span.line, let_span.column), (1, 1));
        let (tok, span) = &tokens[5];
        assert_eq!(tok, &Token::Ident("a".into()));
        assert_eq!((span.line, span.column), (2, 3));
        assert_eq!((span.start, span.end), (13, 14));
    }

    #[test]
    fn test_tokenize_unexpected_character_error() {
        let err = tokenize("let a = 1 # 2;").unwrap_err();
        assert!(err.message().contains("unexpected character"));
        let span = err.span().unwrap();
        assert_eq!((span.line, span.column), (1, 11));
    }

    #[test]
    fn test_tokenize_integer_out_of_range() {
        let err = tokenize("99999999999").unwrap_err();
        assert!(err.message().contains("invalid number literal"));
    }
}
