//! Forward type-context inference
//!
//! Before an expression is parsed, its unconsumed token run is scanned to
//! classify it. A bool run parses as a comparison chain; number and string
//! runs share the additive grammar, and the context recorded for a `let`
//! binding feeds later scans that mention the variable:
//!
//! 1. a comparison anywhere in the run, outside call arguments, makes it a
//!    bool expression;
//! 2. otherwise `*`, `/` or a prefix `-` make it a number expression;
//! 3. otherwise the last literal or known variable decides.
//!
//! The run ends at `;`, at a `,` or closing bracket that does not belong to
//! a nested group, or at `{`. Array literal contents are skipped.

use super::symbols::SymbolTable;
use crate::ast::{Span, TypeContext};
use crate::lexer::Token;

/// Classify the token run starting at `tokens[0]`.
pub fn scan_context(tokens: &[(Token, Span)], symbols: &SymbolTable) -> TypeContext {
    let mut context = TypeContext::Any;
    let mut forces_number = false;
    // open parenthesized groups; true for a call's argument list
    let mut groups: Vec<bool> = Vec::new();
    let mut brackets = 0usize;
    let mut operand_expected = true;

    for (i, (token, _)) in tokens.iter().enumerate() {
        match token {
            Token::Semi | Token::LBrace => break,
            Token::Comma if groups.is_empty() && brackets == 0 => break,
            Token::RParen if groups.is_empty() && brackets == 0 => break,
            Token::RBracket if brackets == 0 => break,
            _ => {}
        }

        match token {
            Token::LBracket => brackets += 1,
            Token::RBracket => brackets -= 1,
            _ if brackets > 0 => {}
            Token::LParen => {
                let is_call = i > 0 && matches!(tokens[i - 1].0, Token::Ident(_));
                groups.push(is_call);
            }
            Token::RParen => {
                groups.pop();
            }
            // arguments are scanned on their own when the call is parsed
            t if t.is_comparison() && groups.iter().any(|&call| call) => {}
            t if t.is_comparison() => return TypeContext::Bool,
            Token::Star | Token::Slash => forces_number = true,
            Token::Minus if operand_expected => forces_number = true,
            Token::IntLit(_) | Token::FloatLit(_) => context = TypeContext::Number,
            Token::StringLit(_) => context = TypeContext::String,
            Token::True | Token::False => context = TypeContext::Bool,
            Token::Ident(name) => {
                let is_call = matches!(tokens.get(i + 1), Some((Token::LParen, _)));
                if !is_call {
                    if let Some(symbol) = symbols.lookup(name) {
                        if symbol.context.is_known() {
                            context = symbol.context;
                        }
                    }
                }
            }
            _ => {}
        }

        operand_expected = token.starts_operand();
    }

    if forces_number {
        TypeContext::Number
    } else {
        context
    }
}
