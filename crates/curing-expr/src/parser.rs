// ============================================================================
// Module: Parser
// Description: Recursive-descent parser turning a token stream into one
//              `Node`.
// Purpose: Implement the expression language's full surface grammar
//          (literals, operators, calls, lists, and block constructs) in one
//          place.
// Dependencies: crate::ast, crate::error, crate::lexer
// ============================================================================

//! ## Overview
//! Precedence, loosest to tightest: `or` > `and` > unary `not`/`!` >
//! comparison (`== != > >= < <=`, non-associative) > additive (`+ -`) >
//! multiplicative (`* / %`) > unary `-` > primary (literals, identifiers,
//! calls, lists, parenthesised groups). Block constructs
//! (`if`/`while`/`for`/`switch`/`break`/`continue`/`return`/`=`) parse at
//! the statement level and are accepted wherever a standalone expression
//! would be the body of a formula or condition, so the same parser drives
//! both dialects; this engine's evaluator does not execute them.

use std::collections::BTreeMap;

use crate::ast::BinaryOp;
use crate::ast::Node;
use crate::ast::UnaryOp;
use crate::error::ParseError;
use crate::error::MAX_EXPR_NESTING;
use crate::lexer::lex;
use crate::lexer::SpannedToken;
use crate::lexer::Token;
use curing_core::Value;

/// Parses expression source text into one top-level [`Node`].
///
/// # Errors
/// Returns [`ParseError`] for any lexical or syntactic failure, including
/// unexpected trailing input after the parsed node.
pub fn parse(input: &str) -> Result<Node, ParseError> {
    let tokens = lex(input)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        nesting: 0,
    };
    let node = parser.parse_statement()?;
    parser.expect_eof()?;
    Ok(node)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    index: usize,
    nesting: usize,
}

impl Parser {
    fn current(&self) -> &SpannedToken {
        debug_assert!(self.index < self.tokens.len(), "parser index out of bounds");
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn matches(&mut self, token: &Token) -> bool {
        if &self.current().token == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if &self.current().token == token {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected,
                found: self.current().token.describe(),
                position: self.current().position,
            })
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.current().token == Token::Eof {
            Ok(())
        } else {
            Err(ParseError::TrailingInput {
                position: self.current().position,
            })
        }
    }

    fn with_nesting<T>(&mut self, position: usize, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        let next_depth = self.nesting + 1;
        if next_depth > MAX_EXPR_NESTING {
            return Err(ParseError::NestingTooDeep {
                max_depth: MAX_EXPR_NESTING,
                actual_depth: next_depth,
                position,
            });
        }
        self.nesting = next_depth;
        let result = f(self);
        self.nesting = self.nesting.saturating_sub(1);
        result
    }

    // -- statements -----------------------------------------------------

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match &self.current().token {
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::For => self.parse_for(),
            Token::Switch => self.parse_switch(),
            Token::Break => {
                self.advance();
                Ok(Node::Break)
            }
            Token::Continue => {
                self.advance();
                Ok(Node::Continue)
            }
            Token::Return => {
                self.advance();
                if matches!(self.current().token, Token::Semicolon | Token::Eof | Token::RBrace) {
                    Ok(Node::Return(None))
                } else {
                    Ok(Node::Return(Some(Box::new(self.parse_or()?))))
                }
            }
            Token::Ident(name) if self.peek_is_assign() => {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_or()?;
                Ok(Node::Assign {
                    name,
                    value: Box::new(value),
                })
            }
            _ => self.parse_or(),
        }
    }

    fn peek_is_assign(&self) -> bool {
        self.tokens.get(self.index + 1).map(|spanned| &spanned.token) == Some(&Token::Assign)
    }

    fn parse_block_body(&mut self) -> Result<Vec<Node>, ParseError> {
        self.expect(&Token::LBrace, "`{`")?;
        let mut statements = Vec::new();
        while !matches!(self.current().token, Token::RBrace | Token::Eof) {
            statements.push(self.parse_statement()?);
            self.matches(&Token::Semicolon);
        }
        self.expect(&Token::RBrace, "`}`")?;
        Ok(statements)
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        let position = self.current().position;
        self.advance();
        self.with_nesting(position, |parser| {
            parser.expect(&Token::LParen, "`(` after `if`")?;
            let cond = parser.parse_or()?;
            parser.expect(&Token::RParen, "`)` after condition")?;
            let then_branch = parser.parse_block_body()?;
            let else_branch = if parser.matches(&Token::Else) {
                parser.parse_block_body()?
            } else {
                Vec::new()
            };
            Ok(Node::If {
                cond: Box::new(cond),
                then_branch,
                else_branch,
            })
        })
    }

    fn parse_while(&mut self) -> Result<Node, ParseError> {
        let position = self.current().position;
        self.advance();
        self.with_nesting(position, |parser| {
            parser.expect(&Token::LParen, "`(` after `while`")?;
            let cond = parser.parse_or()?;
            parser.expect(&Token::RParen, "`)` after condition")?;
            let body = parser.parse_block_body()?;
            Ok(Node::While {
                cond: Box::new(cond),
                body,
            })
        })
    }

    fn parse_for(&mut self) -> Result<Node, ParseError> {
        let position = self.current().position;
        self.advance();
        self.with_nesting(position, |parser| {
            parser.expect(&Token::LParen, "`(` after `for`")?;
            let init = parser.parse_statement()?;
            parser.expect(&Token::Semicolon, "`;` after for-loop initializer")?;
            let cond = parser.parse_or()?;
            parser.expect(&Token::Semicolon, "`;` after for-loop condition")?;
            let update = parser.parse_statement()?;
            parser.expect(&Token::RParen, "`)` after for-loop update")?;
            let body = parser.parse_block_body()?;
            Ok(Node::For {
                init: Box::new(init),
                cond: Box::new(cond),
                update: Box::new(update),
                body,
            })
        })
    }

    fn parse_switch(&mut self) -> Result<Node, ParseError> {
        let position = self.current().position;
        self.advance();
        self.with_nesting(position, |parser| {
            parser.expect(&Token::LParen, "`(` after `switch`")?;
            let subject = parser.parse_or()?;
            parser.expect(&Token::RParen, "`)` after switch subject")?;
            parser.expect(&Token::LBrace, "`{` to open switch body")?;
            let mut cases = Vec::new();
            let mut default = Vec::new();
            while !matches!(parser.current().token, Token::RBrace | Token::Eof) {
                if parser.matches(&Token::Case) {
                    let value = parser.parse_or()?;
                    parser.expect(&Token::Colon, "`:` after case value")?;
                    let mut body = Vec::new();
                    while !matches!(parser.current().token, Token::Case | Token::Default | Token::RBrace) {
                        body.push(parser.parse_statement()?);
                        parser.matches(&Token::Semicolon);
                    }
                    cases.push((value, body));
                } else if parser.matches(&Token::Default) {
                    parser.expect(&Token::Colon, "`:` after `default`")?;
                    while !matches!(parser.current().token, Token::Case | Token::Default | Token::RBrace) {
                        default.push(parser.parse_statement()?);
                        parser.matches(&Token::Semicolon);
                    }
                } else {
                    return Err(ParseError::UnexpectedToken {
                        expected: "`case` or `default`",
                        found: parser.current().token.describe(),
                        position: parser.current().position,
                    });
                }
            }
            parser.expect(&Token::RBrace, "`}` to close switch body")?;
            Ok(Node::Switch {
                subject: Box::new(subject),
                cases,
                default,
            })
        })
    }

    // -- expressions, loosest to tightest --------------------------------

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_and()?;
        while self.matches(&Token::Or) {
            let rhs = self.parse_and()?;
            node = Node::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_not()?;
        while self.matches(&Token::And) {
            let rhs = self.parse_not()?;
            node = Node::Binary {
                op: BinaryOp::And,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<Node, ParseError> {
        if self.matches(&Token::Not) {
            let operand = self.parse_not()?;
            return Ok(Node::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_additive()?;
        let op = match self.current().token {
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::Ne,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_additive()?;
        Ok(Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_multiplicative()?;
        loop {
            let op = match self.current().token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            node = Node::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_unary()?;
        loop {
            let op = match self.current().token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            node = Node::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        if self.matches(&Token::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Node::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let position = self.current().position;
        match self.current().token.clone() {
            Token::Int(value) => {
                self.advance();
                Ok(Node::Literal(Value::Int(value)))
            }
            Token::Float(value) => {
                self.advance();
                Ok(Node::Literal(Value::Float(value)))
            }
            Token::Str(value) => {
                self.advance();
                Ok(Node::Literal(Value::Str(value)))
            }
            Token::True => {
                self.advance();
                Ok(Node::Literal(Value::Bool(true)))
            }
            Token::False => {
                self.advance();
                Ok(Node::Literal(Value::Bool(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Node::Literal(Value::Null))
            }
            Token::LBracket => {
                self.advance();
                self.with_nesting(position, |parser| {
                    let mut items = Vec::new();
                    if !parser.matches(&Token::RBracket) {
                        loop {
                            items.push(parser.parse_or()?);
                            if parser.matches(&Token::Comma) {
                                continue;
                            }
                            parser.expect(&Token::RBracket, "`]` after list items")?;
                            break;
                        }
                    }
                    Ok(Node::List(items))
                })
            }
            Token::LParen => {
                self.advance();
                self.with_nesting(position, |parser| {
                    let node = parser.parse_or()?;
                    parser.expect(&Token::RParen, "`)`")?;
                    Ok(node)
                })
            }
            Token::Ident(name) => {
                self.advance();
                if self.matches(&Token::LParen) {
                    self.with_nesting(position, |parser| parser.parse_call(name))
                } else {
                    Ok(Node::Variable(name))
                }
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "a literal, identifier, `(`, or `[`",
                found: self.current().token.describe(),
                position,
            }),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Node, ParseError> {
        let mut args = Vec::new();
        let mut kwargs = BTreeMap::new();
        if !self.matches(&Token::RParen) {
            loop {
                if let Token::Ident(key) = &self.current().token {
                    let key = key.clone();
                    if self.tokens.get(self.index + 1).map(|spanned| &spanned.token) == Some(&Token::Assign) {
                        self.advance();
                        self.advance();
                        kwargs.insert(key, self.parse_or()?);
                        if self.matches(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RParen, "`)` after arguments")?;
                        break;
                    }
                }
                args.push(self.parse_or()?);
                if self.matches(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen, "`)` after arguments")?;
                break;
            }
        }
        Ok(Node::Call { name, args, kwargs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_comparison() {
        let node = parse("temp >= 120.5");
        assert_eq!(
            node,
            Ok(Node::Binary {
                op: BinaryOp::Ge,
                lhs: Box::new(Node::Variable("temp".to_string())),
                rhs: Box::new(Node::Literal(Value::Float(120.5))),
            })
        );
    }

    #[test]
    fn parses_function_call_with_keyword_argument() {
        let node = parse("MAX(temp, axis=0)");
        let call = match node {
            Ok(Node::Call { name, args, kwargs }) => Some((name, args, kwargs)),
            _ => None,
        };
        assert_eq!(call.as_ref().map(|(name, ..)| name.as_str()), Some("MAX"));
        assert_eq!(call.as_ref().map(|(_, args, _)| args.len()), Some(1));
        assert_eq!(
            call.as_ref().and_then(|(_, _, kwargs)| kwargs.get("axis")),
            Some(&Node::Literal(Value::Int(0)))
        );
    }

    #[test]
    fn parses_list_literal() {
        let node = parse("[1, 2, 3]");
        assert_eq!(
            node,
            Ok(Node::List(vec![
                Node::Literal(Value::Int(1)),
                Node::Literal(Value::Int(2)),
                Node::Literal(Value::Int(3)),
            ]))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let node = parse("a and b or c");
        assert_eq!(
            node,
            Ok(Node::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(Node::Binary {
                    op: BinaryOp::And,
                    lhs: Box::new(Node::Variable("a".to_string())),
                    rhs: Box::new(Node::Variable("b".to_string())),
                }),
                rhs: Box::new(Node::Variable("c".to_string())),
            })
        );
    }

    #[test]
    fn trailing_input_is_rejected() {
        let node = parse("1 + 1 2");
        assert!(node.is_err());
    }

    #[test]
    fn parses_if_else_block_structurally() {
        let node = parse("if (a) { b = 1 } else { b = 2 }");
        assert!(matches!(node, Ok(Node::If { .. })));
    }
}
