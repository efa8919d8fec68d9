//! 条件表达式语法分析
//!
//! 优先级从低到高：`or`、`and`、`not`（右结合）。比较与成员检查的操作数只能是
//! 数值、字符串或配置项引用，因此它们作为原子表达式整体参与逻辑组合，
//! `1 == 1 == 1`、`True == True` 都是语法错误。
//!
//! ```text
//! or_expr  := and_expr ("or" and_expr)*
//! and_expr := unary ("and" unary)*
//! unary    := "not" unary | primary
//! primary  := "(" or_expr ")" | "True" | "False"
//!           | operand (cmp_op operand | ["not"] "in" "(" operand ("," operand)* ")")?
//! operand  := NUMBER | STRING | ITEM
//! ```
//!
//! 不跟比较的单独操作数只允许是配置项引用，求值时要求它是布尔值。

use super::ast::{BinaryOp, Node};
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::{CheckerError, Result};
use crate::path::ItemPath;

/// 解析表达式文本为语法树
pub fn parse(source: &str) -> Result<Node> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        index: 0,
    };

    let node = parser.or_expr()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected());
    }

    Ok(node)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    index: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn peek_nth(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + n).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.peek() == Some(&kind) {
            self.index += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// 当前记号处的语法错误，输入结束时指向末尾
    fn unexpected(&self) -> CheckerError {
        match self.tokens.get(self.index) {
            Some(token) => CheckerError::Syntax {
                token: Some(token.text.clone()),
                text: self.source.to_string(),
                position: token.position,
            },
            None => CheckerError::Syntax {
                token: None,
                text: self.source.to_string(),
                position: self.source.chars().count(),
            },
        }
    }

    fn or_expr(&mut self) -> Result<Node> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&TokenKind::Or) {
            self.index += 1;
            let rhs = self.and_expr()?;
            lhs = Node::BinaryOp {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Node> {
        let mut lhs = self.unary()?;
        while self.peek() == Some(&TokenKind::And) {
            self.index += 1;
            let rhs = self.unary()?;
            lhs = Node::BinaryOp {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node> {
        if self.peek() == Some(&TokenKind::Not) {
            self.index += 1;
            let inner = self.unary()?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Node> {
        match self.peek() {
            Some(TokenKind::LParen) => {
                self.index += 1;
                let inner = self.or_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::True) => {
                self.index += 1;
                Ok(Node::BoolLiteral(true))
            }
            Some(TokenKind::False) => {
                self.index += 1;
                Ok(Node::BoolLiteral(false))
            }
            Some(TokenKind::Number(_) | TokenKind::Str(_) | TokenKind::Item(_)) => {
                let operand = self.operand()?;
                self.operand_tail(operand)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// 操作数之后的比较或成员检查
    fn operand_tail(&mut self, operand: Node) -> Result<Node> {
        let op = match self.peek() {
            Some(TokenKind::Eq) => Some(BinaryOp::Eq),
            Some(TokenKind::Ne) => Some(BinaryOp::Ne),
            Some(TokenKind::Lt) => Some(BinaryOp::Lt),
            Some(TokenKind::Gt) => Some(BinaryOp::Gt),
            Some(TokenKind::Le) => Some(BinaryOp::Le),
            Some(TokenKind::Ge) => Some(BinaryOp::Ge),
            _ => None,
        };

        if let Some(op) = op {
            self.index += 1;
            let rhs = self.operand()?;
            return Ok(Node::BinaryOp {
                op,
                lhs: Box::new(operand),
                rhs: Box::new(rhs),
            });
        }

        match (self.peek(), self.peek_nth(1)) {
            (Some(TokenKind::In), _) => {
                self.index += 1;
                self.membership(operand, false)
            }
            (Some(TokenKind::Not), Some(TokenKind::In)) => {
                self.index += 2;
                self.membership(operand, true)
            }
            _ if matches!(operand, Node::ItemRef { .. }) => Ok(operand),
            _ => Err(self.unexpected()),
        }
    }

    fn membership(&mut self, item: Node, negated: bool) -> Result<Node> {
        self.expect(TokenKind::LParen)?;

        let mut list = vec![self.operand()?];
        while self.peek() == Some(&TokenKind::Comma) {
            self.index += 1;
            list.push(self.operand()?);
        }

        self.expect(TokenKind::RParen)?;

        Ok(Node::Membership {
            item: Box::new(item),
            negated,
            list,
        })
    }

    fn operand(&mut self) -> Result<Node> {
        let error = self.unexpected();
        let Some(token) = self.advance() else {
            return Err(error);
        };

        match token.kind {
            TokenKind::Number(value) => Ok(Node::NumberLiteral {
                value,
                position: token.position,
            }),
            TokenKind::Str(value) => Ok(Node::StringLiteral {
                value,
                position: token.position,
            }),
            TokenKind::Item(path) => Ok(Node::ItemRef {
                path: ItemPath::parse(&path),
                position: token.position,
            }),
            _ => Err(error),
        }
    }
}
