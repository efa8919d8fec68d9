//! 条件表达式词法分析
//!
//! 把表达式文本切分为带字符位置的记号序列。配置项引用 `{path}` 在这里只记录路径，
//! 取值与类型检查推迟到求值阶段。

use crate::error::{CheckerError, Result};
use crate::range::{Number, scan_number};

/// 记号类型
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    True,
    False,
    Number(Number),
    Str(String),
    /// 配置项引用，值为花括号内的路径
    Item(String),
    Not,
    And,
    Or,
    In,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LParen,
    RParen,
    Comma,
}

/// 记号
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 记号在原文中的文本
    pub text: String,
    /// 记号起始位置（字符）
    pub position: usize,
}

/// 对表达式文本做词法分析
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(&c) = self.chars.get(self.pos) {
            let start = self.pos;
            match c {
                c if c.is_whitespace() => self.pos += 1,
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                ',' => self.single(TokenKind::Comma),
                '{' => self.item()?,
                '"' | '\'' => self.string(c)?,
                '=' | '!' | '<' | '>' => self.comparison()?,
                c if c.is_ascii_digit() => self.number()?,
                '+' | '-' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => self.number()?,
                c if c.is_alphabetic() || c == '_' => self.word()?,
                _ => return Err(self.error_at(start, 1)),
            }
        }

        Ok(self.tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let text = self.slice(start, self.pos);
        self.tokens.push(Token {
            kind,
            text,
            position: start,
        });
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.pos;
        self.pos += 1;
        self.push(kind, start);
    }

    fn comparison(&mut self) -> Result<()> {
        let start = self.pos;
        let (kind, len) = match (self.chars[start], self.peek(1)) {
            ('=', Some('=')) => (TokenKind::Eq, 2),
            ('!', Some('=')) => (TokenKind::Ne, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            _ => return Err(self.error_at(start, 1)),
        };
        self.pos += len;
        self.push(kind, start);
        Ok(())
    }

    fn number(&mut self) -> Result<()> {
        let start = self.pos;
        match scan_number(&self.chars, start) {
            Some((number, end)) => {
                self.pos = end;
                self.push(TokenKind::Number(number), start);
                Ok(())
            }
            // 数字过长等无法解析的情况
            None => Err(self.error_at(start, self.word_len(start))),
        }
    }

    fn word(&mut self) -> Result<()> {
        let start = self.pos;
        let len = self.word_len(start);
        let word = self.slice(start, start + len);

        let kind = match word.as_str() {
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "in" => TokenKind::In,
            _ => return Err(self.error_at(start, len)),
        };

        self.pos += len;
        self.push(kind, start);
        Ok(())
    }

    fn word_len(&self, start: usize) -> usize {
        self.chars[start..]
            .iter()
            .take_while(|c| c.is_alphanumeric() || matches!(**c, '_' | '.' | '+' | '-'))
            .count()
            .max(1)
    }

    /// 配置项引用：花括号之间至少一个字符，不允许嵌套
    fn item(&mut self) -> Result<()> {
        let start = self.pos;
        let close = self.chars[start + 1..]
            .iter()
            .position(|c| *c == '}')
            .map(|offset| start + 1 + offset);

        match close {
            Some(end) if end > start + 1 => {
                let path = self.slice(start + 1, end);
                self.pos = end + 1;
                self.push(TokenKind::Item(path), start);
                Ok(())
            }
            Some(end) => Err(self.error_at(start, end + 1 - start)),
            None => Err(self.error_at(start, self.chars.len() - start)),
        }
    }

    /// 字符串字面量，支持 `\` 转义
    fn string(&mut self, quote: char) -> Result<()> {
        let start = self.pos;
        let mut value = String::new();
        let mut pos = start + 1;

        loop {
            match self.chars.get(pos) {
                None => return Err(self.error_at(start, self.chars.len() - start)),
                Some(&c) if c == quote => break,
                Some('\\') => {
                    let escaped = match self.chars.get(pos + 1) {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(&other) => other,
                        None => return Err(self.error_at(start, self.chars.len() - start)),
                    };
                    value.push(escaped);
                    pos += 2;
                }
                Some(&c) => {
                    value.push(c);
                    pos += 1;
                }
            }
        }

        self.pos = pos + 1;
        self.push(TokenKind::Str(value), start);
        Ok(())
    }

    fn error_at(&self, position: usize, len: usize) -> CheckerError {
        let end = (position + len).min(self.chars.len());
        CheckerError::Syntax {
            token: Some(self.slice(position, end)),
            text: self.source.to_string(),
            position,
        }
    }
}
