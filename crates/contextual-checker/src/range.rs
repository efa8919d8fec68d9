//! 数值区间
//!
//! 区间由上下两个端点组成，每个端点可以独立地开或闭，缺省值表示无界。
//! 文本形式为 `<括号><下界>,<上界><括号>`：左侧 `]` 或右侧 `[` 表示开端点，
//! 如 `]0,2]` 表示 0 < x <= 2，`[0,+inf]` 表示 x >= 0。

use crate::error::{CheckerError, Result};
use crate::value::{TypedValue, ValueType};
use std::cmp::Ordering;
use std::fmt;

/// 下界无界标记
pub const LOWER_UNBOUND: &str = "-inf";
/// 上界无界标记
pub const UPPER_UNBOUND: &str = "+inf";

/// 区间端点的数值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
        }
    }

    pub fn from_typed(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::Int(i) => Some(Self::Int(*i)),
            TypedValue::Float(f) => Some(Self::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
        }
    }

    fn compare(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl From<Number> for TypedValue {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(i) => TypedValue::Int(i),
            Number::Float(f) => TypedValue::Float(f),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// 区间端点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: Option<Number>,
    pub open: bool,
}

impl Bound {
    pub fn new(value: Option<Number>, open: bool) -> Self {
        Self { value, open }
    }

    pub fn unbounded() -> Self {
        Self::new(None, false)
    }

    /// 作为下界检查：开端点要求严格大于，闭端点要求大于等于
    fn admits_from_below(&self, value: &Number) -> bool {
        match &self.value {
            None => true,
            Some(bound) => match value.compare(bound) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => !self.open,
                _ => false,
            },
        }
    }

    /// 作为上界检查：开端点要求严格小于，闭端点要求小于等于
    fn admits_from_above(&self, value: &Number) -> bool {
        match &self.value {
            None => true,
            Some(bound) => match value.compare(bound) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => !self.open,
                _ => false,
            },
        }
    }
}

/// 数值区间
#[derive(Debug, Clone)]
pub struct Range {
    lower: Bound,
    upper: Bound,
}

impl Range {
    /// 创建区间并校验端点
    ///
    /// 至少一个端点有界；两个端点都有界时类型必须一致、不能相等且下界小于上界。
    pub fn new(lower: Bound, upper: Bound) -> Result<Self> {
        let range = Self { lower, upper };
        range.validate()?;
        Ok(range)
    }

    /// 解析区间文本
    pub fn parse(text: &str) -> Result<Self> {
        let (lower, upper) = RangeParser::new(text).parse()?;
        Self::new(lower, upper)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CheckerError::RangeDefinition {
            range: self.to_string(),
            reason: reason.to_string(),
        };

        let values = [self.lower.value, self.upper.value];
        if values
            .iter()
            .flatten()
            .any(|n| matches!(n, Number::Float(f) if f.is_nan()))
        {
            return Err(invalid("端点不能是 NaN"));
        }

        match (&self.lower.value, &self.upper.value) {
            (None, None) => Err(invalid("至少需要一个有界端点")),
            (Some(lower), Some(upper)) => {
                if lower.value_type() != upper.value_type() {
                    return Err(invalid("上下界类型不一致"));
                }
                match lower.compare(upper) {
                    Some(Ordering::Equal) => Err(invalid("上下界相等")),
                    Some(Ordering::Greater) => Err(invalid("下界大于上界")),
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    pub fn lower(&self) -> &Bound {
        &self.lower
    }

    pub fn upper(&self) -> &Bound {
        &self.upper
    }

    /// 区间端点的数值类型
    pub fn value_type(&self) -> ValueType {
        self.lower
            .value
            .or(self.upper.value)
            .map(|n| n.value_type())
            .unwrap_or(ValueType::Int)
    }

    /// 检查数值是否落在区间内
    pub fn check(&self, value: &Number) -> bool {
        self.lower.admits_from_below(value) && self.upper.admits_from_above(value)
    }

    /// 检查类型化的值是否落在区间内，非数值一律不在区间内
    pub fn contains(&self, value: &TypedValue) -> bool {
        Number::from_typed(value).is_some_and(|n| self.check(&n))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lower_bracket = if self.lower.open { ']' } else { '[' };
        let upper_bracket = if self.upper.open { '[' } else { ']' };
        match self.lower.value {
            Some(v) => write!(f, "{}{}", lower_bracket, v)?,
            None => write!(f, "{}{}", lower_bracket, LOWER_UNBOUND)?,
        }
        write!(f, ",")?;
        match self.upper.value {
            Some(v) => write!(f, "{}{}", v, upper_bracket),
            None => write!(f, "{}{}", UPPER_UNBOUND, upper_bracket),
        }
    }
}

/// 文本形式唯一对应一个区间，相等性按规范文本比较
impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

/// 扫描数值字面量：`[+-]?\d+` 为整数，`[+-]?\d+\.\d*([eE][+-]?\d+)?` 为浮点数
///
/// 返回数值与结束位置，起始处不是数值时返回 None。
pub(crate) fn scan_number(chars: &[char], start: usize) -> Option<(Number, usize)> {
    let mut pos = start;
    if matches!(chars.get(pos), Some('+') | Some('-')) {
        pos += 1;
    }

    let digits_start = pos;
    while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
        pos += 1;
    }
    if pos == digits_start {
        return None;
    }

    let mut is_float = false;
    if chars.get(pos) == Some(&'.') {
        is_float = true;
        pos += 1;
        while chars.get(pos).is_some_and(|c| c.is_ascii_digit()) {
            pos += 1;
        }

        if matches!(chars.get(pos), Some('e') | Some('E')) {
            let mut exp = pos + 1;
            if matches!(chars.get(exp), Some('+') | Some('-')) {
                exp += 1;
            }
            let exp_digits = exp;
            while chars.get(exp).is_some_and(|c| c.is_ascii_digit()) {
                exp += 1;
            }
            if exp > exp_digits {
                pos = exp;
            }
        }
    }

    let literal: String = chars[start..pos].iter().collect();
    let number = if is_float {
        Number::Float(literal.parse().ok()?)
    } else {
        Number::Int(literal.parse().ok()?)
    };

    Some((number, pos))
}

/// 区间文本解析器
struct RangeParser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> RangeParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<(Bound, Bound)> {
        let lower_open = self.bracket()? == ']';
        let lower = self.term(LOWER_UNBOUND)?;
        self.expect(',')?;
        let upper = self.term(UPPER_UNBOUND)?;
        let upper_open = self.bracket()? == '[';

        self.skip_whitespace();
        if self.pos < self.chars.len() {
            return Err(self.error_here());
        }

        Ok((Bound::new(lower, lower_open), Bound::new(upper, upper_open)))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn bracket(&mut self) -> Result<char> {
        self.skip_whitespace();
        match self.chars.get(self.pos) {
            Some(&c) if c == '[' || c == ']' => {
                self.pos += 1;
                Ok(c)
            }
            _ => Err(self.error_here()),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        if self.chars.get(self.pos) == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here())
        }
    }

    /// 端点：数值或对应方向的无界标记
    fn term(&mut self, unbound: &str) -> Result<Option<Number>> {
        self.skip_whitespace();

        let marker: Vec<char> = unbound.chars().collect();
        if self.chars[self.pos..].starts_with(&marker) {
            self.pos += marker.len();
            return Ok(None);
        }

        match scan_number(&self.chars, self.pos) {
            Some((number, end)) => {
                self.pos = end;
                Ok(Some(number))
            }
            None => Err(self.error_here()),
        }
    }

    fn error_here(&self) -> CheckerError {
        let token = self.chars.get(self.pos).map(|c| c.to_string());
        CheckerError::Syntax {
            token,
            text: self.text.to_string(),
            position: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(lower: Option<Number>, lower_open: bool, upper: Option<Number>, upper_open: bool) -> Range {
        Range::new(Bound::new(lower, lower_open), Bound::new(upper, upper_open)).unwrap()
    }

    fn int(i: i64) -> Option<Number> {
        Some(Number::Int(i))
    }

    #[test]
    fn test_bounds() {
        let cases = [
            // 下界开
            (Bound::new(int(0), true), [false, false, true]),
            // 下界闭
            (Bound::new(int(0), false), [false, true, true]),
            // 无界
            (Bound::new(None, true), [true, true, true]),
        ];
        for (bound, expected) in cases {
            for (value, want) in [-1, 0, 1].into_iter().zip(expected) {
                assert_eq!(bound.admits_from_below(&Number::Int(value)), want);
            }
        }

        let cases = [
            (Bound::new(int(0), true), [true, false, false]),
            (Bound::new(int(0), false), [true, true, false]),
            (Bound::new(None, false), [true, true, true]),
        ];
        for (bound, expected) in cases {
            for (value, want) in [-1, 0, 1].into_iter().zip(expected) {
                assert_eq!(bound.admits_from_above(&Number::Int(value)), want);
            }
        }
    }

    #[test]
    fn test_closed_range_contains_endpoints() {
        let r = range(int(0), false, int(2), false);
        for (value, expected) in [(-1, false), (0, true), (1, true), (2, true), (3, false)] {
            assert_eq!(r.check(&Number::Int(value)), expected, "value {}", value);
        }
    }

    #[test]
    fn test_open_range_excludes_endpoints() {
        let r = range(int(0), true, int(2), true);
        for (value, expected) in [(-1, false), (0, false), (1, true), (2, false), (3, false)] {
            assert_eq!(r.check(&Number::Int(value)), expected, "value {}", value);
        }
    }

    #[test]
    fn test_half_bounded() {
        let r = range(int(0), false, None, false);
        assert!(r.check(&Number::Int(i64::MAX)));
        assert!(!r.check(&Number::Int(-1)));

        let r = range(None, false, int(2), false);
        assert!(r.check(&Number::Int(i64::MIN)));
        assert!(!r.check(&Number::Int(3)));
    }

    #[test]
    fn test_invalid_bounds() {
        let cases = [
            (int(0), Some(Number::Float(1.0))),
            (None, None),
            (int(0), int(0)),
            (int(1), int(0)),
        ];
        for (lower, upper) in cases {
            let err = Range::new(Bound::new(lower, false), Bound::new(upper, false)).unwrap_err();
            assert!(matches!(err, CheckerError::RangeDefinition { .. }));
        }
    }

    #[test]
    fn test_value_type() {
        assert_eq!(range(int(0), true, int(1), true).value_type(), ValueType::Int);
        assert_eq!(
            range(None, true, Some(Number::Float(0.0)), true).value_type(),
            ValueType::Float
        );
        assert_eq!(range(int(0), true, None, true).value_type(), ValueType::Int);
    }

    #[test]
    fn test_parse() {
        let cases = [
            ("]0,2[", range(int(0), true, int(2), true)),
            ("[0.,2.[", range(Some(Number::Float(0.0)), false, Some(Number::Float(2.0)), true)),
            ("]0,2]", range(int(0), true, int(2), false)),
            ("[0,+inf]", range(int(0), false, None, false)),
            ("[-inf,2.]", range(None, false, Some(Number::Float(2.0)), false)),
            (" [ -5 , 5 ] ", range(int(-5), false, int(5), false)),
        ];

        for (text, expected) in cases {
            let parsed = Range::parse(text).unwrap();
            assert_eq!(parsed, expected, "parse {:?}", text);
            assert_eq!(parsed.value_type(), expected.value_type());
        }
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(Range::parse("]0,2]").unwrap().to_string(), "]0,2]");
        assert_eq!(Range::parse("[0.,+inf[").unwrap().to_string(), "[0.0,+inf[");
        // 整数与浮点端点的规范文本不同
        assert_ne!(Range::parse("[0,1]").unwrap(), Range::parse("[0.,1.]").unwrap());
    }

    #[test]
    fn test_parse_syntax_errors() {
        for text in ["", "0,2", "]0;2]", "]0,2", "]0,2]x", "[+inf,2]", "[a,b]"] {
            let err = Range::parse(text).unwrap_err();
            assert!(
                matches!(err, CheckerError::Syntax { .. }),
                "{:?} should be a syntax error, got {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_parse_definition_errors() {
        let err = Range::parse("]2,0]").unwrap_err();
        assert!(matches!(err, CheckerError::RangeDefinition { .. }));

        let err = Range::parse("[-inf,+inf]").unwrap_err();
        assert!(matches!(err, CheckerError::RangeDefinition { .. }));
    }

    #[test]
    fn test_contains_typed() {
        let r = Range::parse("]0,100]").unwrap();
        assert!(r.contains(&TypedValue::Int(100)));
        assert!(!r.contains(&TypedValue::Int(150)));
        assert!(!r.contains(&TypedValue::Str("50".into())));
    }
}
