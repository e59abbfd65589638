//! Filter expressions using nom.
//!
//! A small condition language that is replayed onto any builder through
//! the same fluent calls a program would make:
//!
//! ```text
//! age > 10 and (name like 'b%' or dept in (1, 2)) and deleted_at is null
//! ```
//!
//! Connectives are kept in the order written; grouping only comes from
//! parentheses, exactly as `nested` renders them.

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, none_of, satisfy},
    combinator::{map, map_res, not, opt, peek, recognize, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use rust_decimal::Decimal;

use crate::error::{WeaveError, WeaveResult};
use crate::lambda::Compare;
use crate::value::Value;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// One condition or a parenthesised group.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        property: String,
        op: CompareOp,
        value: Value,
    },
    /// `pattern` keeps its `%` wildcards as written.
    Like {
        property: String,
        negate: bool,
        pattern: String,
    },
    In {
        property: String,
        negate: bool,
        values: Vec<Value>,
    },
    Between {
        property: String,
        negate: bool,
        low: Value,
        high: Value,
    },
    Null {
        property: String,
        negate: bool,
    },
    Group(FilterExpr),
}

/// A condition chain: `first (connective filter)*`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub first: Box<Filter>,
    pub rest: Vec<(Connective, Filter)>,
}

impl FilterExpr {
    /// Replay the expression onto `builder`.
    pub fn apply<B: Compare>(&self, builder: B) -> B {
        let mut builder = self.first.apply(builder);
        for (connective, filter) in &self.rest {
            builder = match connective {
                Connective::And => builder.and(),
                Connective::Or => builder.or(),
            };
            builder = filter.apply(builder);
        }
        builder
    }

    /// The equivalent fluent call chain, for display.
    pub fn describe(&self) -> String {
        let mut out = self.first.describe();
        for (connective, filter) in &self.rest {
            if *connective == Connective::Or {
                out.push_str(".or()");
            }
            out.push_str(&filter.describe());
        }
        out
    }
}

impl FromStr for FilterExpr {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Split a LIKE pattern into the wildcard placement and the bare text.
fn like_parts(pattern: &str) -> (&'static str, &str) {
    let leading = pattern.starts_with('%');
    let trailing = pattern.len() > 1 && pattern.ends_with('%');
    let start = usize::from(leading);
    let end = pattern.len() - usize::from(trailing);
    let text = pattern.get(start..end.max(start)).unwrap_or("");
    match (leading, trailing) {
        (true, false) => ("left", text),
        (false, true) => ("right", text),
        _ => ("contains", text),
    }
}

impl Filter {
    pub fn apply<B: Compare>(&self, builder: B) -> B {
        match self {
            Filter::Compare {
                property,
                op,
                value,
            } => {
                let value = value.clone();
                match op {
                    CompareOp::Eq => builder.eq(property, value),
                    CompareOp::Ne => builder.ne(property, value),
                    CompareOp::Gt => builder.gt(property, value),
                    CompareOp::Ge => builder.ge(property, value),
                    CompareOp::Lt => builder.lt(property, value),
                    CompareOp::Le => builder.le(property, value),
                }
            }
            Filter::Like {
                property,
                negate,
                pattern,
            } => {
                let (mode, text) = like_parts(pattern);
                match (mode, *negate) {
                    ("left", false) => builder.like_left(property, text),
                    ("left", true) => builder.not_like_left(property, text),
                    ("right", false) => builder.like_right(property, text),
                    ("right", true) => builder.not_like_right(property, text),
                    (_, false) => builder.like(property, text),
                    (_, true) => builder.not_like(property, text),
                }
            }
            Filter::In {
                property,
                negate: false,
                values,
            } => builder.in_list(property, values.iter().cloned()),
            Filter::In {
                property,
                negate: true,
                values,
            } => builder.not_in(property, values.iter().cloned()),
            Filter::Between {
                property,
                negate: false,
                low,
                high,
            } => builder.between(property, low.clone(), high.clone()),
            Filter::Between {
                property,
                negate: true,
                low,
                high,
            } => builder.not_between(property, low.clone(), high.clone()),
            Filter::Null {
                property,
                negate: false,
            } => builder.is_null(property),
            Filter::Null {
                property,
                negate: true,
            } => builder.is_not_null(property),
            Filter::Group(expr) => builder.nested(|inner| expr.apply(inner)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Filter::Compare {
                property,
                op,
                value,
            } => {
                let name = match op {
                    CompareOp::Eq => "eq",
                    CompareOp::Ne => "ne",
                    CompareOp::Gt => "gt",
                    CompareOp::Ge => "ge",
                    CompareOp::Lt => "lt",
                    CompareOp::Le => "le",
                };
                format!(".{}({:?}, {})", name, property, literal(value))
            }
            Filter::Like {
                property,
                negate,
                pattern,
            } => {
                let (mode, text) = like_parts(pattern);
                let base = match mode {
                    "left" => "like_left",
                    "right" => "like_right",
                    _ => "like",
                };
                let not = if *negate { "not_" } else { "" };
                format!(".{}{}({:?}, {:?})", not, base, property, text)
            }
            Filter::In {
                property,
                negate,
                values,
            } => {
                let list: Vec<String> = values.iter().map(literal).collect();
                let name = if *negate { "not_in" } else { "in_list" };
                format!(".{}({:?}, [{}])", name, property, list.join(", "))
            }
            Filter::Between {
                property,
                negate,
                low,
                high,
            } => {
                let name = if *negate { "not_between" } else { "between" };
                format!(".{}({:?}, {}, {})", name, property, literal(low), literal(high))
            }
            Filter::Null { property, negate } => {
                let name = if *negate { "is_not_null" } else { "is_null" };
                format!(".{}({:?})", name, property)
            }
            Filter::Group(expr) => format!(".nested(|q| q{})", expr.describe()),
        }
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("{:?}", s),
        Value::Null => "Value::Null".to_string(),
        other => other.to_string(),
    }
}

/// Parse a complete filter expression.
pub fn parse(input: &str) -> WeaveResult<FilterExpr> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WeaveError::parse(0, "empty filter expression"));
    }
    finish(trimmed, parse_expr(trimmed))
}

/// Parse `prop = value, prop = value` assignments used for SET lists and rows.
pub fn parse_assignments(input: &str) -> WeaveResult<Vec<(String, Value)>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WeaveError::parse(0, "empty assignment list"));
    }
    finish(
        trimmed,
        separated_list1(
            delimited(multispace0, char(','), multispace0),
            map(
                separated_pair(
                    parse_identifier,
                    delimited(multispace0, char('='), multispace0),
                    parse_value,
                ),
                |(property, value)| (property.to_string(), value),
            ),
        )(trimmed),
    )
}

fn finish<T>(input: &str, result: IResult<&str, T>) -> WeaveResult<T> {
    match result {
        Ok((rest, parsed)) => {
            let rest_trimmed = rest.trim_start();
            if rest_trimmed.is_empty() {
                Ok(parsed)
            } else {
                Err(WeaveError::parse(
                    input.len() - rest_trimmed.len(),
                    format!("Unexpected trailing content: '{}'", rest_trimmed),
                ))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(WeaveError::parse(
            input.len() - e.input.len(),
            format!("Parse failed near '{}'", e.input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(WeaveError::parse(input.len(), "Incomplete input")),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_ident_char)(input)
}

/// A keyword that is not the prefix of a longer word.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(word), not(peek(satisfy(is_ident_char))))
}

fn parse_expr(input: &str) -> IResult<&str, FilterExpr> {
    let (input, first) = parse_term(input)?;
    let (input, rest) = many0(pair(
        delimited(
            multispace0,
            alt((
                value(Connective::And, keyword("and")),
                value(Connective::Or, keyword("or")),
            )),
            multispace0,
        ),
        parse_term,
    ))(input)?;
    Ok((
        input,
        FilterExpr {
            first: Box::new(first),
            rest,
        },
    ))
}

fn parse_term(input: &str) -> IResult<&str, Filter> {
    alt((
        map(
            delimited(
                pair(char('('), multispace0),
                parse_expr,
                pair(multispace0, char(')')),
            ),
            Filter::Group,
        ),
        parse_condition,
    ))(input)
}

fn parse_condition(input: &str) -> IResult<&str, Filter> {
    let (input, property) = parse_identifier(input)?;
    let property = property.to_string();
    let (input, _) = multispace0(input)?;
    alt((
        map(parse_null_check, {
            let property = property.clone();
            move |negate| Filter::Null {
                property: property.clone(),
                negate,
            }
        }),
        map(
            pair(parse_negation("like"), preceded(multispace0, parse_string)),
            {
                let property = property.clone();
                move |(negate, pattern)| Filter::Like {
                    property: property.clone(),
                    negate,
                    pattern,
                }
            },
        ),
        map(pair(parse_negation("in"), preceded(multispace0, parse_list)), {
            let property = property.clone();
            move |(negate, values)| Filter::In {
                property: property.clone(),
                negate,
                values,
            }
        }),
        map(
            pair(
                parse_negation("between"),
                tuple((
                    preceded(multispace0, parse_value),
                    preceded(pair(multispace1, keyword("and")), preceded(multispace1, parse_value)),
                )),
            ),
            {
                let property = property.clone();
                move |(negate, (low, high))| Filter::Between {
                    property: property.clone(),
                    negate,
                    low,
                    high,
                }
            },
        ),
        map(
            pair(parse_compare_op, preceded(multispace0, parse_value)),
            move |(op, value)| Filter::Compare {
                property: property.clone(),
                op,
                value,
            },
        ),
    ))(input)
}

/// `is null` / `is not null`, returning whether it is negated.
fn parse_null_check(input: &str) -> IResult<&str, bool> {
    let (input, _) = keyword("is")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, negate) = opt(terminated(keyword("not"), multispace1))(input)?;
    let (input, _) = keyword("null")(input)?;
    Ok((input, negate.is_some()))
}

/// `word` or `not word`, returning whether it is negated.
fn parse_negation<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, bool> {
    move |input: &'a str| {
        let (input, negate) = opt(terminated(keyword("not"), multispace1))(input)?;
        let (input, _) = keyword(word)(input)?;
        Ok((input, negate.is_some()))
    }
}

fn parse_compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Ne, tag("<>")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Gt, char('>')),
        value(CompareOp::Lt, char('<')),
        value(CompareOp::Eq, char('=')),
    ))(input)
}

fn parse_list(input: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        pair(char('('), multispace0),
        separated_list1(delimited(multispace0, char(','), multispace0), parse_value),
        pair(multispace0, char(')')),
    )(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Null, keyword("null")),
        value(Value::Bool(true), keyword("true")),
        value(Value::Bool(false), keyword("false")),
        parse_number,
        map(parse_string, Value::Text),
    ))(input)
}

/// Integers become `Int` when they fit in 32 bits, decimals stay exact.
fn parse_number(input: &str) -> IResult<&str, Value> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |text: &str| -> Result<Value, String> {
            if text.contains('.') {
                return Decimal::from_str(text)
                    .map(Value::Decimal)
                    .map_err(|e| e.to_string());
            }
            let n: i64 = text.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
            Ok(i32::try_from(n).map(Value::Int).unwrap_or(Value::BigInt(n)))
        },
    )(input)
}

/// Single-quoted string; `''` escapes a quote.
fn parse_string(input: &str) -> IResult<&str, String> {
    delimited(
        char('\''),
        map(
            many0(alt((value('\'', tag("''")), none_of("'")))),
            |chars: Vec<char>| chars.into_iter().collect::<String>(),
        ),
        char('\''),
    )(input)
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
