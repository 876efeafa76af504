//! # Filter Expression Parser
//!
//! nom parsers turning filter text into an [`Expression`]. Keywords are case
//! insensitive; precedence from loosest to tightest is `OR`, `AND`, `NOT`,
//! then comparisons.
//!
//! ```text
//! or_expr    := and_expr ( "OR" and_expr )*
//! and_expr   := unary ( "AND" unary )*
//! unary      := "NOT" unary | "(" or_expr ")" | comparison
//! comparison := operand [ "NOT" ] "BETWEEN" operand "AND" operand
//!             | operand cmp_op operand
//! cmp_op     := "=" | "<>" | "!=" | "<" | "<=" | ">" | ">=" | "LIKE" | "MATCH"
//! operand    := parameter | literal | fieldname
//! fieldname  := identifier ( "." identifier | "[" integer "]" )*
//! parameter  := "%" integer
//! ```

pub mod error;
pub mod literal;

pub use error::ParseError;
pub use literal::parse_literal_value;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, cut, map, map_res, not, opt, recognize, value, verify},
    error::context,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use nom_locate::{position, LocatedSpan};
use tracing::instrument;

use self::error::SyntaxFault;
use self::literal::parse_literal;
use crate::ast::{ComparisonOperator, Expression, FieldName, Operand, PathSegment, Subscript};

pub type Span<'a> = LocatedSpan<&'a str>;

pub(crate) type PResult<'a, O> = IResult<Span<'a>, O, SyntaxFault<'a>>;

const RESERVED_KEYWORDS: &[&str] = &[
    "AND", "OR", "NOT", "BETWEEN", "LIKE", "MATCH", "TRUE", "FALSE",
];

/// Parses a complete filter expression.
#[instrument(level = "debug", skip(input))]
pub fn parse_filter_expression(input: &str) -> Result<Expression, ParseError> {
    match all_consuming(ws(parse_or))(Span::new(input)) {
        Ok((_, expression)) => Ok(expression),
        Err(nom::Err::Error(fault)) | Err(nom::Err::Failure(fault)) => Err(fault.into()),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Syntax {
            position: input.len(),
            message: "incomplete expression".to_string(),
        }),
    }
}

pub(crate) fn ws<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> PResult<'a, O>
where
    F: FnMut(Span<'a>) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Case insensitive keyword that is not the prefix of a longer identifier.
pub(crate) fn keyword<'a>(word: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, Span<'a>> {
    terminated(tag_no_case(word), not(satisfy(is_identifier_char)))
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_reserved(word: &str) -> bool {
    RESERVED_KEYWORDS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(word))
}

#[instrument(level = "debug", skip(input))]
fn parse_or(input: Span) -> PResult<Expression> {
    let (input, first) = parse_and(input)?;
    let (input, rest) = many0(preceded(
        ws(keyword("OR")),
        cut(context("expression", parse_and)),
    ))(input)?;
    Ok((input, rest.into_iter().fold(first, Expression::or)))
}

#[instrument(level = "debug", skip(input))]
fn parse_and(input: Span) -> PResult<Expression> {
    let (input, first) = parse_unary(input)?;
    let (input, rest) = many0(preceded(
        ws(keyword("AND")),
        cut(context("expression", parse_unary)),
    ))(input)?;
    Ok((input, rest.into_iter().fold(first, Expression::and)))
}

fn parse_unary(input: Span) -> PResult<Expression> {
    alt((
        map(
            preceded(ws(keyword("NOT")), cut(context("expression", parse_unary))),
            Expression::negate,
        ),
        delimited(
            ws(char('(')),
            cut(parse_or),
            cut(context("')'", ws(char(')')))),
        ),
        parse_comparison,
    ))(input)
}

#[instrument(level = "debug", skip(input))]
fn parse_comparison(input: Span) -> PResult<Expression> {
    let (input, left) = ws(parse_operand)(input)?;

    let (input, between) = opt(terminated(
        opt(ws(keyword("NOT"))),
        ws(keyword("BETWEEN")),
    ))(input)?;
    if let Some(negated) = between {
        let (input, (lower, _, upper)) = cut(tuple((
            context("operand", ws(parse_operand)),
            context("AND", ws(keyword("AND"))),
            context("operand", ws(parse_operand)),
        )))(input)?;
        return Ok((
            input,
            Expression::Between {
                operand: left,
                lower,
                upper,
                negated: negated.is_some(),
            },
        ));
    }

    let (input, op) = cut(context("comparison operator", ws(parse_comparison_operator)))(input)?;
    let (input, right) = cut(context("operand", ws(parse_operand)))(input)?;
    Ok((input, Expression::Comparison { op, left, right }))
}

fn parse_comparison_operator(input: Span) -> PResult<ComparisonOperator> {
    alt((
        value(ComparisonOperator::LessThanEqual, tag("<=")),
        value(ComparisonOperator::GreaterThanEqual, tag(">=")),
        value(ComparisonOperator::NotEqual, tag("<>")),
        value(ComparisonOperator::NotEqual, tag("!=")),
        value(ComparisonOperator::Equal, tag("=")),
        value(ComparisonOperator::LessThan, tag("<")),
        value(ComparisonOperator::GreaterThan, tag(">")),
        value(ComparisonOperator::Like, keyword("LIKE")),
        value(ComparisonOperator::Match, keyword("MATCH")),
    ))(input)
}

fn parse_operand(input: Span) -> PResult<Operand> {
    context(
        "operand",
        alt((
            parse_parameter_ref,
            parse_literal,
            map(parse_field_name, Operand::Field),
        )),
    )(input)
}

fn parse_parameter_ref(input: Span) -> PResult<Operand> {
    let (input, start) = position(input)?;
    let (input, index) = preceded(
        char('%'),
        cut(context(
            "parameter index",
            map_res(digit1, |digits: Span| digits.fragment().parse::<usize>()),
        )),
    )(input)?;
    Ok((
        input,
        Operand::Parameter {
            index,
            position: start.location_offset(),
        },
    ))
}

fn identifier(input: Span) -> PResult<Span> {
    verify(
        recognize(pair(
            satisfy(is_identifier_start),
            take_while(is_identifier_char),
        )),
        |word: &Span| !is_reserved(word.fragment()),
    )(input)
}

fn parse_field_name(input: Span) -> PResult<FieldName> {
    let (input, first) = parse_path_segment(input)?;
    let (input, rest) = many0(preceded(
        char('.'),
        cut(context("member name", parse_path_segment)),
    ))(input)?;
    let mut segments = Vec::with_capacity(rest.len() + 1);
    segments.push(first);
    segments.extend(rest);
    Ok((input, FieldName::new(segments)))
}

fn parse_path_segment(input: Span) -> PResult<PathSegment> {
    let (input, name) = identifier(input)?;
    let (input, subscripts) = many0(parse_subscript)(input)?;
    Ok((
        input,
        PathSegment {
            name: name.fragment().to_string(),
            position: name.location_offset(),
            subscripts,
        },
    ))
}

fn parse_subscript(input: Span) -> PResult<Subscript> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, start) = position(input)?;
    let (input, index) = cut(context(
        "array index",
        map_res(digit1, |digits: Span| digits.fragment().parse::<usize>()),
    ))(input)?;
    let (input, _) = cut(context("']'", preceded(multispace0, char(']'))))(input)?;
    Ok((
        input,
        Subscript {
            index,
            position: start.location_offset(),
        },
    ))
}
