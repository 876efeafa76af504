use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_till},
    character::complete::{char, digit1, hex_digit1, one_of},
    combinator::{all_consuming, cut, opt, recognize, value},
    error::context,
    sequence::{delimited, pair, preceded, tuple},
};
use nom_locate::position;
use tracing::instrument;

use super::{
    error::{FaultKind, ParseError, SyntaxFault},
    keyword, ws, PResult, Span,
};
use crate::{ast::Operand, value::Datum, value::MAX_STRING_LENGTH};

/// Parses a literal operand, remembering where it starts.
pub(crate) fn parse_literal(input: Span) -> PResult<Operand> {
    let (input, start) = position(input)?;
    let (input, value) = parse_datum(input)?;
    Ok((
        input,
        Operand::Literal {
            value,
            position: start.location_offset(),
        },
    ))
}

/// Parses one externally supplied parameter string with the literal grammar.
#[instrument(level = "debug", skip(input))]
pub fn parse_literal_value(input: &str) -> Result<Datum, ParseError> {
    match all_consuming(ws(parse_datum))(Span::new(input)) {
        Ok((_, datum)) => Ok(datum),
        Err(nom::Err::Error(fault)) | Err(nom::Err::Failure(fault)) => Err(fault.into()),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Syntax {
            position: input.len(),
            message: "incomplete literal".to_string(),
        }),
    }
}

fn parse_datum(input: Span) -> PResult<Datum> {
    alt((
        parse_boolean,
        parse_hex_integer,
        parse_float,
        parse_integer,
        parse_quoted,
    ))(input)
}

fn parse_boolean(input: Span) -> PResult<Datum> {
    alt((
        value(Datum::Boolean(true), keyword("TRUE")),
        value(Datum::Boolean(false), keyword("FALSE")),
    ))(input)
}

fn parse_hex_integer(input: Span) -> PResult<Datum> {
    let (rest, (sign, digits)) = pair(
        opt(one_of("+-")),
        preceded(tag_no_case("0x"), cut(context("hexadecimal digits", hex_digit1))),
    )(input)?;
    let datum = integer_datum(sign == Some('-'), digits.fragment(), 16)
        .ok_or_else(|| nom::Err::Failure(SyntaxFault::new(input, FaultKind::InvalidNumber)))?;
    Ok((rest, datum))
}

fn parse_exponent(input: Span) -> PResult<Span> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

// digits followed by a fraction, an exponent, or both
fn parse_float(input: Span) -> PResult<Datum> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        alt((
            recognize(pair(preceded(char('.'), digit1), opt(parse_exponent))),
            parse_exponent,
        )),
    )))(input)?;
    let out_of_range = || nom::Err::Failure(SyntaxFault::new(input, FaultKind::InvalidNumber));
    let number = text
        .fragment()
        .parse::<f64>()
        .map_err(|_| out_of_range())?;
    // Overflow parses as infinity, which has no literal form
    if !number.is_finite() {
        return Err(out_of_range());
    }
    Ok((rest, Datum::FloatingPoint(number)))
}

fn parse_integer(input: Span) -> PResult<Datum> {
    let (rest, (sign, digits)) = pair(opt(one_of("+-")), digit1)(input)?;
    let datum = integer_datum(sign == Some('-'), digits.fragment(), 10)
        .ok_or_else(|| nom::Err::Failure(SyntaxFault::new(input, FaultKind::InvalidNumber)))?;
    Ok((rest, datum))
}

// Textually negative integers are signed, all others unsigned
fn integer_datum(negative: bool, digits: &str, radix: u32) -> Option<Datum> {
    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        let signed = i64::try_from(-i128::from(magnitude)).ok()?;
        Some(Datum::SignedInteger(signed))
    } else {
        Some(Datum::UnsignedInteger(magnitude))
    }
}

fn parse_quoted(input: Span) -> PResult<Datum> {
    let (rest, body) = delimited(
        char('\''),
        take_till(|c| c == '\''),
        cut(context("closing quote", char('\''))),
    )(input)?;
    let text = *body.fragment();
    if text.len() > MAX_STRING_LENGTH {
        return Err(nom::Err::Failure(SyntaxFault::new(
            input,
            FaultKind::LiteralTooLong(text.len()),
        )));
    }
    let datum = match text.as_bytes() {
        [byte] => Datum::Char(*byte),
        _ => Datum::String(text.to_string()),
    };
    Ok((rest, datum))
}
