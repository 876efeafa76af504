use content_filter::{
    ast::{ComparisonOperator, Expression, Operand},
    parse_filter_expression, parse_literal_value, Datum, ParseError,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn it_parses_filter_expression() {
    let input = r#"
        count > %0
        AND (data.names[0] = 'first' OR NOT flag = TRUE)
        AND ratio BETWEEN -1.5 AND 2e3
        AND label LIKE 'sensor_%'
    "#;
    let expression = parse_filter_expression(input).unwrap();
    assert_eq!(
        expression.to_string(),
        "(((count > %0 AND (data.names[0] = 'first' OR NOT (flag = TRUE))) \
         AND ratio BETWEEN -1.5 AND 2000.0) AND label LIKE 'sensor_%')"
    );

    let fields: Vec<String> = expression_fields(&expression);
    assert_eq!(fields, vec!["count", "data.names[0]", "flag", "ratio", "label"]);
}

#[test]
fn it_reports_error_offsets() {
    let text = "count > 1 AND (flag = TRUE";
    let error = parse_filter_expression(text).unwrap_err();
    assert_eq!(error.position(), text.len());

    let error = parse_filter_expression("count >> 1").unwrap_err();
    assert!(matches!(error, ParseError::Syntax { position: 7, .. }));

    let error = parse_filter_expression("").unwrap_err();
    assert_eq!(error.position(), 0);
}

#[test]
fn it_parses_parameter_strings_with_the_literal_grammar() {
    assert_eq!(parse_literal_value("4"), Ok(Datum::UnsignedInteger(4)));
    assert_eq!(parse_literal_value("-4"), Ok(Datum::SignedInteger(-4)));
    assert_eq!(parse_literal_value("'a'"), Ok(Datum::Char(b'a')));
    assert_eq!(
        parse_literal_value("'abc'"),
        Ok(Datum::String("abc".to_string()))
    );
    assert_eq!(parse_literal_value("false"), Ok(Datum::Boolean(false)));
    assert!(parse_literal_value("abc").is_err());
    assert!(parse_literal_value("%0").is_err());
}

#[test]
fn it_keeps_literal_positions() {
    let Expression::Comparison { op, right, .. } = parse_filter_expression("name MATCH 'a+'").unwrap()
    else {
        panic!("expected comparison");
    };
    assert_eq!(op, ComparisonOperator::Match);
    assert_eq!(right.position(), 11);
}

fn expression_fields(expression: &Expression) -> Vec<String> {
    expression
        .operands()
        .into_iter()
        .filter_map(|operand| match operand {
            Operand::Field(name) => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_integer_literals_parse_back(value in any::<i64>()) {
        let parsed = parse_literal_value(&value.to_string()).unwrap();
        let expected = if value < 0 {
            Datum::SignedInteger(value)
        } else {
            Datum::UnsignedInteger(value.unsigned_abs())
        };
        prop_assert_eq!(parsed, expected);
    }

    #[test]
    fn prop_datum_display_parses_back(value in any::<i64>(), text in "[a-z ]{2,40}") {
        for datum in [Datum::SignedInteger(value), Datum::String(text.clone())] {
            let reparsed = parse_literal_value(&datum.to_string()).unwrap();
            prop_assert_eq!(reparsed.compare(&datum), Some(std::cmp::Ordering::Equal));
        }
    }
}
