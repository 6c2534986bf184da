//! Unit string parsing - expressions like "km/h", "kg*m/s^2" or "m²"
//!
//! Supported forms:
//! - Simple: "m", "kilogram", "degC"
//! - Powers: "m^2", "s**-1", "m ** (1/2)", "m²", "s⁻¹"
//! - Products: "kg*m", "N·m", "kilogram meter"
//! - Quotients: "m/s", "kg/m^2"
//! - Numbers: "0.01 * count", "5 / 9 * kelvin" (definitions only)
//! - Grouping: "J / (kg * K)"

use num_traits::{CheckedDiv, Zero};
use crate::{Decomposition, Exponent, UnitError};

/// Unit expression after parsing: numeric scale times a decomposition
/// of canonical unit names.
pub type Parsed = (f64, Decomposition);

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64, String),
    Ident(String),
    Mul,
    Div,
    Pow,
    Minus,
    LParen,
    RParen,
    Superscript(i64),
}

const SUPERSCRIPTS: [(char, char); 11] = [
    ('⁰', '0'), ('¹', '1'), ('²', '2'), ('³', '3'), ('⁴', '4'),
    ('⁵', '5'), ('⁶', '6'), ('⁷', '7'), ('⁸', '8'), ('⁹', '9'),
    ('⁻', '-'),
];

fn superscript_ascii(c: char) -> Option<char> {
    SUPERSCRIPTS.iter().find(|(s, _)| *s == c).map(|(_, a)| *a)
}

fn is_ident_start(c: char) -> bool {
    (c.is_alphabetic() || c == '_') && superscript_ascii(c).is_none()
}

fn is_ident_continue(c: char) -> bool {
    (c.is_alphanumeric() || c == '_') && superscript_ascii(c).is_none()
}

fn tokenize(input: &str) -> Result<Vec<Token>, UnitError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' | '·' | '⋅' => {
                tokens.push(Token::Mul);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Div);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if superscript_ascii(c).is_some() => {
                let mut text = String::new();
                while let Some(a) = chars.get(i).and_then(|&c| superscript_ascii(c)) {
                    text.push(a);
                    i += 1;
                }
                let exp = text.parse::<i64>()
                    .map_err(|_| UnitError::parse(input, format!("invalid superscript exponent '{}'", text)))?;
                tokens.push(Token::Superscript(exp));
            }
            c if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).map_or(false, |d| d.is_ascii_digit())) => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: only when an exponent actually follows
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>()
                    .map_err(|_| UnitError::parse(input, format!("invalid number '{}'", text)))?;
                tokens.push(Token::Number(value, text));
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(UnitError::parse(input, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

/// Raise a scale factor to a rational power
pub(crate) fn pow_scale(scale: f64, exp: Exponent) -> f64 {
    let small = exp.is_integer().then(|| i32::try_from(exp.to_integer()).ok()).flatten();
    if let Some(n) = small {
        scale.powi(n)
    } else {
        scale.powf(*exp.numer() as f64 / *exp.denom() as f64)
    }
}

/// Parse an exponent literal such as "2", "0.5" or "1.25"
fn exponent_literal(text: &str) -> Option<Exponent> {
    if text.contains(['e', 'E']) {
        return None;
    }
    match text.split_once('.') {
        None => text.parse::<i64>().ok().map(Exponent::from_integer),
        Some((whole, frac)) => {
            let digits = format!("{}{}", whole, frac);
            let numer = digits.parse::<i64>().ok()?;
            let denom = 10i64.checked_pow(frac.len() as u32)?;
            Some(Exponent::new(numer, denom))
        }
    }
}

struct Parser<'a, R> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    resolve: R,
}

impl<'a, R> Parser<'a, R>
where
    R: Fn(&str) -> Result<String, UnitError>,
{
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn error(&self, reason: impl Into<String>) -> UnitError {
        UnitError::parse(self.input, reason)
    }

    fn overflow(&self) -> UnitError {
        self.error("exponent overflow")
    }

    fn expect_rparen(&mut self) -> Result<(), UnitError> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            _ => Err(self.error("missing closing parenthesis")),
        }
    }

    /// product := power (('*' | '/' | juxtaposition) power)*
    fn parse_product(&mut self) -> Result<Parsed, UnitError> {
        let (mut scale, mut units) = self.parse_power()?;
        loop {
            match self.peek() {
                Some(Token::Mul) => {
                    self.pos += 1;
                    let (s, u) = self.parse_power()?;
                    scale *= s;
                    units = units.multiply(&u).map_err(|_| self.overflow())?;
                }
                Some(Token::Div) => {
                    self.pos += 1;
                    let (s, u) = self.parse_power()?;
                    scale /= s;
                    units = units.divide(&u).map_err(|_| self.overflow())?;
                }
                Some(Token::Number(..)) | Some(Token::Ident(_)) | Some(Token::LParen) => {
                    let (s, u) = self.parse_power()?;
                    scale *= s;
                    units = units.multiply(&u).map_err(|_| self.overflow())?;
                }
                _ => return Ok((scale, units)),
            }
        }
    }

    /// power := atom (('**' | '^') exponent | superscript)?
    fn parse_power(&mut self) -> Result<Parsed, UnitError> {
        let (scale, units) = self.parse_atom()?;
        let exp = match self.peek() {
            Some(Token::Pow) => {
                self.pos += 1;
                self.parse_exponent()?
            }
            Some(Token::Superscript(n)) => {
                let n = *n;
                self.pos += 1;
                Exponent::from_integer(n)
            }
            _ => return Ok((scale, units)),
        };
        let units = units.power(exp).map_err(|_| self.overflow())?;
        Ok((pow_scale(scale, exp), units))
    }

    /// exponent := '-'? number | '(' '-'? number ('/' number)? ')'
    fn parse_exponent(&mut self) -> Result<Exponent, UnitError> {
        if let Some(Token::LParen) = self.peek() {
            self.pos += 1;
            let mut exp = self.parse_signed_literal()?;
            if let Some(Token::Div) = self.peek() {
                self.pos += 1;
                let denom = self.parse_signed_literal()?;
                if denom.is_zero() {
                    return Err(self.error("zero denominator in exponent"));
                }
                exp = exp.checked_div(&denom).ok_or_else(|| self.overflow())?;
            }
            self.expect_rparen()?;
            return Ok(exp);
        }
        self.parse_signed_literal()
    }

    fn parse_signed_literal(&mut self) -> Result<Exponent, UnitError> {
        let negative = if let Some(Token::Minus) = self.peek() {
            self.pos += 1;
            true
        } else {
            false
        };
        let exp = match self.next() {
            Some(Token::Number(_, text)) => exponent_literal(&text)
                .ok_or_else(|| self.error(format!("invalid exponent '{}'", text)))?,
            _ => return Err(self.error("expected a numeric exponent")),
        };
        Ok(if negative { -exp } else { exp })
    }

    /// atom := number | identifier | '(' product ')'
    fn parse_atom(&mut self) -> Result<Parsed, UnitError> {
        match self.next() {
            Some(Token::Number(value, _)) => Ok((value, Decomposition::new())),
            Some(Token::Ident(name)) => {
                if name == "dimensionless" {
                    return Ok((1.0, Decomposition::new()));
                }
                let canonical = (self.resolve)(&name)?;
                Ok((1.0, Decomposition::single(canonical)))
            }
            Some(Token::LParen) => {
                let inner = self.parse_product()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(tok) => Err(self.error(format!("unexpected token {:?}", tok))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// Parse a unit expression, mapping every identifier through `resolve`
/// to its canonical name.
///
/// The empty string is the dimensionless unit.
pub fn parse_expression<R>(input: &str, resolve: R) -> Result<Parsed, UnitError>
where
    R: Fn(&str) -> Result<String, UnitError>,
{
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok((1.0, Decomposition::new()));
    }

    let mut parser = Parser { input, tokens, pos: 0, resolve };
    let parsed = parser.parse_product()?;
    if let Some(tok) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing token {:?}", tok)));
    }
    Ok(parsed)
}

/// Check whether an expression is a single bare identifier
pub(crate) fn is_bare_identifier(input: &str) -> bool {
    let s = input.trim();
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

/// Split a quantity string like "5 m" or "-3.5e2 kg/s" into its magnitude
/// and unit text.
pub fn parse_quantity_string(s: &str) -> Result<(f64, &str), UnitError> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0;

    while end < bytes.len() {
        let c = bytes[end] as char;
        let accept = match c {
            '0'..='9' | '.' => true,
            '+' | '-' => end == 0 || matches!(bytes[end - 1], b'e' | b'E'),
            'e' | 'E' => end > 0 && bytes.get(end + 1).map_or(false, |&n| n.is_ascii_digit() || n == b'+' || n == b'-'),
            _ => false,
        };
        if !accept {
            break;
        }
        end += 1;
    }

    if end == 0 {
        return Err(UnitError::parse(s, "no number found"));
    }

    let value = s[..end].parse::<f64>()
        .map_err(|_| UnitError::parse(s, format!("invalid number: {}", &s[..end])))?;
    Ok((value, s[end..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Identity resolver: every identifier is its own canonical name
    fn parse(s: &str) -> Parsed {
        parse_expression(s, |name| Ok(name.to_string())).unwrap()
    }

    fn unit(pairs: &[(&str, i64)]) -> Decomposition {
        Decomposition::from_factors(pairs.iter().map(|(n, e)| (*n, Exponent::from_integer(*e)))).unwrap()
    }

    #[test]
    fn test_parse_simple_unit() {
        assert_eq!(parse("m"), (1.0, unit(&[("m", 1)])));
        assert_eq!(parse(""), (1.0, Decomposition::new()));
        assert_eq!(parse("dimensionless"), (1.0, Decomposition::new()));
    }

    #[test]
    fn test_parse_powers() {
        assert_eq!(parse("m^2").1, unit(&[("m", 2)]));
        assert_eq!(parse("s**-1").1, unit(&[("s", -1)]));
        assert_eq!(parse("m²").1, unit(&[("m", 2)]));
        assert_eq!(parse("s⁻¹").1, unit(&[("s", -1)]));
        assert_eq!(parse("m ** (1/2)").1.get("m"), Some(Exponent::new(1, 2)));
        assert_eq!(parse("m ** 0.5").1.get("m"), Some(Exponent::new(1, 2)));
    }

    #[test]
    fn test_parse_products_and_quotients() {
        assert_eq!(parse("kg*m/s^2").1, unit(&[("kg", 1), ("m", 1), ("s", -2)]));
        assert_eq!(parse("N·m").1, unit(&[("N", 1), ("m", 1)]));
        assert_eq!(parse("kilogram meter").1, unit(&[("kilogram", 1), ("meter", 1)]));
        assert_eq!(parse("J / (kg * K)").1, unit(&[("J", 1), ("kg", -1), ("K", -1)]));
        // left associative
        assert_eq!(parse("m / s / s").1, unit(&[("m", 1), ("s", -2)]));
    }

    #[test]
    fn test_parse_numbers() {
        let (scale, units) = parse("0.01 * count");
        assert_eq!(scale, 0.01);
        assert_eq!(units, unit(&[("count", 1)]));

        let (scale, _) = parse("5 / 9 * kelvin");
        assert!((scale - 5.0 / 9.0).abs() < 1e-15);

        let (scale, _) = parse("1e-3 m");
        assert_eq!(scale, 1e-3);
    }

    #[test]
    fn test_parse_errors() {
        let identity = |name: &str| Ok(name.to_string());
        assert!(matches!(parse_expression("m /", identity), Err(UnitError::Parse { .. })));
        assert!(matches!(parse_expression("(m", identity), Err(UnitError::Parse { .. })));
        assert!(matches!(parse_expression("m ** x", identity), Err(UnitError::Parse { .. })));
        assert!(matches!(parse_expression("m $", identity), Err(UnitError::Parse { .. })));

        let strict = |name: &str| Err(UnitError::UndefinedUnit(name.to_string()));
        assert_eq!(parse_expression("foo", strict), Err(UnitError::UndefinedUnit("foo".into())));
    }

    #[test]
    fn test_exponent_overflow_is_a_parse_error() {
        let identity = |name: &str| Ok(name.to_string());
        let err = parse_expression("(m ** 9223372036854775807) ** 2", identity).unwrap_err();
        assert_eq!(err, UnitError::parse("(m ** 9223372036854775807) ** 2", "exponent overflow"));
        assert!(parse_expression("m ** 9223372036854775807 * m", identity).is_err());
        assert!(parse_expression("m ** (1/9223372036854775807) * m ** (1/9223372036854775806)", identity).is_err());
        assert!(parse_expression("m ** 9223372036854775807", identity).is_ok());
    }

    #[test]
    fn test_pow_scale_large_exponents() {
        assert_eq!(pow_scale(10.0, Exponent::from_integer(3)), 1000.0);
        assert_eq!(pow_scale(1000.0, Exponent::from_integer(4_294_967_296)), f64::INFINITY);
        assert_eq!(pow_scale(1e-3, Exponent::from_integer(4_294_967_296)), 0.0);
        assert_eq!(pow_scale(2.0, Exponent::from_integer(-4_294_967_296)), 0.0);
        assert!((pow_scale(4.0, Exponent::new(1, 2)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bare_identifier() {
        assert!(is_bare_identifier("degree_north"));
        assert!(!is_bare_identifier("0.01 * count"));
        assert!(!is_bare_identifier("meter / second"));
    }

    #[test]
    fn test_parse_quantity_string() {
        assert_eq!(parse_quantity_string("5 m").unwrap(), (5.0, "m"));
        assert_eq!(parse_quantity_string("100kg").unwrap(), (100.0, "kg"));
        assert_eq!(parse_quantity_string("-3.14 rad").unwrap(), (-3.14, "rad"));
        assert_eq!(parse_quantity_string("2.5e3 meter").unwrap(), (2500.0, "meter"));
        assert_eq!(parse_quantity_string("7").unwrap(), (7.0, ""));
        assert!(parse_quantity_string("meter").is_err());
    }
}
