//! printf-style rendering of message templates.
//!
//! Templates are only ever interpreted here: conversions consume values
//! from an explicit argument slice and any mismatch between the two is
//! reported as a [`FormatError`] instead of reading past the arguments.
//!
//! Supported: conversions `d i u o x X f F e E g G s c @ %`, flags
//! `- + space 0 #`, field width, precision, `*` for either, and the C
//! length modifiers (`h l ll q z j t L`), which are accepted and ignored.

use crate::error::FormatError;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A single value substituted into a message template.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
}

impl FormatArg {
    fn kind(&self) -> &'static str {
        match self {
            FormatArg::Int(_) => "integer",
            FormatArg::UInt(_) => "unsigned integer",
            FormatArg::Float(_) => "float",
            FormatArg::Str(_) => "string",
            FormatArg::Char(_) => "char",
            FormatArg::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatArg::Int(v) => write!(f, "{v}"),
            FormatArg::UInt(v) => write!(f, "{v}"),
            FormatArg::Float(v) => write!(f, "{v}"),
            FormatArg::Str(v) => f.write_str(v),
            FormatArg::Char(v) => write!(f, "{v}"),
            FormatArg::Bool(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_arg {
    ($variant:ident as $target:ty: $($t:ty),+) => {
        $(impl From<$t> for FormatArg {
            fn from(v: $t) -> Self {
                FormatArg::$variant(v as $target)
            }
        })+
    };
}

impl_from_arg!(Int as i64: i8, i16, i32, i64, isize);
impl_from_arg!(UInt as u64: u8, u16, u32, u64, usize);
impl_from_arg!(Float as f64: f32, f64);

impl From<&str> for FormatArg {
    fn from(v: &str) -> Self {
        FormatArg::Str(v.to_string())
    }
}

impl From<String> for FormatArg {
    fn from(v: String) -> Self {
        FormatArg::Str(v)
    }
}

impl From<&String> for FormatArg {
    fn from(v: &String) -> Self {
        FormatArg::Str(v.clone())
    }
}

impl From<char> for FormatArg {
    fn from(v: char) -> Self {
        FormatArg::Char(v)
    }
}

impl From<bool> for FormatArg {
    fn from(v: bool) -> Self {
        FormatArg::Bool(v)
    }
}

/// Build a `Vec<FormatArg>` from heterogeneous values.
///
/// ```
/// use loggly_sink::fargs;
/// let args = fargs![42, "disk", 0.5];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! fargs {
    () => {
        ::std::vec::Vec::<$crate::format::FormatArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::format::FormatArg::from($arg)),+]
    };
}

/// Largest field width or precision a template may ask for.
pub const MAX_FIELD_WIDTH: usize = 4096;

const CONVERSIONS: &str = "diuoxXfFeEgGsc@%";
const LENGTH_MODIFIERS: &str = "hlqzjtL";

#[derive(Debug, Default)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Render `template` against `args` with C printf semantics.
///
/// Arguments left over after the last conversion are ignored.
pub fn format_message(template: &str, args: &[FormatArg]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.alt = true,
                _ => break,
            }
            chars.next();
        }

        if chars.peek() == Some(&'*') {
            chars.next();
            let width = star_value(args, &mut next_arg)?;
            if width < 0 {
                spec.left = true;
            }
            spec.width = Some(bounded(width.unsigned_abs())?);
        } else {
            spec.width = take_number(&mut chars).map(bounded).transpose()?;
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            if chars.peek() == Some(&'*') {
                chars.next();
                let precision = star_value(args, &mut next_arg)?;
                // A negative precision counts as omitted.
                spec.precision = match u64::try_from(precision) {
                    Ok(p) => Some(bounded(p)?),
                    Err(_) => None,
                };
            } else {
                spec.precision = Some(bounded(take_number(&mut chars).unwrap_or(0))?);
            }
        }

        while chars.peek().is_some_and(|c| LENGTH_MODIFIERS.contains(*c)) {
            chars.next();
        }

        let conversion = chars.next().ok_or(FormatError::Truncated)?;
        if !CONVERSIONS.contains(conversion) {
            return Err(FormatError::UnsupportedConversion(conversion));
        }
        if conversion == '%' {
            out.push('%');
            continue;
        }

        let index = next_arg;
        let arg = args
            .get(index)
            .ok_or(FormatError::MissingArgument { index, conversion })?;
        next_arg += 1;

        out.push_str(&render(conversion, &spec, arg, index)?);
    }

    Ok(out)
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> Option<u64> {
    let mut value: Option<u64> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = Some(
            value
                .unwrap_or(0)
                .saturating_mul(10)
                .saturating_add(u64::from(digit)),
        );
    }
    value
}

/// Reject widths and precisions above [`MAX_FIELD_WIDTH`] before anything
/// is allocated for them.
fn bounded(value: u64) -> Result<usize, FormatError> {
    match usize::try_from(value) {
        Ok(v) if v <= MAX_FIELD_WIDTH => Ok(v),
        _ => Err(FormatError::FieldTooLarge {
            value,
            limit: MAX_FIELD_WIDTH,
        }),
    }
}

fn star_value(args: &[FormatArg], next_arg: &mut usize) -> Result<i64, FormatError> {
    let index = *next_arg;
    let arg = args.get(index).ok_or(FormatError::MissingArgument {
        index,
        conversion: '*',
    })?;
    *next_arg += 1;
    match arg {
        FormatArg::Int(v) => Ok(*v),
        FormatArg::UInt(v) => Ok(i64::try_from(*v).unwrap_or(i64::MAX)),
        other => Err(FormatError::TypeMismatch {
            index,
            conversion: '*',
            found: other.kind(),
        }),
    }
}

fn render(conversion: char, spec: &Spec, arg: &FormatArg, index: usize) -> Result<String, FormatError> {
    let mismatch = || FormatError::TypeMismatch {
        index,
        conversion,
        found: arg.kind(),
    };

    match conversion {
        'd' | 'i' => {
            let value: i128 = match arg {
                FormatArg::Int(v) => *v as i128,
                FormatArg::UInt(v) => *v as i128,
                FormatArg::Bool(v) => *v as i128,
                FormatArg::Char(v) => *v as u32 as i128,
                _ => return Err(mismatch()),
            };
            let sign = if value < 0 {
                "-"
            } else if spec.plus {
                "+"
            } else if spec.space {
                " "
            } else {
                ""
            };
            let digits = with_precision(value.unsigned_abs().to_string(), spec.precision, value == 0);
            Ok(pad(sign, &digits, spec, spec.precision.is_none()))
        }
        'u' | 'o' | 'x' | 'X' => {
            let value: u64 = match arg {
                // Negative values are reinterpreted the way C does.
                FormatArg::Int(v) => *v as u64,
                FormatArg::UInt(v) => *v,
                FormatArg::Bool(v) => *v as u64,
                FormatArg::Char(v) => *v as u64,
                _ => return Err(mismatch()),
            };
            let raw = match conversion {
                'o' => format!("{value:o}"),
                'x' => format!("{value:x}"),
                'X' => format!("{value:X}"),
                _ => value.to_string(),
            };
            let mut digits = with_precision(raw, spec.precision, value == 0);
            let mut prefix = "";
            if spec.alt {
                match conversion {
                    'o' if !digits.starts_with('0') => digits.insert(0, '0'),
                    'x' if value != 0 => prefix = "0x",
                    'X' if value != 0 => prefix = "0X",
                    _ => {}
                }
            }
            Ok(pad(prefix, &digits, spec, spec.precision.is_none()))
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let value = match arg {
                FormatArg::Float(v) => *v,
                FormatArg::Int(v) => *v as f64,
                FormatArg::UInt(v) => *v as f64,
                _ => return Err(mismatch()),
            };
            Ok(render_float(conversion, spec, value))
        }
        's' | '@' => {
            let text = match (conversion, arg) {
                (_, FormatArg::Str(s)) => s.clone(),
                (_, FormatArg::Char(c)) => c.to_string(),
                ('@', other) => other.to_string(),
                _ => return Err(mismatch()),
            };
            let text = match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            };
            Ok(pad("", &text, spec, false))
        }
        'c' => {
            let c = match arg {
                FormatArg::Char(c) => *c,
                FormatArg::Int(v) => u32::try_from(*v)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(mismatch)?,
                FormatArg::UInt(v) => u32::try_from(*v)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(mismatch)?,
                _ => return Err(mismatch()),
            };
            Ok(pad("", &c.to_string(), spec, false))
        }
        other => Err(FormatError::UnsupportedConversion(other)),
    }
}

/// Apply an integer precision: minimum digit count, and `.0` of zero prints nothing.
fn with_precision(digits: String, precision: Option<usize>, is_zero: bool) -> String {
    match precision {
        Some(0) if is_zero => String::new(),
        Some(p) if digits.len() < p => format!("{}{}", "0".repeat(p - digits.len()), digits),
        _ => digits,
    }
}

fn render_float(conversion: char, spec: &Spec, value: f64) -> String {
    let upper = conversion.is_ascii_uppercase();
    let sign = if value.is_sign_negative() && !value.is_nan() {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };

    if !value.is_finite() {
        let body = match (value.is_nan(), upper) {
            (true, false) => "nan",
            (true, true) => "NAN",
            (false, false) => "inf",
            (false, true) => "INF",
        };
        return pad(sign, body, spec, false);
    }

    let abs = value.abs();
    let precision = spec.precision.unwrap_or(6);
    let body = match conversion.to_ascii_lowercase() {
        'f' => fixed(abs, precision, spec.alt),
        'e' => exponential(abs, precision, upper, spec.alt),
        _ => general(abs, precision, upper, spec.alt),
    };
    pad(sign, &body, spec, true)
}

fn fixed(abs: f64, precision: usize, alt: bool) -> String {
    let mut s = format!("{abs:.precision$}");
    if alt && precision == 0 {
        s.push('.');
    }
    s
}

/// Split Rust's `{:e}` output into mantissa and decimal exponent.
fn rust_exponential(abs: f64, precision: usize) -> (String, i32) {
    let s = format!("{abs:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn exponential(abs: f64, precision: usize, upper: bool, alt: bool) -> String {
    let (mut mantissa, exp) = rust_exponential(abs, precision);
    if alt && precision == 0 {
        mantissa.push('.');
    }
    c_exponent(mantissa, exp, upper)
}

fn c_exponent(mantissa: String, exp: i32, upper: bool) -> String {
    let marker = if upper { 'E' } else { 'e' };
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{marker}{exp_sign}{:02}", exp.unsigned_abs())
}

fn general(abs: f64, precision: usize, upper: bool, alt: bool) -> String {
    let p = precision.max(1);
    let exp = if abs == 0.0 {
        0
    } else {
        rust_exponential(abs, p - 1).1
    };

    if exp >= -4 && (exp as i64) < p as i64 {
        let decimals = (p as i64 - 1 - exp as i64) as usize;
        let s = fixed(abs, decimals, alt);
        if alt {
            s
        } else {
            strip_trailing_zeros(s)
        }
    } else {
        let (mantissa, exp) = rust_exponential(abs, p - 1);
        let mantissa = if alt {
            if mantissa.contains('.') {
                mantissa
            } else {
                mantissa + "."
            }
        } else {
            strip_trailing_zeros(mantissa)
        };
        c_exponent(mantissa, exp, upper)
    }
}

fn strip_trailing_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Pad `prefix + body` to the field width. Zero padding goes between the
/// prefix (sign, `0x`) and the body, and only when `zero_allowed`.
fn pad(prefix: &str, body: &str, spec: &Spec, zero_allowed: bool) -> String {
    let len = prefix.chars().count() + body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        return format!("{prefix}{body}");
    }
    let fill = width - len;
    if spec.left {
        format!("{prefix}{body}{}", " ".repeat(fill))
    } else if spec.zero && zero_allowed {
        format!("{prefix}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{prefix}{body}", " ".repeat(fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fargs;

    fn f(template: &str, args: Vec<FormatArg>) -> String {
        format_message(template, &args).unwrap()
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(f("hello", fargs![]), "hello");
        assert_eq!(f("100%% sure", fargs![]), "100% sure");
    }

    #[test]
    fn signed_integers() {
        assert_eq!(f("%d items", fargs![42]), "42 items");
        assert_eq!(f("%i", fargs![-17]), "-17");
        assert_eq!(f("%5d|%-5d|%05d", fargs![42, 42, 42]), "   42|42   |00042");
        assert_eq!(f("%+d % d", fargs![5, 5]), "+5  5");
        assert_eq!(f("%.3d", fargs![7]), "007");
        assert_eq!(f("%06.3d", fargs![7]), "   007");
        assert_eq!(f("[%.0d]", fargs![0]), "[]");
        assert_eq!(f("%05d", fargs![-42]), "-0042");
    }

    #[test]
    fn length_modifiers_are_ignored() {
        assert_eq!(f("%ld %lld %zu %hd", fargs![1, 2i64, 3usize, 4]), "1 2 3 4");
    }

    #[test]
    fn unsigned_and_radix() {
        assert_eq!(f("%x %X %#x %o %#o", fargs![255, 255, 255, 8, 8]), "ff FF 0xff 10 010");
        assert_eq!(f("%u", fargs![-1]), "18446744073709551615");
        assert_eq!(f("%#x", fargs![0]), "0");
        assert_eq!(f("%#08x", fargs![255]), "0x0000ff");
    }

    #[test]
    fn fixed_point() {
        assert_eq!(f("%f", fargs![1.5]), "1.500000");
        assert_eq!(f("%.2f", fargs![3.14159]), "3.14");
        assert_eq!(f("%8.3f", fargs![-3.14159]), "  -3.142");
        assert_eq!(f("%08.3f", fargs![-3.14159]), "-003.142");
        assert_eq!(f("%+.1f", fargs![2.26f32]), "+2.3");
        assert_eq!(f("%#.0f", fargs![3.0]), "3.");
        assert_eq!(f("%.1f", fargs![7]), "7.0");
    }

    #[test]
    fn exponent_notation() {
        assert_eq!(f("%e", fargs![12345.678]), "1.234568e+04");
        assert_eq!(f("%E", fargs![0.000123]), "1.230000E-04");
        assert_eq!(f("%+.1e", fargs![0.0]), "+0.0e+00");
        assert_eq!(f("%.2e", fargs![1e100]), "1.00e+100");
    }

    #[test]
    fn general_notation() {
        assert_eq!(f("%g", fargs![100000.0]), "100000");
        assert_eq!(f("%g", fargs![1000000.0]), "1e+06");
        assert_eq!(f("%g", fargs![0.0001]), "0.0001");
        assert_eq!(f("%g", fargs![0.00001]), "1e-05");
        assert_eq!(f("%g", fargs![3.14159]), "3.14159");
        assert_eq!(f("%.3g", fargs![3.14159]), "3.14");
        assert_eq!(f("%#g", fargs![1.0]), "1.00000");
        assert_eq!(f("%g", fargs![9.9999999]), "10");
        assert_eq!(f("%G", fargs![1.5e-10]), "1.5E-10");
        assert_eq!(f("%g", fargs![0.0]), "0");
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(f("%f", fargs![f64::NAN]), "nan");
        assert_eq!(f("%5.1F", fargs![f64::INFINITY]), "  INF");
        assert_eq!(f("%05f", fargs![f64::NEG_INFINITY]), " -inf");
    }

    #[test]
    fn strings_chars_and_objects() {
        assert_eq!(f("%s and %@", fargs!["a", 5]), "a and 5");
        assert_eq!(f("%.2s", fargs!["abcdef"]), "ab");
        assert_eq!(f("%-6s|%6s", fargs!["ab", "cd"]), "ab    |    cd");
        assert_eq!(f("%c%c", fargs!['x', 65]), "xA");
        assert_eq!(f("%@", fargs![true]), "true");
        assert_eq!(f("%s", fargs![String::from("owned")]), "owned");
    }

    #[test]
    fn star_width_and_precision() {
        assert_eq!(f("%*d", fargs![5, 42]), "   42");
        assert_eq!(f("%-*d|", fargs![4, 7]), "7   |");
        assert_eq!(f("%*d|", fargs![-4, 7]), "7   |");
        assert_eq!(f("%.*f", fargs![2, 2.5]), "2.50");
        assert_eq!(f("%.*s", fargs![-1, "abc"]), "abc");
    }

    #[test]
    fn extra_arguments_are_ignored() {
        assert_eq!(f("hi", fargs![1, 2]), "hi");
    }

    #[test]
    fn template_is_never_executed_as_format_control() {
        // Argument text containing conversions is inserted verbatim.
        assert_eq!(f("user=%s", fargs!["%d%s%n"]), "user=%d%s%n");
    }

    #[test]
    fn missing_argument_is_an_error() {
        assert_eq!(
            format_message("%d and %d", &fargs![1]),
            Err(FormatError::MissingArgument {
                index: 1,
                conversion: 'd'
            })
        );
        assert_eq!(
            format_message("%*d", &fargs![]),
            Err(FormatError::MissingArgument {
                index: 0,
                conversion: '*'
            })
        );
    }

    #[test]
    fn type_mismatch_is_an_error() {
        assert_eq!(
            format_message("%d", &fargs!["x"]),
            Err(FormatError::TypeMismatch {
                index: 0,
                conversion: 'd',
                found: "string"
            })
        );
        assert!(matches!(
            format_message("%f", &fargs!["x"]),
            Err(FormatError::TypeMismatch { conversion: 'f', .. })
        ));
        assert!(matches!(
            format_message("%s", &fargs![1.0]),
            Err(FormatError::TypeMismatch { conversion: 's', .. })
        ));
        assert!(matches!(
            format_message("%c", &fargs![-1]),
            Err(FormatError::TypeMismatch { conversion: 'c', .. })
        ));
    }

    #[test]
    fn malformed_templates_are_errors() {
        assert_eq!(
            format_message("%y", &fargs![1]),
            Err(FormatError::UnsupportedConversion('y'))
        );
        assert_eq!(format_message("abc %", &fargs![]), Err(FormatError::Truncated));
        assert_eq!(format_message("%5", &fargs![1]), Err(FormatError::Truncated));
    }

    #[test]
    fn oversized_widths_and_precisions_are_rejected() {
        assert_eq!(
            format_message("%99999999999999999999d", &fargs![1]),
            Err(FormatError::FieldTooLarge {
                value: u64::MAX,
                limit: MAX_FIELD_WIDTH,
            })
        );
        assert!(matches!(
            format_message("%.5000f", &fargs![1.0]),
            Err(FormatError::FieldTooLarge { value: 5000, .. })
        ));
        assert!(matches!(
            format_message("%*d", &fargs![i64::MIN, 1]),
            Err(FormatError::FieldTooLarge { .. })
        ));
        assert!(matches!(
            format_message("%.*f", &fargs![i64::MAX, 1.0]),
            Err(FormatError::FieldTooLarge { .. })
        ));
        assert!(matches!(
            format_message("%*s", &fargs![u64::MAX, "x"]),
            Err(FormatError::FieldTooLarge { .. })
        ));
    }

    #[test]
    fn widths_up_to_the_limit_still_render() {
        let out = f("%*d", fargs![MAX_FIELD_WIDTH, 7]);
        assert_eq!(out.len(), MAX_FIELD_WIDTH);
        assert!(out.ends_with('7'));
        assert_eq!(f("%.*f", fargs![-1, 1.5]), "1.500000");
    }
}
