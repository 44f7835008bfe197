//! Common utilities and helper functions.
//!
//! C literal formatting used by the generator and placeholder expansion
//! for paths found in `menugen.toml`.

use std::env;

use menukit::data::DataType;

/// Quote `s` as a C string literal.
pub fn c_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Shortest decimal form of `v` that always reads back as floating point.
///
/// Integral values keep a `.0`, very large or small magnitudes use
/// exponent notation.
pub fn float_repr(v: f64) -> String {
    if !v.is_finite() {
        return "0.0".to_string();
    }
    let abs = v.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        return format!("{v:e}");
    }
    let s = v.to_string();
    if s.contains('.') { s } else { format!("{s}.0") }
}

/// C literal of `value` stored as `data_type`.
///
/// ```rust
/// use menukit::data::DataType;
/// use menugen::utils::number_literal;
///
/// assert_eq!(number_literal(DataType::Float, 0.5), "0.5f");
/// assert_eq!(number_literal(DataType::Double, 2.0), "2.0");
/// assert_eq!(number_literal(DataType::Int8, -3.0), "-3");
/// assert_eq!(number_literal(DataType::Bool, 1.0), "true");
/// ```
pub fn number_literal(data_type: DataType, value: f64) -> String {
    match data_type {
        DataType::Bool => (if value != 0.0 { "true" } else { "false" }).to_string(),
        DataType::Float => format!("{}f", float_repr(value)),
        DataType::Double => float_repr(value),
        _ if value < 0.0 => format!("{}", value.trunc() as i64),
        _ => format!("{}", value.trunc() as u64),
    }
}

/// Prefix every non-empty line of `code` with `prefix`.
pub fn indent(code: &str, prefix: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces environment variable placeholders in a string.
///
/// Placeholders use the format `${env:VAR_NAME}`. An unset variable is
/// replaced with an empty string. Other `${...}` text is kept as is, so
/// that the caller can expand its own placeholders afterwards.
///
/// # Example
///
/// ```rust
/// use menugen::utils::replace_env_placeholders;
///
/// unsafe { std::env::set_var("MENU_OUT", "build"); }
/// assert_eq!(replace_env_placeholders("${env:MENU_OUT}/menu.c"), "build/menu.c");
/// assert_eq!(replace_env_placeholders("${workspaceFolder}/a"), "${workspaceFolder}/a");
/// ```
pub fn replace_env_placeholders(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };
        let placeholder = &after[..end];
        match placeholder.strip_prefix("env:") {
            Some(name) => {
                let value = env::var(name).unwrap_or_default();
                debug!("expanded ${{env:{name}}} to `{value}`");
                result.push_str(&value);
            }
            None => {
                result.push_str("${");
                result.push_str(placeholder);
                result.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_string_literal() {
        assert_eq!(c_string_literal("Main"), "\"Main\"");
        assert_eq!(c_string_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(c_string_literal("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(0.0), "0.0");
        assert_eq!(float_repr(10.0), "10.0");
        assert_eq!(float_repr(0.5), "0.5");
        assert_eq!(float_repr(-2.25), "-2.25");
        assert_eq!(float_repr(1e20), "1e20");
        assert_eq!(float_repr(f64::NAN), "0.0");
    }

    #[test]
    fn test_number_literal_integers() {
        assert_eq!(number_literal(DataType::Uint8, 200.0), "200");
        assert_eq!(number_literal(DataType::Int32, -7.9), "-7");
        assert_eq!(number_literal(DataType::Uint64, 1.8e19), "18000000000000000000");
        assert_eq!(number_literal(DataType::Bool, 0.0), "false");
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("a;\n\n  b;", "    "), "    a;\n\n      b;");
    }

    #[test]
    fn test_replace_env_placeholders() {
        unsafe {
            env::set_var("MENUGEN_TEST_HOME", "/home/test");
            env::set_var("MENUGEN_TEST_BIN", "bin");
        }

        assert_eq!(
            replace_env_placeholders("${env:MENUGEN_TEST_HOME}/${env:MENUGEN_TEST_BIN}"),
            "/home/test/bin"
        );
        assert_eq!(replace_env_placeholders("${env:MENUGEN_TEST_UNSET}"), "");
        assert_eq!(replace_env_placeholders("${other}"), "${other}");
        assert_eq!(replace_env_placeholders("plain"), "plain");
    }

    #[test]
    fn test_malformed_placeholders() {
        assert_eq!(replace_env_placeholders("${"), "${");
        assert_eq!(replace_env_placeholders("${env:VAR"), "${env:VAR");
        assert_eq!(replace_env_placeholders("$"), "$");
        assert_eq!(replace_env_placeholders("{env:VAR}"), "{env:VAR}");
    }
}
