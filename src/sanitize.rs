//! String filters shared by parameter binding, caching and code generation.

/// Keep ASCII letters and digits, dropping everything else.
pub(crate) fn alpha_numeric(input: &str) -> String {
    input.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Keep ASCII letters, digits and underscores.
pub(crate) fn identifier_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Replace anything that is not an ASCII letter or digit with `_`.
pub(crate) fn underscore_separated(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// All ASCII digits of `input` parsed as one number, if there are any.
pub(crate) fn numbers_only(input: &str) -> Option<u64> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
