/// Split raw meal text into food-name tokens.
///
/// Tokens are comma-separated; surrounding whitespace is stripped and
/// empty pieces (trailing commas, blank input) are dropped before lookup.
/// Case is left untouched here; the catalog folds case at lookup time.
/// Every input string is valid; there is no error path.
#[must_use]
pub fn parse_meal_text(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}
