/// Characters that separate day numbers in a day list
const SEPARATORS: &[char] = &[' ', ',', '.'];

/// Parse a free-text day list such as "1, 2.3  4" into day numbers.
///
/// Tokens that are not positive integers are dropped silently. Order and
/// duplicates are kept. An empty result means the list had no valid day.
pub fn parse_days(text: &str) -> Vec<u32> {
    text.split(SEPARATORS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<u32>().ok())
        .filter(|&day| day > 0)
        .collect()
}
