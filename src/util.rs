//! Small shared helpers.

/// Shorten a string to its first and last `max_length_per_side` characters
/// with an ellipsis in between. Strings that already fit are returned as-is.
pub fn truncate_with_ellipsis(input: &str, max_length_per_side: usize) -> String {
    if input.len() <= max_length_per_side * 2 {
        return input.to_string();
    }

    let left = &input[..max_length_per_side];
    let right = &input[input.len() - max_length_per_side..];
    format!("{left}...{right}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_unchanged() {
        assert_eq!(truncate_with_ellipsis("0xabcd", 4), "0xabcd");
    }

    #[test]
    fn long_input_truncated() {
        assert_eq!(truncate_with_ellipsis("abcdefghijkl", 3), "abc...jkl");
    }

    #[test]
    fn boundary_length_unchanged() {
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "abcdef");
    }
}
