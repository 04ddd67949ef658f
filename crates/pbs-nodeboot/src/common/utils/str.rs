use std::borrow::Cow;

/// Return the input string with an added "s" at the end if `count` is not one.
pub fn pluralize(value: &str, count: usize) -> Cow<'_, str> {
    if count == 1 {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("{value}s"))
    }
}

/// Truncates the middle of a string so that its total length (in characters)
/// doesn't exceed `length`.
/// `length` has to be at least five, otherwise there wouldn't be space for `...`.
pub fn truncate_middle(value: &str, length: usize) -> Cow<'_, str> {
    assert!(length >= 5);

    let char_count = value.chars().count();
    if char_count <= length {
        value.into()
    } else {
        let length = length - 3; // space for ...
        let start = length.div_ceil(2);
        let end = length / 2;
        let head: String = value.chars().take(start).collect();
        let tail: String = value.chars().skip(char_count - end).collect();
        format!("{head}...{tail}").into()
    }
}

/// Joins command line arguments into a single string that can be pasted into a shell.
/// Arguments containing whitespace or shell metacharacters are single-quoted.
pub fn shell_join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> Cow<'_, str> {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || "'\"\\$`!*?&;|<>()[]{}#~".contains(c));
    if needs_quotes {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    } else {
        Cow::Borrowed(arg)
    }
}
