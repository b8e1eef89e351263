//! Terminal rendering helpers

/// Column width used for utterances
pub const NOTE_WIDTH: usize = 80;

/// Greedy word wrap on single spaces
///
/// A word longer than `max_width` gets a line of its own rather than being
/// split.
pub fn wrap_text(text: &str, max_width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        if current.chars().count() + word.chars().count() + 1 <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

pub fn intro(title: &str) -> String {
    format!("┌  {}\n│", title)
}

pub fn outro(message: &str) -> String {
    format!("│\n└  {}", message)
}

pub fn info(message: &str) -> String {
    format!("●  {}", message)
}

pub fn step(message: &str) -> String {
    format!("◇  {}", message)
}

pub fn error(message: &str) -> String {
    format!("■  {}", message)
}

/// Boxed note with a title, body wrapped to [`NOTE_WIDTH`]
pub fn note(title: &str, body: &str) -> String {
    let wrapped = wrap_text(body, NOTE_WIDTH);
    let inner = wrapped
        .lines()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(title.chars().count() + 1);

    let mut out = format!("◇  {} {}╮\n", title, "─".repeat(inner - title.chars().count()));
    out.push_str(&format!("│  {}│\n", " ".repeat(inner + 1)));
    for line in wrapped.lines() {
        let pad = inner + 1 - line.chars().count();
        out.push_str(&format!("│  {}{}│\n", line, " ".repeat(pad)));
    }
    out.push_str(&format!("│  {}│\n", " ".repeat(inner + 1)));
    out.push_str(&format!("├{}╯", "─".repeat(inner + 3)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_text_unchanged() {
        assert_eq!(wrap_text("Hello there", 80), "Hello there");
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "one two three four five six seven eight nine ten";
        let wrapped = wrap_text(text, 15);
        for line in wrapped.lines() {
            assert!(line.len() <= 15, "line too long: {:?}", line);
        }
        assert_eq!(wrapped.replace('\n', " "), text);
    }

    #[test]
    fn test_wrap_long_word_on_its_own_line() {
        assert_eq!(wrap_text("a supercalifragilistic b", 10), "a\nsupercalifragilistic\nb");
    }

    #[test]
    fn test_wrap_boundary() {
        // The check counts one separator per word, even for the first
        assert_eq!(wrap_text("abcd efgh", 10), "abcd efgh");
        assert_eq!(wrap_text("abcd efghi", 10), "abcd efghi");
        assert_eq!(wrap_text("abcd efghij", 10), "abcd\nefghij");
    }

    #[test]
    fn test_note_box_lines_align() {
        let rendered = note("Skeptic", "That is simply not true.");
        let widths: Vec<usize> = rendered
            .lines()
            .skip(1)
            .take_while(|l| l.starts_with('│'))
            .map(|l| l.chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
        assert!(rendered.starts_with("◇  Skeptic"));
        assert!(rendered.contains("That is simply not true."));
    }
}
