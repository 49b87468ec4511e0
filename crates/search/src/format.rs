//! Rendering of search snippets into prompt-ready text.

use crate::client::Snippet;

/// Render at most `top_k` snippets as blank-line separated blocks:
///
/// ```text
/// - {title}
///   {excerpt}
///   {url}
/// ```
///
/// Empty fields are skipped; no snippets yields an empty string.
pub fn format_snippets(snippets: &[Snippet], top_k: usize) -> String {
    snippets
        .iter()
        .take(top_k)
        .map(format_snippet)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_snippet(snippet: &Snippet) -> String {
    let title = snippet.title.trim();
    let url = snippet.url.trim();
    // Untitled hits are headed by their URL instead
    let (heading, url_line) = if title.is_empty() { (url, "") } else { (title, url) };
    let mut block = format!("- {}", heading);

    for line in [snippet.excerpt.trim(), url_line] {
        if !line.is_empty() {
            block.push_str("\n  ");
            block.push_str(line);
        }
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_single_snippet() {
        let snippets = vec![Snippet::new(
            "Rust 1.80 released",
            "https://blog.rust-lang.org/",
            "LazyCell and LazyLock are stable.",
        )];

        assert_eq!(
            format_snippets(&snippets, 5),
            "- Rust 1.80 released\n  LazyCell and LazyLock are stable.\n  https://blog.rust-lang.org/"
        );
    }

    #[test]
    fn test_format_respects_top_k() {
        let snippets: Vec<Snippet> = (1..=4)
            .map(|i| Snippet::new(format!("T{}", i), format!("https://e.com/{}", i), "x"))
            .collect();

        let text = format_snippets(&snippets, 2);
        assert!(text.contains("T1"));
        assert!(text.contains("T2"));
        assert!(!text.contains("T3"));
        assert_eq!(text.matches("\n\n").count(), 1);
    }

    #[test]
    fn test_format_skips_empty_fields() {
        let snippets = vec![Snippet::new("", "https://e.com", "")];
        assert_eq!(format_snippets(&snippets, 5), "- https://e.com");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_snippets(&[], 5), "");
    }
}
