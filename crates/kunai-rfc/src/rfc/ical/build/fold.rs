//! Content line folding for iCalendar (RFC 5545 §3.1).

/// Maximum line length in octets (not including CRLF).
const MAX_LINE_OCTETS: usize = 75;

/// Folds a content line to comply with the 75-octet limit and terminates it with CRLF.
///
/// Continuation lines start with a single space. UTF-8 sequences are never split.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return format!("{line}\r\n");
    }

    let mut result = String::with_capacity(line.len() + (line.len() / MAX_LINE_OCTETS) * 3);
    let mut rest = line;
    let mut first_line = true;

    while !rest.is_empty() {
        // Continuation lines lose one octet to the leading space
        let max_len = if first_line {
            MAX_LINE_OCTETS
        } else {
            MAX_LINE_OCTETS - 1
        };

        let mut end = max_len.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }

        if !first_line {
            result.push(' ');
        }
        result.push_str(&rest[..end]);
        result.push_str("\r\n");

        rest = &rest[end..];
        first_line = false;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_short_line() {
        assert_eq!(fold_line("SUMMARY:Short"), "SUMMARY:Short\r\n");
    }

    #[test]
    fn fold_exactly_75() {
        let line = "X".repeat(75);
        assert_eq!(fold_line(&line), format!("{line}\r\n"));
    }

    #[test]
    fn fold_boundary_75_octets() {
        let line = "A".repeat(80);
        let result = fold_line(&line);

        let lines: Vec<&str> = result.split("\r\n").filter(|s| !s.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 75);
        assert_eq!(lines[1].len(), 6);
    }

    #[test]
    fn fold_preserves_utf8() {
        // 73 + 9 bytes; the second character would straddle the limit
        let line = format!("{}日本語", "A".repeat(73));
        let result = fold_line(&line);

        let unfolded = result.replace("\r\n ", "").replace("\r\n", "");
        assert_eq!(unfolded, line);
        assert!(result.starts_with(&format!("{}\r\n 日本語", "A".repeat(73))));
    }
}
