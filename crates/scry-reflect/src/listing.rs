//! Disassembly listing post-processing.
//!
//! A pure text transform that turns raw disassembler output into something
//! resembling a conventional native-code listing: instruction-address tags
//! removed, indentation normalized, inline source-location comments rewritten
//! to a uniform `Location file:line` form, and a blank line before each new
//! basic block.

const INDENT: &str = "        ";

/// Post-process a raw disassembly listing.
pub fn format_listing(lines: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !matches!(out.last(), Some(last) if last.is_empty()) {
                out.push(String::new());
            }
            continue;
        }

        if is_block_label(trimmed) {
            if !out.is_empty() && !matches!(out.last(), Some(last) if last.is_empty()) {
                out.push(String::new());
            }
            out.push(trimmed.to_string());
            continue;
        }

        if let Some((file, line_no)) = parse_location(trimmed) {
            out.push(format!("{INDENT}// Location {file}:{line_no}"));
            continue;
        }

        if let Some(instruction) = strip_address_tag(trimmed) {
            out.push(format!("{INDENT}{instruction}"));
            continue;
        }

        out.push(trimmed.to_string());
    }
    out
}

/// A basic-block label: `.L_0:`, `$L__BB0_2:` and the like.
fn is_block_label(line: &str) -> bool {
    line.ends_with(':')
        && (line.starts_with('.') || line.starts_with('$'))
        && line[..line.len() - 1]
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '$' | '_'))
}

/// Strip a leading `/*hex*/` instruction-address tag.
fn strip_address_tag(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("/*")?;
    let (tag, rest) = rest.split_once("*/")?;
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(rest.trim())
}

/// Parse an inline source-location comment of the form
/// `//## File "foo.src", line 12`.
fn parse_location(line: &str) -> Option<(String, u32)> {
    let rest = line.strip_prefix("//## File \"")?;
    let (file, rest) = rest.split_once('"')?;
    let rest = rest.strip_prefix(", line ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let line_no = digits.parse().ok()?;
    Some((file.to_string(), line_no))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_sample() -> Vec<String> {
        [
            "\t\tFunction : vadd",
            ".L_0:",
            "        //## File \"vadd.src\", line 1",
            "        /*0000*/                   S2R R0, SR_CTAID.X ;",
            "        /*0010*/                   LDG.E R2, [R4.64] ;",
            ".L_1:",
            "        //## File \"vadd.src\", line 2",
            "        /*0020*/                   FADD R2, R2, R3 ;",
            "        /*0030*/                   EXIT ;",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn address_tags_are_removed() {
        let formatted = format_listing(&raw_sample());
        assert!(formatted.iter().all(|l| !l.contains("/*")));
        assert!(formatted
            .iter()
            .any(|l| l == "        S2R R0, SR_CTAID.X ;"));
    }

    #[test]
    fn block_labels_get_preceding_blank_line() {
        let formatted = format_listing(&raw_sample());
        let pos = formatted.iter().position(|l| l == ".L_1:").unwrap();
        assert!(pos > 0);
        assert_eq!(formatted[pos - 1], "");
        // The leading label keeps no spurious blank above the header line.
        let first = formatted.iter().position(|l| l == ".L_0:").unwrap();
        assert_eq!(formatted[first - 1], "");
    }

    #[test]
    fn location_comments_are_rewritten() {
        let formatted = format_listing(&raw_sample());
        assert!(formatted
            .iter()
            .any(|l| l.trim() == "// Location vadd.src:1"));
        assert!(formatted
            .iter()
            .any(|l| l.trim() == "// Location vadd.src:2"));
        assert!(formatted.iter().all(|l| !l.contains("//## File")));
    }

    #[test]
    fn headers_pass_through_trimmed() {
        let formatted = format_listing(&raw_sample());
        assert_eq!(formatted[0], "Function : vadd");
    }

    #[test]
    fn malformed_tags_are_left_alone() {
        let lines = vec!["/*not-hex*/ FOO ;".to_string()];
        let formatted = format_listing(&lines);
        assert_eq!(formatted, vec!["/*not-hex*/ FOO ;".to_string()]);
    }

    #[test]
    fn consecutive_blanks_collapse() {
        let lines = vec![
            "A ;".to_string(),
            String::new(),
            String::new(),
            "B ;".to_string(),
        ];
        let formatted = format_listing(&lines);
        assert_eq!(formatted, vec!["A ;", "", "B ;"]);
    }
}
