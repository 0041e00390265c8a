//! Quote- and paren-aware splitting of a `CREATE TABLE` body

/// What a scanned character turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scanned {
    /// Outside quotes and comments; may change depth
    Code,
    /// Inside a quoted identifier or literal, delimiters included
    Quoted,
    /// Second character of a `--` or `/*` opener; the previous one belongs to the comment too
    CommentOpen,
    /// Inside a comment, including a closing `*/`
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    Line,
    Block,
}

/// Tracks nesting while scanning DDL text one character at a time.
///
/// `--` and `/* */` comments are skipped while no quote is open, so comment
/// text never opens a quote or moves the depth.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ScanState {
    depth: i32,
    quote: Option<char>,
    comment: Option<CommentKind>,
    prev: Option<char>,
}

impl ScanState {
    /// Feed one character and classify it
    pub(crate) fn advance(&mut self, c: char) -> Scanned {
        let prev = self.prev.replace(c);

        if let Some(kind) = self.comment {
            return match kind {
                CommentKind::Line if c == '\n' => {
                    self.comment = None;
                    Scanned::Code
                }
                CommentKind::Block if prev == Some('*') && c == '/' => {
                    self.comment = None;
                    self.prev = None;
                    Scanned::Comment
                }
                _ => Scanned::Comment,
            };
        }

        if let Some(open) = self.quote {
            if c == open {
                self.quote = None;
                self.prev = None;
            }
            return Scanned::Quoted;
        }

        match (prev, c) {
            (Some('-'), '-') => {
                self.comment = Some(CommentKind::Line);
                return Scanned::CommentOpen;
            }
            (Some('/'), '*') => {
                self.comment = Some(CommentKind::Block);
                // "/*/" must not close the comment it just opened
                self.prev = None;
                return Scanned::CommentOpen;
            }
            _ => {}
        }

        match c {
            '`' | '"' | '\'' => {
                self.quote = Some(c);
                return Scanned::Quoted;
            }
            '(' => self.depth += 1,
            ')' => self.depth -= 1,
            _ => {}
        }
        Scanned::Code
    }

    pub(crate) fn depth(&self) -> i32 {
        self.depth
    }

    pub(crate) fn at_top_level(&self) -> bool {
        self.depth == 0 && self.quote.is_none() && self.comment.is_none()
    }
}

/// Split a comma-joined definition block into fragments.
///
/// Commas only separate fragments at paren depth zero, outside any quoted
/// identifier or literal and outside SQL comments. A quote is closed only by
/// the character that opened it. Comment text is dropped from the fragments.
/// Unbalanced input never fails: whatever is left is flushed as the last
/// fragment. Fragments are returned untrimmed.
pub fn split_definitions(block: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::default();

    for c in block.chars() {
        if c == ',' && state.at_top_level() {
            state.advance(c);
            fragments.push(std::mem::take(&mut current));
            continue;
        }
        match state.advance(c) {
            Scanned::Code | Scanned::Quoted => current.push(c),
            Scanned::CommentOpen => {
                current.pop();
            }
            Scanned::Comment => {}
        }
    }

    if !current.is_empty() {
        fragments.push(current);
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_does_not_split_type_parameters() {
        let parts = split_definitions("a INT, b DECIMAL(5,2), c VARCHAR(10)");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].trim(), "b DECIMAL(5,2)");
    }

    #[test]
    fn test_resplitting_a_fragment_is_stable() {
        let parts = split_definitions("id BIGINT, `a,b` INT, price NUMERIC(10, 4) DEFAULT 0");
        assert_eq!(parts.len(), 3);
        for part in &parts {
            assert_eq!(split_definitions(part), vec![part.clone()]);
        }
    }

    #[test]
    fn test_quoted_identifiers_protect_commas() {
        let parts = split_definitions(r#""first,name" TEXT, `x` INT"#);
        assert_eq!(parts, vec![r#""first,name" TEXT"#.to_string(), " `x` INT".to_string()]);
    }

    #[test]
    fn test_other_quote_char_does_not_close() {
        // The double quote inside the backticks must not end the identifier
        let parts = split_definitions("`we\"ird,col` INT, b INT");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "`we\"ird,col` INT");
    }

    #[test]
    fn test_comment_literals_protect_commas() {
        let parts = split_definitions("name TEXT COMMENT 'first, last', age INT");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "name TEXT COMMENT 'first, last'");
    }

    #[test]
    fn test_parens_inside_quotes_do_not_nest() {
        let parts = split_definitions("a TEXT COMMENT 'smile :)', b INT");
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_unterminated_input_is_flushed() {
        assert_eq!(
            split_definitions("a INT, b VARCHAR(10, c INT"),
            vec!["a INT".to_string(), " b VARCHAR(10, c INT".to_string()]
        );
        assert_eq!(
            split_definitions("a INT, `b, c INT"),
            vec!["a INT".to_string(), " `b, c INT".to_string()]
        );
    }

    #[test]
    fn test_empty_block() {
        assert!(split_definitions("").is_empty());
    }

    #[test]
    fn test_scan_state_tracks_depth() {
        let mut state = ScanState::default();
        for c in "(a (b) '(' ".chars() {
            state.advance(c);
        }
        assert_eq!(state.depth(), 1);
        assert!(!state.at_top_level());
    }

    #[test]
    fn test_line_comment_apostrophe_and_comma_are_ignored() {
        let parts = split_definitions("id BIGINT, -- the user's id, unique
 name TEXT, age INT");
        let parts: Vec<_> = parts.iter().map(|p| p.trim()).collect();
        assert_eq!(parts, vec!["id BIGINT", "name TEXT", "age INT"]);
    }

    #[test]
    fn test_block_comment_is_dropped() {
        let parts = split_definitions("a INT /* it's (a, b */, b INT");
        let parts: Vec<_> = parts.iter().map(|p| p.trim()).collect();
        assert_eq!(parts, vec!["a INT", "b INT"]);
    }

    #[test]
    fn test_comment_markers_inside_quotes_are_text() {
        let parts = split_definitions("a TEXT DEFAULT '--', b TEXT COMMENT '/* x */'");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "a TEXT DEFAULT '--'");
        assert_eq!(parts[1], " b TEXT COMMENT '/* x */'");
    }

    #[test]
    fn test_comment_does_not_move_depth() {
        let mut state = ScanState::default();
        for c in "-- (
/* ( */".chars() {
            state.advance(c);
        }
        assert_eq!(state.depth(), 0);
        assert!(state.at_top_level());
    }
}
