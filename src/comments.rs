//! Comment stripping for `;`, `//` and `/* ... */` comments.
//!
//! Stripped text is replaced with spaces (block comments) or cut (line
//! comments) so every byte column left of a comment is unchanged. Double
//! quoted strings and `'c'` character literals are never treated as comments.

/// Stateful stripper: remembers an open `/*` across lines.
#[derive(Debug, Default)]
pub struct CommentStripper {
    in_block: bool,
}

impl CommentStripper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip one line. Trailing whitespace is removed.
    pub fn strip_line(&mut self, line: &str) -> String {
        let bytes = line.as_bytes();

        // Fast path: most lines carry no comment marker at all.
        if !self.in_block && memchr::memchr2(b';', b'/', bytes).is_none() {
            return line.trim_end().to_string();
        }

        let mut out = String::with_capacity(line.len());
        // Start of the segment not yet copied (code) or not yet blanked (block comment).
        let mut seg = 0;
        let mut i = 0;
        let mut in_string = false;

        while i < bytes.len() {
            if self.in_block {
                if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    i += 2;
                    blank(&mut out, i - seg);
                    seg = i;
                    self.in_block = false;
                } else {
                    i += 1;
                }
                continue;
            }

            match bytes[i] {
                b'"' => {
                    in_string = !in_string;
                    i += 1;
                }
                b'\'' if !in_string && bytes.get(i + 2) == Some(&b'\'') => i += 3,
                b';' if !in_string => {
                    out.push_str(&line[seg..i]);
                    return trimmed(out);
                }
                b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => {
                    out.push_str(&line[seg..i]);
                    return trimmed(out);
                }
                b'/' if !in_string && bytes.get(i + 1) == Some(&b'*') => {
                    out.push_str(&line[seg..i]);
                    seg = i;
                    i += 2;
                    self.in_block = true;
                }
                _ => i += 1,
            }
        }

        if self.in_block {
            blank(&mut out, bytes.len() - seg);
        } else {
            out.push_str(&line[seg..]);
        }
        trimmed(out)
    }
}

/// Strip comments from a whole document, keeping the line count.
pub fn strip_all<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut stripper = CommentStripper::new();
    lines
        .iter()
        .map(|l| stripper.strip_line(l.as_ref()))
        .collect()
}

/// Text of the trailing `;` or `//` comment on a line, markers removed.
#[must_use]
pub fn line_comment(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'\'' if !in_string && bytes.get(i + 2) == Some(&b'\'') => {
                i += 3;
                continue;
            }
            b';' if !in_string => return Some(comment_body(&line[i..])),
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => {
                return Some(comment_body(&line[i..]));
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Whether the line holds nothing but a line comment.
#[must_use]
pub fn is_comment_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with(';') || t.starts_with("//")
}

fn comment_body(marker_and_text: &str) -> &str {
    marker_and_text
        .trim_start_matches(';')
        .trim_start_matches('/')
        .trim()
}

fn blank(out: &mut String, n: usize) {
    out.extend(std::iter::repeat_n(' ', n));
}

fn trimmed(mut s: String) -> String {
    let len = s.trim_end().len();
    s.truncate(len);
    s
}
