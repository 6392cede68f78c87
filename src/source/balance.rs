//! Just enough lexing of Java/Kotlin to find structural brackets: comments,
//! string literals (including Kotlin raw strings) and char literals are
//! skipped.

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum Imbalance {
    #[error("Unexpected `{found}` at byte {at}")]
    Unexpected { found: char, at: usize },
    #[error("`{open}` at byte {at} is never closed")]
    Unclosed { open: char, at: usize },
    #[error("Unterminated {what} starting at byte {at}")]
    Unterminated { what: &'static str, at: usize },
}

fn closer(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Byte offsets and chars of every bracket outside comments and literals.
fn brackets(text: &str) -> Result<Vec<(usize, char)>, Imbalance> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &text[i..];
        if rest.starts_with("//") {
            i += rest.find('\n').unwrap_or_else(|| rest.len());
        } else if rest.starts_with("/*") {
            let end = rest[2..].find("*/").ok_or(Imbalance::Unterminated {
                what: "block comment",
                at: i,
            })?;
            i += 2 + end + 2;
        } else if rest.starts_with("\"\"\"") {
            let end = rest[3..].find("\"\"\"").ok_or(Imbalance::Unterminated {
                what: "raw string",
                at: i,
            })?;
            i += 3 + end + 3;
        } else if rest.starts_with('"') || rest.starts_with('\'') {
            let quote = bytes[i];
            let mut j = i + 1;
            loop {
                match bytes.get(j) {
                    None | Some(b'\n') => {
                        return Err(Imbalance::Unterminated {
                            what: "literal",
                            at: i,
                        })
                    }
                    Some(b'\\') => j += 2,
                    Some(&b) if b == quote => break,
                    Some(_) => j += 1,
                }
            }
            i = j + 1;
        } else {
            match bytes[i] {
                b @ b'{' | b @ b'}' | b @ b'(' | b @ b')' | b @ b'[' | b @ b']' => {
                    found.push((i, b as char))
                }
                _ => (),
            }
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    Ok(found)
}

/// Checks that every bracket in `text` is closed by its partner.
pub fn check(text: &str) -> Result<(), Imbalance> {
    let mut stack = Vec::new();
    for (at, c) in brackets(text)? {
        match c {
            '{' | '(' | '[' => stack.push((at, c)),
            _ => match stack.pop() {
                Some((_, open)) if closer(open) == c => (),
                _ => return Err(Imbalance::Unexpected { found: c, at }),
            },
        }
    }
    match stack.pop() {
        Some((at, open)) => Err(Imbalance::Unclosed { open, at }),
        None => Ok(()),
    }
}

/// The first `{` at or after `from`, and the `}` that closes it.
pub fn block_after(text: &str, from: usize) -> Result<Option<(usize, usize)>, Imbalance> {
    let mut open = None;
    let mut depth = 0usize;
    for (at, c) in brackets(text)? {
        if at < from {
            continue;
        }
        match (open, c) {
            (None, '{') => {
                open = Some(at);
                depth = 1;
            }
            (None, _) => (),
            (Some(_), '{') => depth += 1,
            (Some(start), '}') => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some((start, at)));
                }
            }
            (Some(_), _) => (),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest(
        text,
        case("class A { void f() { g(\"}\"); } }"),
        case("class A {\n  // }\n  /* { */\n  char c = '{';\n}"),
        case("val s = \"\"\"\n{ raw\n\"\"\"\nfun f() = listOf(1)[0]"),
        case("String s = \"escaped \\\" }\";")
    )]
    fn balanced(text: &str) {
        assert_eq!(check(text), Ok(()));
    }

    #[rstest(text, error,
        case("class A { void f() { }", Imbalance::Unclosed { open: '{', at: 8 }),
        case("f(a]", Imbalance::Unexpected { found: ']', at: 3 }),
        case("} {", Imbalance::Unexpected { found: '}', at: 0 }),
        case("/* open", Imbalance::Unterminated { what: "block comment", at: 0 })
    )]
    fn unbalanced(text: &str, error: Imbalance) {
        assert_eq!(check(text), Err(error));
    }

    #[test]
    fn finds_enclosing_block() {
        let text = "package a;\nclass A {\n  void f() { \"}\"; }\n}\nclass B {}";
        let (open, close) = block_after(text, text.find("class A").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(&text[open..=open], "{");
        assert_eq!(close, text.find("}\nclass B").unwrap());
        assert_eq!(block_after("no braces", 0).unwrap(), None);
    }
}
