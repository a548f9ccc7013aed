//! Glob-style layer selection.
//!
//! A pattern list is a single string of whitespace separated globs. `*` matches any run of
//! characters, `?` a single character, `[seq]` any character in `seq` and `[!seq]` any
//! character not in `seq`. Matching is case-sensitive.

/// Names matching any of the whitespace separated `patterns`, in the order of `names`.
/// Each name is returned at most once.
pub fn match_layer_names<I, S>(names: I, patterns: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let patterns = patterns
        .split_whitespace()
        .map(|p| p.chars().collect::<Vec<_>>())
        .collect::<Vec<_>>();

    names
        .into_iter()
        .filter(|name| {
            let name = name.as_ref().chars().collect::<Vec<_>>();
            patterns.iter().any(|p| glob_match(p, &name))
        })
        .map(|name| name.as_ref().to_string())
        .collect()
}

/// Iterative wildcard match. On a mismatch the most recent `*` absorbs one more character,
/// so matching stays linear in `pattern.len() * name.len()`.
fn glob_match(pattern: &[char], name: &[char]) -> bool {
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while n < name.len() {
        if pattern.get(p) == Some(&'*') {
            p += 1;
            star = Some((p, n));
            continue;
        }
        if let Some(used) = match_one(&pattern[p..], name[n]) {
            p += used;
            n += 1;
            continue;
        }
        match star {
            Some((after, absorbed)) => {
                star = Some((after, absorbed + 1));
                p = after;
                n = absorbed + 1;
            }
            None => return false,
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Match one name character against the token at the start of `pattern`; returns the number
/// of pattern characters the token spans.
fn match_one(pattern: &[char], c: char) -> Option<usize> {
    match *pattern.first()? {
        '?' => Some(1),
        '[' => match CharClass::parse(&pattern[1..]) {
            Some((class, used)) => class.contains(c).then_some(1 + used),
            // An unterminated class is a literal '['.
            None => (c == '[').then_some(1),
        },
        literal => (literal == c).then_some(1),
    }
}

struct CharClass {
    negated: bool,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    /// Parse the body of a class following `[`; returns the class and the number of pattern
    /// characters consumed, including the closing `]`.
    fn parse(body: &[char]) -> Option<(Self, usize)> {
        let mut i = 0;
        let negated = body.first() == Some(&'!');
        if negated {
            i += 1;
        }

        let mut ranges = Vec::new();
        let mut first = true;
        while i < body.len() {
            let c = body[i];
            if c == ']' && !first {
                return Some((Self { negated, ranges }, i + 1));
            }
            first = false;
            if i + 2 < body.len() && body[i + 1] == '-' && body[i + 2] != ']' {
                ranges.push((c, body[i + 2]));
                i += 3;
            } else {
                ranges.push((c, c));
                i += 1;
            }
        }
        None
    }

    fn contains(&self, c: char) -> bool {
        let hit = self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        hit != self.negated
    }
}
