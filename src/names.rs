//! Author name splitting and citation-style formatting.
//!
//! Raw author fields are split into one string per author, each author is
//! decomposed into its BibTeX `von`/`last`/`jr`/`first` parts, and the parts
//! are written back as `von Last, Jr, F.~M.` with initials tied together by
//! `~` so that they are never broken across lines.

use thiserror::Error;

/// Errors that can occur when splitting a name into its parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("empty name")]
    Empty,

    #[error("unbalanced braces in name")]
    UnbalancedBraces,

    #[error("too many commas in name ({0} sections, at most 3 allowed)")]
    TooManySections(usize),

    #[error("name has no last name")]
    EmptyLast,
}

/// One author's name, split into its BibTeX parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    /// Lowercase particles, e.g. `["van", "der"]`
    pub von: Vec<String>,
    /// Family name tokens (never empty for a parsed name)
    pub last: Vec<String>,
    /// Suffix tokens, e.g. `["Jr"]`
    pub jr: Vec<String>,
    /// Given names or initials
    pub first: Vec<String>,
}

impl PersonName {
    /// The family name as a single string (`last` tokens joined by spaces).
    pub fn family_name(&self) -> String {
        self.last.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Upper,
    Lower,
    Caseless,
}

#[derive(Debug)]
struct Token {
    text: String,
    case: Case,
}

fn is_name_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '~')
}

/// Splits an author field into one raw string per author.
///
/// Authors are separated by the word `and` (any case) at brace depth 0, so
/// `{Barnes and Noble}` stays a single author. Whitespace inside each name
/// is collapsed and empty names are dropped.
///
/// # Examples
///
/// ```
/// use cleanbib::names::split_authors;
///
/// let authors = split_authors("Einstein, Albert and Podolsky, B.");
/// assert_eq!(authors, vec!["Einstein, Albert", "Podolsky, B."]);
/// ```
pub fn split_authors(field: &str) -> Vec<String> {
    let mut authors = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;

    for c in field.chars() {
        match c {
            '{' => {
                depth += 1;
                word.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                word.push(c);
            }
            c if depth == 0 && c.is_whitespace() => {
                end_author_word(&mut word, &mut current, &mut authors);
            }
            c => word.push(c),
        }
    }
    end_author_word(&mut word, &mut current, &mut authors);
    if !current.is_empty() {
        authors.push(current.join(" "));
    }

    authors
}

fn end_author_word(word: &mut String, current: &mut Vec<String>, authors: &mut Vec<String>) {
    if word.is_empty() {
        return;
    }
    if word.eq_ignore_ascii_case("and") {
        word.clear();
        if !current.is_empty() {
            authors.push(current.join(" "));
            current.clear();
        }
    } else {
        current.push(std::mem::take(word));
    }
}

fn end_name_word(sections: &mut [Vec<Token>], word: &mut String, case: &mut Option<Case>) {
    if !word.is_empty() {
        if let Some(section) = sections.last_mut() {
            section.push(Token {
                text: std::mem::take(word),
                case: case.unwrap_or(Case::Caseless),
            });
        }
    }
    *case = None;
}

/// Splits one raw name into comma-separated sections of cased tokens.
fn tokenize(name: &str) -> Result<Vec<Vec<Token>>, NameError> {
    let mut sections: Vec<Vec<Token>> = vec![Vec::new()];
    let mut word = String::new();
    let mut case: Option<Case> = None;
    let mut level = 0usize;
    let mut group_start = 0usize;

    for c in name.chars() {
        match c {
            '{' => {
                if level == 0 {
                    group_start = word.len();
                }
                level += 1;
                word.push(c);
            }
            '}' => {
                if level == 0 {
                    return Err(NameError::UnbalancedBraces);
                }
                level -= 1;
                if level == 0 && case.is_none() {
                    let group = &word[group_start + 1..];
                    case = Some(if group.starts_with('\\') {
                        special_char_case(group)
                    } else {
                        Case::Caseless
                    });
                }
                word.push(c);
            }
            ',' if level == 0 => {
                end_name_word(&mut sections, &mut word, &mut case);
                sections.push(Vec::new());
            }
            c if level == 0 && is_name_whitespace(c) => {
                end_name_word(&mut sections, &mut word, &mut case);
            }
            c => {
                if level == 0 && case.is_none() && c.is_alphabetic() {
                    case = Some(if c.is_uppercase() {
                        Case::Upper
                    } else {
                        Case::Lower
                    });
                }
                word.push(c);
            }
        }
    }

    if level != 0 {
        return Err(NameError::UnbalancedBraces);
    }
    end_name_word(&mut sections, &mut word, &mut case);

    Ok(sections)
}

/// Case of a brace group starting with a control sequence, like `{\"O}`.
///
/// The first letter after the control sequence decides; `{\AA}` or `{\ss}`
/// fall back to the control word itself.
fn special_char_case(group: &str) -> Case {
    let body = group.strip_prefix('\\').unwrap_or(group);
    let mut chars = body.chars();
    let (control_word, rest): (Option<char>, &str) = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            let len = body
                .find(|ch: char| !ch.is_ascii_alphabetic())
                .unwrap_or(body.len());
            (Some(c), &body[len..])
        }
        Some(c) => (None, &body[c.len_utf8()..]),
        None => (None, ""),
    };

    let letter = rest.chars().find(|c| c.is_alphabetic()).or(control_word);
    match letter {
        Some(c) if c.is_uppercase() => Case::Upper,
        Some(c) if c.is_lowercase() => Case::Lower,
        _ => Case::Caseless,
    }
}

fn texts(tokens: &[Token]) -> Vec<String> {
    tokens.iter().map(|t| t.text.clone()).collect()
}

/// Splits a single name into its `von`, `last`, `jr` and `first` parts.
///
/// Accepts the three BibTeX forms `First von Last`, `von Last, First` and
/// `von Last, Jr, First`.
///
/// # Examples
///
/// ```
/// use cleanbib::names::parse_name;
///
/// let name = parse_name("Ludwig van Beethoven").unwrap();
/// assert_eq!(name.first, vec!["Ludwig"]);
/// assert_eq!(name.von, vec!["van"]);
/// assert_eq!(name.last, vec!["Beethoven"]);
/// ```
pub fn parse_name(raw: &str) -> Result<PersonName, NameError> {
    let mut sections = tokenize(raw)?;

    if sections.iter().all(|s| s.is_empty()) {
        return Err(NameError::Empty);
    }
    // "Aristotle, " is how a name without given names is written back
    if sections.len() > 1 && sections.last().is_some_and(|s| s.is_empty()) {
        sections.pop();
    }
    if sections.len() > 3 {
        return Err(NameError::TooManySections(sections.len()));
    }

    let mut name = PersonName::default();

    if sections.len() == 1 {
        let words = sections.remove(0);
        let n = words.len();
        match n {
            1 => name.last = texts(&words),
            2 => {
                name.first = texts(&words[..1]);
                name.last = texts(&words[1..]);
            }
            _ => {
                let first_lower = words.iter().position(|t| t.case == Case::Lower);
                let last_lower = words.iter().rposition(|t| t.case == Case::Lower);
                match (first_lower, last_lower) {
                    (Some(start), Some(end)) => {
                        // The final word always belongs to the last name.
                        let end = if end == n - 1 { n - 2 } else { end };
                        name.first = texts(&words[..start]);
                        if start <= end {
                            name.von = texts(&words[start..=end]);
                        }
                        name.last = texts(&words[end + 1..]);
                    }
                    _ => {
                        name.first = texts(&words[..n - 1]);
                        name.last = texts(&words[n - 1..]);
                    }
                }
            }
        }
        return Ok(name);
    }

    let first = sections.pop().unwrap_or_default();
    name.first = texts(&first);
    if sections.len() == 2 {
        let jr = sections.pop().unwrap_or_default();
        name.jr = texts(&jr);
    }

    let words = sections.pop().unwrap_or_default();
    let n = words.len();
    if n == 0 {
        return Err(NameError::EmptyLast);
    }
    match words.iter().rposition(|t| t.case == Case::Lower) {
        Some(end) if n > 1 => {
            let end = if end == n - 1 { n - 2 } else { end };
            name.von = texts(&words[..=end]);
            name.last = texts(&words[end + 1..]);
        }
        _ => name.last = texts(&words),
    }

    Ok(name)
}

/// Writes the given names using the `~` initials-joining rule.
///
/// Single letters get a period, jammed initials such as `A.B.` are split into
/// `A.~B.`, and a token with a period (or a bare letter) is tied to the next
/// one with `~`.
fn format_first_names(tokens: &[String], out: &mut String) {
    for (i, token) in tokens.iter().enumerate() {
        let single = token.chars().count() == 1;

        if single {
            out.push_str(token);
            out.push('.');
        } else if token.matches('.').count() > 1 && !token.contains('-') {
            let initials: Vec<&str> = token
                .split('.')
                .map(str::trim)
                .filter(|fragment| !fragment.is_empty())
                .collect();
            out.push_str(&initials.join(".~"));
            out.push('.');
        } else {
            out.push_str(token);
        }

        if i + 1 < tokens.len() {
            if single || token.contains('.') {
                out.push('~');
            } else {
                out.push(' ');
            }
        }
    }
}

/// Formats one parsed name as `von Last, Jr, First`.
pub fn format_name(name: &PersonName) -> String {
    let mut out = String::new();

    for von in &name.von {
        out.push_str(von);
        out.push(' ');
    }
    out.push_str(&name.last.join(" "));
    out.push_str(", ");

    if !name.jr.is_empty() {
        out.push_str(&name.jr.concat());
        out.push_str(", ");
    }

    format_first_names(&name.first, &mut out);
    out
}

/// Formats parsed names into a single `and`-separated author string.
pub fn format_names(names: &[PersonName]) -> String {
    names
        .iter()
        .map(format_name)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Parses and formats a list of raw author strings.
///
/// # Examples
///
/// ```
/// use cleanbib::names::format_authors;
///
/// let authors = vec!["Einstein, Albert".to_string(), "Podolsky, B.".to_string()];
/// assert_eq!(
///     format_authors(&authors).unwrap(),
///     "Einstein, Albert and Podolsky, B."
/// );
/// ```
pub fn format_authors(raw: &[String]) -> Result<String, NameError> {
    let names = raw
        .iter()
        .map(|name| parse_name(name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format_names(&names))
}
