//! LaTeX encoding homogenization.
//!
//! Records copied from different sources spell the same accented letter in
//! many ways (`é`, `\'e`, `\'{e}`, `{\'{e}}`). Everything is rewritten to a
//! single canonical form, `{\'e}`, so that journal names and author names
//! compare equal no matter where they came from.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    /// Accent commands in any of their common spellings.
    ///
    /// Braced forms come first so that `{\'e}` is consumed as a whole rather
    /// than leaving its outer braces behind.
    static ref ACCENT_RE: Regex = Regex::new(
        r#"(?x)
        \{\\(?P<sym1>[`'^"~=.])\s*(?:\{(?P<arg1>\\?[A-Za-z])\}|(?P<arg2>\\?[A-Za-z]))\}
        | \{\\(?P<let1>[cvuHkr])(?:\s*\{(?P<arg3>\\?[A-Za-z])\}|\s+(?P<arg4>\\?[A-Za-z]))\}
        | \\(?P<sym2>[`'^"~=.])\s*(?:\{(?P<arg5>\\?[A-Za-z])\}|(?P<arg6>\\?[A-Za-z]))
        | \\(?P<let2>[cvuHkr])(?:\s*\{(?P<arg7>\\?[A-Za-z])\}|\s+(?P<arg8>\\?[A-Za-z]))
        "#
    )
    .expect("accent pattern is valid");

    /// Non-ASCII characters and their canonical LaTeX spelling.
    static ref UNICODE_TO_LATEX: HashMap<char, &'static str> = {
        let mut m = HashMap::new();

        // Acute
        m.insert('á', r"{\'a}"); m.insert('Á', r"{\'A}");
        m.insert('é', r"{\'e}"); m.insert('É', r"{\'E}");
        m.insert('í', r"{\'i}"); m.insert('Í', r"{\'I}");
        m.insert('ó', r"{\'o}"); m.insert('Ó', r"{\'O}");
        m.insert('ú', r"{\'u}"); m.insert('Ú', r"{\'U}");
        m.insert('ý', r"{\'y}"); m.insert('Ý', r"{\'Y}");
        m.insert('ć', r"{\'c}"); m.insert('Ć', r"{\'C}");
        m.insert('ń', r"{\'n}"); m.insert('Ń', r"{\'N}");
        m.insert('ś', r"{\'s}"); m.insert('Ś', r"{\'S}");
        m.insert('ź', r"{\'z}"); m.insert('Ź', r"{\'Z}");

        // Grave
        m.insert('à', r"{\`a}"); m.insert('À', r"{\`A}");
        m.insert('è', r"{\`e}"); m.insert('È', r"{\`E}");
        m.insert('ì', r"{\`i}"); m.insert('Ì', r"{\`I}");
        m.insert('ò', r"{\`o}"); m.insert('Ò', r"{\`O}");
        m.insert('ù', r"{\`u}"); m.insert('Ù', r"{\`U}");

        // Circumflex
        m.insert('â', r"{\^a}"); m.insert('Â', r"{\^A}");
        m.insert('ê', r"{\^e}"); m.insert('Ê', r"{\^E}");
        m.insert('î', r"{\^i}"); m.insert('Î', r"{\^I}");
        m.insert('ô', r"{\^o}"); m.insert('Ô', r"{\^O}");
        m.insert('û', r"{\^u}"); m.insert('Û', r"{\^U}");

        // Umlaut
        m.insert('ä', r#"{\"a}"#); m.insert('Ä', r#"{\"A}"#);
        m.insert('ë', r#"{\"e}"#); m.insert('Ë', r#"{\"E}"#);
        m.insert('ï', r#"{\"i}"#); m.insert('Ï', r#"{\"I}"#);
        m.insert('ö', r#"{\"o}"#); m.insert('Ö', r#"{\"O}"#);
        m.insert('ü', r#"{\"u}"#); m.insert('Ü', r#"{\"U}"#);
        m.insert('ÿ', r#"{\"y}"#);

        // Tilde
        m.insert('ã', r"{\~a}"); m.insert('Ã', r"{\~A}");
        m.insert('ñ', r"{\~n}"); m.insert('Ñ', r"{\~N}");
        m.insert('õ', r"{\~o}"); m.insert('Õ', r"{\~O}");

        // Cedilla, ogonek, caron, breve, double acute, ring, dot
        m.insert('ç', r"{\c c}"); m.insert('Ç', r"{\c C}");
        m.insert('ş', r"{\c s}"); m.insert('Ş', r"{\c S}");
        m.insert('ą', r"{\k a}"); m.insert('Ą', r"{\k A}");
        m.insert('ę', r"{\k e}"); m.insert('Ę', r"{\k E}");
        m.insert('č', r"{\v c}"); m.insert('Č', r"{\v C}");
        m.insert('ě', r"{\v e}"); m.insert('Ě', r"{\v E}");
        m.insert('ř', r"{\v r}"); m.insert('Ř', r"{\v R}");
        m.insert('š', r"{\v s}"); m.insert('Š', r"{\v S}");
        m.insert('ž', r"{\v z}"); m.insert('Ž', r"{\v Z}");
        m.insert('ğ', r"{\u g}"); m.insert('Ğ', r"{\u G}");
        m.insert('ő', r"{\H o}"); m.insert('Ő', r"{\H O}");
        m.insert('ű', r"{\H u}"); m.insert('Ű', r"{\H U}");
        m.insert('ů', r"{\r u}"); m.insert('Ů', r"{\r U}");
        m.insert('ż', r"{\.z}"); m.insert('Ż', r"{\.Z}");

        // Letters with their own commands
        m.insert('ß', r"{\ss}");
        m.insert('å', r"{\aa}"); m.insert('Å', r"{\AA}");
        m.insert('æ', r"{\ae}"); m.insert('Æ', r"{\AE}");
        m.insert('ø', r"{\o}"); m.insert('Ø', r"{\O}");
        m.insert('œ', r"{\oe}"); m.insert('Œ', r"{\OE}");
        m.insert('ł', r"{\l}"); m.insert('Ł', r"{\L}");
        m.insert('ı', r"{\i}");

        // Dashes
        m.insert('–', "--");
        m.insert('—', "---");

        m
    };
}

fn canonical_accent(caps: &Captures<'_>) -> String {
    let arg = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| caps.name(n))
            .map(|m| m.as_str())
            .unwrap_or_default()
    };

    if let Some(symbol) = caps.name("sym1").or_else(|| caps.name("sym2")) {
        let base = arg(&["arg1", "arg2", "arg5", "arg6"]);
        // A dotless i keeps its braces: {\'{\i}}
        if base.starts_with('\\') {
            format!("{{\\{}{{{}}}}}", symbol.as_str(), base)
        } else {
            format!("{{\\{}{}}}", symbol.as_str(), base)
        }
    } else {
        let letter = caps
            .name("let1")
            .or_else(|| caps.name("let2"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let base = arg(&["arg3", "arg4", "arg7", "arg8"]);
        format!("{{\\{} {}}}", letter, base)
    }
}

/// Rewrites a field value into canonical LaTeX encoding.
///
/// # Examples
///
/// ```
/// use cleanbib::latex::homogenize;
///
/// assert_eq!(homogenize("Poincaré"), r"Poincar{\'e}");
/// assert_eq!(homogenize(r"Poincar\'{e}"), r"Poincar{\'e}");
/// ```
pub fn homogenize(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match UNICODE_TO_LATEX.get(&c) {
            Some(latex) => encoded.push_str(latex),
            None => encoded.push(c),
        }
    }

    ACCENT_RE
        .replace_all(&encoded, |caps: &Captures<'_>| canonical_accent(caps))
        .into_owned()
}

/// Wraps runs of capital letters in braces so BibTeX styles keep their case.
///
/// Letters already inside braces and the names of control words (`\LaTeX`)
/// are left alone, which makes the function idempotent.
///
/// # Examples
///
/// ```
/// use cleanbib::latex::protect_capitals;
///
/// assert_eq!(protect_capitals("The DNA of Mars"), "{T}he {DNA} of {M}ars");
/// ```
pub fn protect_capitals(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    let mut depth = 0usize;
    let mut in_control_word = false;
    let mut in_run = false;

    for c in value.chars() {
        if in_run && !(c.is_uppercase() && depth == 0) {
            out.push('}');
            in_run = false;
        }

        if in_control_word && !c.is_ascii_alphabetic() {
            in_control_word = false;
        }

        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '\\' => in_control_word = true,
            c if c.is_uppercase() && depth == 0 && !in_control_word && !in_run => {
                out.push('{');
                in_run = true;
            }
            _ => {}
        }
        out.push(c);
    }

    if in_run {
        out.push('}');
    }
    out
}
