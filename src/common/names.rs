use std::sync::LazyLock;

use regex::Regex;

/// Characters that separate words in an area name.  Kept in the output.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[- ()/]").expect("separator pattern is valid")
});

/// Words kept lowercase when they are not the first word of a name.
const PREPOSITIONS: &[&str] = &["De", "Do", "Da", "Dos", "Das", "E", "A", "O", "Os", "D'", "Ao", "À"];

/// First letter upper case, the rest lower case.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Normalize a raw area name for display: each word capitalized, Portuguese
/// prepositions lowercase after the first word, and no space after `d'`.
///
/// `"SAO JOAO D' EL REI"` becomes `"Sao Joao d'El Rei"`.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    let mut first = true;

    let mut push_word = |out: &mut String, word: &str| {
        let mut tok = capitalize(word);
        if !first && PREPOSITIONS.contains(&tok.as_str()) {
            tok = tok.to_lowercase();
        }
        first = false;
        out.push_str(&tok);
        tok == "d'"
    };

    for sep in SEPARATORS.find_iter(raw) {
        let eat = push_word(&mut out, &raw[last..sep.start()]);
        if !(eat && sep.as_str() == " ") {
            out.push_str(sep.as_str());
        }
        last = sep.end();
    }
    let _ = push_word(&mut out, &raw[last..]);
    out
}
