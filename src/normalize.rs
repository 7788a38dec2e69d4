use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Trailing "list/top/index" boilerplate stripped from link text before
/// matching, in Japanese or English.
static BOILERPLATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:一覧|トップ|top|index)\s*$").unwrap());

/// Separators that introduce a trailing site-name segment in page titles.
const TITLE_SEPARATORS: [&str; 4] = [" | ", " - ", " – ", " — "];

/// Decides whether an anchor's visible text plausibly describes the target
/// text retrieved for it (title or nearest heading).
pub fn is_link_text_proper(link_text: &str, target_text: &str) -> bool {
    let link_text = link_text.trim();
    let target_text = target_text.trim();
    if link_text.is_empty() || target_text.is_empty() {
        return false;
    }

    // A raw URL used as its own link text is acceptable as-is
    if is_self_describing_url(link_text) {
        return true;
    }

    let link = normalize(&strip_boilerplate_suffix(link_text));
    let target = normalize(&strip_site_suffix(target_text));
    if link.is_empty() || target.is_empty() {
        return false;
    }

    if link == target || target.contains(&link) || link.contains(&target) {
        return true;
    }

    // Mixed-script texts like "Newsお知らせ" match if any single-script run
    // of two or more characters appears in the target
    script_runs(&link)
        .iter()
        .any(|run| run.chars().count() >= 2 && target.contains(run.as_str()))
}

/// True when the text parses as an absolute URL whose serialization is the
/// text itself.
fn is_self_describing_url(text: &str) -> bool {
    Url::parse(text).map(|url| url.as_str() == text).unwrap_or(false)
}

/// Strips one trailing boilerplate suffix from link text. Keeps the input
/// when stripping would leave nothing, so a boilerplate-only link text does
/// not degenerate into a match-everything empty string.
fn strip_boilerplate_suffix(text: &str) -> String {
    let stripped = BOILERPLATE_SUFFIX.replace(text, "");
    if stripped.trim().is_empty() {
        text.to_string()
    } else {
        stripped.into_owned()
    }
}

/// Cuts the site-name segment after the last title separator. Keeps the
/// input when the separator leads the string.
fn strip_site_suffix(text: &str) -> String {
    let cut = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| text.rfind(sep))
        .max();
    match cut {
        Some(index) if index > 0 => text[..index].to_string(),
        _ => text.to_string(),
    }
}

/// Folds full-width alphanumerics and the full-width space to ASCII,
/// lowercases, and collapses whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    let folded: String = text.chars().map(fold_width).collect();
    folded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn fold_width(c: char) -> char {
    match c {
        '\u{3000}' => ' ',
        '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

/// Splits text into alternating runs of ASCII-alphanumeric and other
/// characters, so concatenated mixed-script phrases can be matched
/// piecewise.
fn script_runs(text: &str) -> Vec<String> {
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_ascii: Option<bool> = None;

    for c in text.chars() {
        let is_ascii = c.is_ascii_alphanumeric();
        if current_is_ascii != Some(is_ascii) && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
        current.push(c);
        current_is_ascii = Some(is_ascii);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
