use scraper::{ElementRef, Html, Selector};

/// Text representing the target of an in-page fragment.
///
/// Finds the element whose id equals `anchor_id` (raw string match) and
/// derives text for it: the element itself if it is a heading, else the
/// nearest preceding heading (earlier siblings first, then up through
/// ancestors), else the first heading nested inside it, else its first
/// paragraph, else its own text, with the last two capped at 100 characters.
/// Returns None when the id does not exist or the chosen step produced no
/// text; callers fall back to the document title.
pub fn fragment_text(html: &str, anchor_id: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let id_selector = Selector::parse("[id]").unwrap();
    let element = doc
        .select(&id_selector)
        .find(|el| el.value().id() == Some(anchor_id))?;

    if is_heading(&element) {
        return non_empty(super::element_text(&element));
    }

    let mut current = Some(element);
    while let Some(el) = current {
        for node in el.prev_siblings() {
            if let Some(sibling) = ElementRef::wrap(node) {
                if is_heading(&sibling) {
                    return non_empty(super::element_text(&sibling));
                }
            }
        }
        current = el.parent().and_then(ElementRef::wrap);
        if let Some(parent) = &current {
            if is_heading(parent) {
                return non_empty(super::element_text(parent));
            }
        }
    }

    let heading_selector = Selector::parse("h1, h2, h3, h4, h5, h6").unwrap();
    if let Some(heading) = element.select(&heading_selector).next() {
        return non_empty(super::element_text(&heading));
    }

    let paragraph_selector = Selector::parse("p").unwrap();
    if let Some(paragraph) = element.select(&paragraph_selector).next() {
        return non_empty(truncate(super::element_text(&paragraph)));
    }

    non_empty(truncate(super::element_text(&element)))
}

/// The document's title with whitespace collapsed, the way the DOM title
/// attribute reports it. None when the title is missing or empty.
pub fn document_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let title_selector = Selector::parse("title").unwrap();
    let title = doc
        .select(&title_selector)
        .next()?
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(title)
}

fn is_heading(element: &ElementRef) -> bool {
    matches!(
        element.value().name(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Caps runaway paragraph/body text at 100 characters.
fn truncate(text: String) -> String {
    if text.chars().count() > 100 {
        let head: String = text.chars().take(100).collect();
        format!("{}...", head)
    } else {
        text
    }
}
