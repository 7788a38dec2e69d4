pub mod fragment;
pub mod links;


use scraper::ElementRef;

/// Concatenated descendant text of an element, trimmed. Equivalent to the
/// DOM's textContent.
fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
