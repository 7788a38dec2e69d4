use crate::resolver::{ResolvedHref, resolve_href};
use crate::results::Link;
use scraper::{ElementRef, Html, Selector};

/// Extracts every anchor on a page, in document order.
///
/// Anchors whose href cannot be resolved are dropped, except empty and
/// bare-`#` hrefs, which are kept so judgment can report them as their own
/// categories.
pub fn extract_links(html: &str, base_url: &str) -> Vec<Link> {
    let doc = Html::parse_document(html);
    let anchor_selector = Selector::parse("a").unwrap();

    let mut links = Vec::new();
    for anchor in doc.select(&anchor_selector) {
        let original_href = anchor.value().attr("href").unwrap_or("").to_string();

        let (href, is_anchor) = match resolve_href(&original_href, base_url) {
            ResolvedHref::Absolute { url, is_anchor } => (url, is_anchor),
            ResolvedHref::Unresolvable => {
                if original_href.is_empty() || original_href == "#" {
                    (String::new(), original_href == "#")
                } else {
                    continue;
                }
            }
        };

        let aria_label = anchor
            .value()
            .attr("aria-label")
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string);
        let img_alts = collect_img_alts(&anchor);
        let text = effective_text(&anchor, aria_label.as_deref(), &img_alts);

        links.push(Link {
            original_href,
            href,
            text,
            aria_label,
            img_alts: if img_alts.is_empty() {
                None
            } else {
                Some(img_alts)
            },
            is_anchor,
            source_html: anchor.html(),
            parent_html: anchor.parent().and_then(ElementRef::wrap).map(|p| p.html()),
        });
    }

    ::log::debug!("Extracted {} links from {}", links.len(), base_url);
    links
}

/// Picks the anchor's effective text: aria-label, then the title
/// attribute, then image alts, then direct text-node children, then the
/// full descendant text.
fn effective_text(anchor: &ElementRef, aria_label: Option<&str>, img_alts: &[String]) -> String {
    if let Some(label) = aria_label {
        return label.to_string();
    }

    // A title attribute shadows everything below it, even when empty
    if let Some(title) = anchor.value().attr("title") {
        return title.trim().to_string();
    }

    if !img_alts.is_empty() {
        return img_alts.join(" ");
    }

    // Text nodes directly under the anchor, ignoring nested elements
    let direct = anchor
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !direct.is_empty() {
        return direct;
    }

    super::element_text(anchor)
}

/// Non-empty alt texts of images inside the anchor, in document order.
fn collect_img_alts(anchor: &ElementRef) -> Vec<String> {
    let img_selector = Selector::parse("img").unwrap();
    anchor
        .select(&img_selector)
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .collect()
}
