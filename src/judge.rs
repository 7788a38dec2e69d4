use crate::normalize::is_link_text_proper;
use crate::results::Verdict;
use url::Url;

/// Assigns a verdict to one checked link.
///
/// Precedence: empty href, placeholder `#` href, the same-page "back to
/// top" special case, status range, then the text-match heuristics.
pub fn judge(
    link_text: &str,
    title_or_text: &str,
    status_code: u16,
    original_href: &str,
    resolved_url: &str,
    found_on: &str,
) -> Verdict {
    if original_href.is_empty() {
        return Verdict::Empty;
    }

    if original_href == "#" {
        return Verdict::Dummy;
    }

    // A same-page #top link is acceptable whatever its text says
    if is_top_of_same_page(resolved_url, found_on) {
        return Verdict::Ok;
    }

    if status_code < 200 || status_code >= 400 {
        return Verdict::Error;
    }

    if !is_link_text_proper(link_text, title_or_text) {
        return Verdict::Review;
    }

    Verdict::Ok
}

/// True when the resolved URL is a `#top` fragment of the page it was
/// found on. Unparsable URLs never qualify; judgment falls through to the
/// status rule instead.
fn is_top_of_same_page(resolved_url: &str, found_on: &str) -> bool {
    let (Ok(href_url), Ok(page_url)) = (Url::parse(resolved_url), Url::parse(found_on)) else {
        return false;
    };
    href_url.fragment() == Some("top")
        && href_url.origin() == page_url.origin()
        && href_url.path() == page_url.path()
}
