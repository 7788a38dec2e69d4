use url::Url;

/// Outcome of resolving a raw href against the page it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedHref {
    /// An absolute, fetchable URL.
    Absolute {
        url: String,
        /// True when the link targets a fragment within a document.
        is_anchor: bool,
    },
    /// mailto/tel/javascript links and malformed references; the extractor
    /// drops these unless the raw href was empty or exactly `#`.
    Unresolvable,
}

/// Resolves a raw anchor href to an absolute URL.
///
/// hrefs that already carry an http(s) scheme pass through unchanged;
/// root-relative paths resolve against the base's origin; a bare fragment
/// is appended to the page URL as written; everything else is a standard
/// relative reference against the base.
pub fn resolve_href(href: &str, base_url: &str) -> ResolvedHref {
    if href.starts_with("http://") || href.starts_with("https://") {
        return ResolvedHref::Absolute {
            url: href.to_string(),
            is_anchor: has_fragment(href),
        };
    }

    if href.starts_with("mailto:") || href.starts_with("tel:") || href.starts_with("javascript:") {
        return ResolvedHref::Unresolvable;
    }

    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            ::log::debug!("Unparsable base URL {}: {}", base_url, e);
            return ResolvedHref::Unresolvable;
        }
    };

    if href.starts_with('/') {
        let url = format!("{}{}", base.origin().ascii_serialization(), href);
        return ResolvedHref::Absolute {
            is_anchor: has_fragment(&url),
            url,
        };
    }

    if href.starts_with('#') {
        return ResolvedHref::Absolute {
            url: format!("{}{}", base_url, href),
            is_anchor: true,
        };
    }

    match base.join(href) {
        Ok(resolved) => {
            let is_anchor = matches!(resolved.fragment(), Some(f) if !f.is_empty());
            ResolvedHref::Absolute {
                url: resolved.to_string(),
                is_anchor,
            }
        }
        Err(e) => {
            ::log::debug!("Could not resolve href {} against {}: {}", href, base_url, e);
            ResolvedHref::Unresolvable
        }
    }
}

/// True when the URL carries a non-empty fragment. A trailing bare `#`
/// does not count.
fn has_fragment(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.fragment(), Some(f) if !f.is_empty()))
        .unwrap_or(false)
}
