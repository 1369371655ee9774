// src/render/anchors.rs
// =============================================================================
// This module reads anchor targets out of a rendered HTML document.
//
// The browser has already run the page's JavaScript; what we get here is the
// serialized DOM. We use the `scraper` crate to select every <a> element and
// the `url` crate to resolve each href the way the DOM `href` property would:
// - relative targets are joined onto the document base
// - a <base href="..."> element, if present, replaces the page URL as base
// - targets that can't be resolved come back as written
// - <a> without an href attribute comes back as None
//
// Unlike a link checker we don't filter schemes here. mailto:, javascript:
// and friends are discovered like anything else; the acceptance predicate
// decides what to do with them.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

/// Returns the resolved target of every `<a>` element in `html`, in document
/// order.
///
/// Parameters:
///   html: the rendered document
///   page_url: the URL the document was loaded from
///
/// Example:
///   html = `<a href='/docs'>Docs</a><a name="top"></a>`
///   page_url = "https://example.com/page"
///   result = [Some("https://example.com/docs"), None]
pub fn extract_anchor_hrefs(html: &str, page_url: &str) -> Vec<Option<String>> {
    let document = Html::parse_document(html);

    // Both selectors are constants and known to be valid
    let anchors = Selector::parse("a").unwrap();
    let base_tag = Selector::parse("base[href]").unwrap();

    let page_base = Url::parse(page_url).ok();

    // The first <base href> wins, resolved against the page URL itself
    let base = document
        .select(&base_tag)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| resolve(page_base.as_ref(), href))
        .and_then(|resolved| Url::parse(&resolved).ok())
        .or(page_base);

    document
        .select(&anchors)
        .map(|element| {
            element.value().attr("href").map(|href| {
                resolve(base.as_ref(), href).unwrap_or_else(|| href.trim().to_string())
            })
        })
        .collect()
}

// Resolves a possibly-relative href against `base`
//
// Url::join handles absolute hrefs too, so one call covers both cases.
fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    match base {
        Some(base) => base.join(href).ok().map(|url| url.to_string()),
        None => Url::parse(href).ok().map(|url| url.to_string()),
    }
}
