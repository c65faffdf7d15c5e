//! Shared helpers for the HTML-table adapters.

use scraper::{ElementRef, Selector};

/// Parse a static selector. Only called with literal CSS, so a parse
/// failure is a programming error.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}

/// Visible text of an element with whitespace collapsed to single spaces.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether any ancestor element carries the given class.
pub(crate) fn has_ancestor_with_class(el: ElementRef<'_>, class: &str) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().classes().any(|c| c == class))
}

/// Nearest ancestor element carrying the given class.
pub(crate) fn ancestor_with_class<'a>(el: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().classes().any(|c| c == class))
}

/// First column whose header text contains any of the keywords.
pub(crate) fn column_index(headers: &[String], keywords: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| keywords.iter().any(|kw| header.contains(kw)))
}

/// Cell text at `index`, if the column was found and the cell is non-empty.
pub(crate) fn cell_at(cells: &[String], index: Option<usize>) -> Option<String> {
    let value = cells.get(index?)?;
    if value.is_empty() {
        None
    } else {
        Some(value.clone())
    }
}
