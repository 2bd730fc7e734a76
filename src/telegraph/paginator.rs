//! Splits a recap document into page-sized chunks under the publishing
//! platform's byte budget, at paragraph boundaries only.

use tracing::warn;

use crate::telegram::formatter::{escape_html, truncate_chars};
use crate::telegraph::nodes;

/// Working byte budget for one page of serialized content. The platform's
/// hard ceiling is 64 KB; staying at 60 KB leaves room for author metadata
/// and the cross-reference header injected after creation.
pub const PAGE_SIZE_LIMIT: usize = 60 * 1024;

/// Subtracted from every budget to absorb serialization overhead.
pub const SAFETY_BUFFER: usize = 2 * 1024;

const CONTINUES_FOOTER: &str = "<hr><p><em>Continues on the next page.</em></p>";

/// Whether the document fits one page under `byte_budget`, measured on the
/// serialized node JSON.
#[must_use]
pub fn fits_single_page(html: &str, byte_budget: usize) -> bool {
    nodes::serialized_size(html) <= byte_budget.saturating_sub(SAFETY_BUFFER)
}

/// Split `html` into pages whose serialized size stays under
/// `byte_budget - SAFETY_BUFFER`.
///
/// A document that already fits is returned as a single unmodified page.
/// Otherwise the document is cut at `</p>` boundaries; every filled page is
/// closed with a "continues" footer and every continuation page opens with
/// a header naming its part index. A paragraph that alone exceeds the
/// budget is reduced to its text content and hard-truncated, so content is
/// clipped visibly rather than dropped.
#[must_use]
pub fn paginate(html: &str, title: &str, byte_budget: usize) -> Vec<String> {
    let effective = byte_budget.saturating_sub(SAFETY_BUFFER);
    if nodes::serialized_size(html) <= effective {
        return vec![html.to_string()];
    }

    let mut pages: Vec<String> = Vec::new();
    let mut current = String::new();

    for segment in html.split("</p>") {
        if segment.trim().is_empty() {
            continue;
        }
        let mut paragraph = format!("{segment}</p>");

        if paragraph_overflows(&paragraph, title, effective) {
            paragraph = truncate_paragraph(&paragraph, title, effective);
        }

        let candidate = format!("{current}{paragraph}");
        if !current.is_empty()
            && nodes::serialized_size(&format!("{candidate}{CONTINUES_FOOTER}")) > effective
        {
            current.push_str(CONTINUES_FOOTER);
            pages.push(current);
            current = continued_header(title, pages.len() + 1);
            current.push_str(&paragraph);
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }
    if pages.is_empty() {
        pages.push(html.to_string());
    }

    pages
}

fn continued_header(title: &str, part: usize) -> String {
    format!(
        "<p><strong>{} (part {part})</strong></p><p><em>Continued from the previous page.</em></p><hr>",
        escape_html(title)
    )
}

fn paragraph_overflows(paragraph: &str, title: &str, effective: usize) -> bool {
    // Worst case placement: alone on a continuation page, between the
    // continued header and the continues footer.
    let framed = format!(
        "{}{paragraph}{CONTINUES_FOOTER}",
        continued_header(title, 99)
    );
    nodes::serialized_size(&framed) > effective
}

/// Overflow fallback for a single paragraph larger than a whole page:
/// strip its markup and truncate the text until the page fits.
fn truncate_paragraph(paragraph: &str, title: &str, effective: usize) -> String {
    warn!(
        paragraph_size = nodes::serialized_size(paragraph),
        "paragraph exceeds the page budget on its own, truncating"
    );

    let text = match nodes::html_to_nodes(paragraph) {
        Ok(parsed) => nodes::collect_text(&parsed),
        Err(_) => paragraph.to_string(),
    };

    let mut keep = text.chars().count();
    loop {
        let truncated = format!("<p>{}…</p>", escape_html(&truncate_chars(&text, keep)));
        if !paragraph_overflows(&truncated, title, effective) || keep == 0 {
            return truncated;
        }
        keep = keep.saturating_sub(512);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(paragraphs: usize, paragraph_len: usize) -> String {
        (0..paragraphs)
            .map(|i| format!("<p>paragraph {i} {}</p>", "x".repeat(paragraph_len)))
            .collect()
    }

    /// Paragraph bodies of a page, injected headers and footers removed.
    fn body_paragraphs(page: &str) -> Vec<String> {
        page.split("</p>")
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("{s}</p>"))
            .filter(|p| p.starts_with("<p>paragraph "))
            .collect()
    }

    #[test]
    fn test_document_under_budget_is_returned_verbatim() {
        let html = document(3, 100);
        let pages = paginate(&html, "Recap", PAGE_SIZE_LIMIT);
        assert_eq!(pages, vec![html]);
    }

    #[test]
    fn test_every_page_stays_under_budget() {
        let html = document(40, 400);
        let budget = 8 * 1024;
        let pages = paginate(&html, "Recap", budget);

        assert!(pages.len() > 1);
        for page in &pages {
            assert!(nodes::serialized_size(page) <= budget - SAFETY_BUFFER);
        }
    }

    #[test]
    fn test_paragraph_sequence_is_preserved_and_unsplit() {
        let html = document(40, 400);
        let pages = paginate(&html, "Recap", 8 * 1024);

        let reassembled: Vec<String> = pages.iter().flat_map(|p| body_paragraphs(p)).collect();
        let original: Vec<String> = body_paragraphs(&html);
        assert_eq!(reassembled, original);
    }

    #[test]
    fn test_continuation_pages_carry_part_headers_and_footers() {
        let pages = paginate(&document(40, 400), "My Recap", 8 * 1024);

        for page in &pages[..pages.len() - 1] {
            assert!(page.ends_with(CONTINUES_FOOTER));
        }
        for (i, page) in pages.iter().enumerate().skip(1) {
            assert!(page.starts_with(&format!("<p><strong>My Recap (part {})</strong></p>", i + 1)));
        }
    }

    #[test]
    fn test_oversized_single_paragraph_is_truncated_not_dropped() {
        let html = format!("<p>{}</p>", "y".repeat(20_000));
        let budget = 8 * 1024;
        let pages = paginate(&html, "Recap", budget);

        assert_eq!(pages.len(), 1);
        assert!(nodes::serialized_size(&pages[0]) <= budget - SAFETY_BUFFER);
        assert!(pages[0].contains('…'));
        assert!(pages[0].contains("yyy"));
    }

    #[test]
    fn test_title_in_header_is_escaped() {
        let pages = paginate(&document(40, 400), "Q&A <live>", 8 * 1024);
        assert!(pages.len() > 1);
        assert!(pages[1].contains("Q&amp;A &lt;live&gt; (part 2)"));
    }
}
