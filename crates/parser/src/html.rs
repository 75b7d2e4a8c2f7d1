use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static ANCHOR_WITH_HREF: Lazy<Option<Selector>> = Lazy::new(|| selector("a[href]"));

/// Return the `href` of the first anchor that carries one.
///
/// The confirmation template puts the confirmation button first, so no
/// ranking is done here.
pub fn extract_confirmation_link(html: &str) -> Option<String> {
    let sel = ANCHOR_WITH_HREF.as_ref()?;
    let document = Html::parse_document(html);

    document
        .select(sel)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_link() {
        assert_eq!(
            extract_confirmation_link(r#"<a href="https://x/y">go</a>"#),
            Some("https://x/y".to_string())
        );
    }

    #[test]
    fn test_no_anchor_yields_none() {
        assert_eq!(extract_confirmation_link("<p>Welcome aboard</p>"), None);
        assert_eq!(extract_confirmation_link(""), None);
    }

    #[test]
    fn test_skips_anchor_without_href() {
        let html = r#"
            <html><body>
                <a name="top">anchor</a>
                <a href=" https://fxreplay.com/confirm?token=abc ">Confirm</a>
                <a href="https://fxreplay.com/unsubscribe">Unsubscribe</a>
            </body></html>
        "#;
        assert_eq!(
            extract_confirmation_link(html),
            Some("https://fxreplay.com/confirm?token=abc".to_string())
        );
    }
}
