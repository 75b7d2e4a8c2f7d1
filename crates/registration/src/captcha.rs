use std::fmt;

use tracing::{debug, info};

use crate::core::PageDriver;

/// reCAPTCHA container rendered on the signup page
pub const CAPTCHA_WIDGET: &str = ".g-recaptcha";
const CAPTCHA_FRAME_MARKER: &str = "recaptcha";

/// Anti-automation challenge found on a page. Never solved, only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeKind {
    /// The widget container is in the DOM
    Widget,
    /// An iframe loads the widget
    Frame,
}

impl ChallengeKind {
    /// Operator-facing warning
    pub fn warning(&self) -> &'static str {
        match self {
            ChallengeKind::Widget => "⚠️ CAPTCHA detected on signup page: please solve manually.",
            ChallengeKind::Frame => "⚠️ CAPTCHA iframe detected: please solve manually.",
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeKind::Widget => write!(f, "reCAPTCHA widget on page"),
            ChallengeKind::Frame => write!(f, "reCAPTCHA iframe on page"),
        }
    }
}

/// Detect a CAPTCHA on the current page
pub fn detect_challenge(page: &dyn PageDriver) -> Option<ChallengeKind> {
    if page.has_element(CAPTCHA_WIDGET) {
        info!("detected reCAPTCHA widget");
        return Some(ChallengeKind::Widget);
    }

    match page.attribute_values("iframe", "src") {
        Ok(sources) => {
            if sources
                .iter()
                .any(|src| src.to_lowercase().contains(CAPTCHA_FRAME_MARKER))
            {
                info!("detected reCAPTCHA iframe");
                return Some(ChallengeKind::Frame);
            }
        }
        // a page we cannot scan is treated as challenge-free
        Err(e) => debug!("iframe scan failed: {}", e),
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePage, FakeSite};

    #[test]
    fn test_widget_detected() {
        let page = FakePage::new(FakeSite {
            captcha_widget: true,
            ..FakeSite::default()
        });
        assert_eq!(detect_challenge(&page), Some(ChallengeKind::Widget));
    }

    #[test]
    fn test_frame_detected_by_src() {
        let page = FakePage::new(FakeSite {
            iframe_srcs: vec![
                "https://player.example/embed".to_string(),
                "https://www.google.com/reCAPTCHA/api2/anchor?k=abc".to_string(),
            ],
            ..FakeSite::default()
        });
        assert_eq!(detect_challenge(&page), Some(ChallengeKind::Frame));
    }

    #[test]
    fn test_clean_page() {
        let page = FakePage::new(FakeSite {
            iframe_srcs: vec!["https://player.example/embed".to_string()],
            ..FakeSite::default()
        });
        assert_eq!(detect_challenge(&page), None);
    }
}
