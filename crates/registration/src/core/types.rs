use std::time::Duration;

use crate::RegistrationError;

/// One browser page the signup flow can drive.
///
/// Implemented by the headless Chrome session and by test fakes. Every call
/// blocks the calling thread, so drive it from a blocking worker.
pub trait PageDriver: Send {
    /// Navigate and wait for the page to load
    fn goto(&self, url: &str) -> Result<(), RegistrationError>;

    /// Check if an element exists on the page right now
    fn has_element(&self, selector: &str) -> bool;

    /// Values of `attribute` on every element matching `selector`
    fn attribute_values(&self, selector: &str, attribute: &str) -> Result<Vec<String>, RegistrationError>;

    /// Replace the value of an input field
    fn fill(&self, selector: &str, value: &str) -> Result<(), RegistrationError>;

    /// Click a button, link or checkbox
    fn click(&self, selector: &str) -> Result<(), RegistrationError>;

    /// Wait until an element is present. `Timeout` when it never shows up.
    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), RegistrationError>;

    /// Wait until the current URL contains `fragment`
    fn wait_for_url(&self, fragment: &str, timeout: Duration) -> Result<(), RegistrationError>;

    /// Select the first `<option>` with a non-empty value and return that value
    fn select_first_valued_option(&self, selector: &str) -> Result<Option<String>, RegistrationError>;
}

/// Acquires browser sessions.
///
/// The returned page owns the session: dropping it releases the browser.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self) -> Result<Box<dyn PageDriver>, RegistrationError>;
}
