use headless_chrome::{Browser, Tab};
use std::ffi::OsString;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use trialbot_core::config::BrowserConfig;

use crate::core::{BrowserLauncher, PageDriver};
use crate::RegistrationError;

const URL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One headless Chrome session with a single tab.
///
/// Dropping the session closes the tab and kills the browser process, so
/// every exit path of a signup releases it.
pub struct HeadlessBrowser {
    tab: Arc<Tab>,
    // kept alive for the tab; the process dies when this drops
    _browser: Browser,
}

impl HeadlessBrowser {
    /// Launch a new headless browser instance
    pub fn new(config: &BrowserConfig) -> Result<Self, RegistrationError> {
        let mut extra_args: Vec<OsString> = Vec::new();

        // Required for running in Docker containers
        extra_args.push(OsString::from("--no-sandbox"));
        extra_args.push(OsString::from("--disable-dev-shm-usage"));
        extra_args.push(OsString::from("--disable-gpu"));

        let mut builder = headless_chrome::LaunchOptionsBuilder::default();
        builder
            .headless(config.headless)
            .window_size(Some((1920, 1080)))
            .args(extra_args.iter().map(|a| a.as_ref()).collect());

        if let Some(chrome_path) = &config.chrome_path {
            builder.path(Some(std::path::PathBuf::from(chrome_path)));
        }

        let launch_options = builder
            .build()
            .map_err(|e| RegistrationError::BrowserError(e.to_string()))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| RegistrationError::BrowserError(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RegistrationError::BrowserError(e.to_string()))?;
        tab.set_default_timeout(config.navigation_timeout());

        info!("browser session acquired");

        Ok(Self { tab, _browser: browser })
    }

    fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>, RegistrationError> {
        self.tab
            .evaluate(script, false)
            .map(|result| result.value)
            .map_err(|e| RegistrationError::BrowserError(e.to_string()))
    }
}

impl PageDriver for HeadlessBrowser {
    fn goto(&self, url: &str) -> Result<(), RegistrationError> {
        info!("navigating to {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| RegistrationError::BrowserError(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| RegistrationError::BrowserError(e.to_string()))?;

        Ok(())
    }

    fn has_element(&self, selector: &str) -> bool {
        self.tab.find_element(selector).is_ok()
    }

    fn attribute_values(&self, selector: &str, attribute: &str) -> Result<Vec<String>, RegistrationError> {
        // no match is reported as an error by the tab; for a scan that is just empty
        let elements = match self.tab.find_elements(selector) {
            Ok(elements) => elements,
            Err(_) => return Ok(vec![]),
        };

        Ok(elements
            .iter()
            .filter_map(|el| el.get_attribute_value(attribute).ok().flatten())
            .collect())
    }

    fn fill(&self, selector: &str, value: &str) -> Result<(), RegistrationError> {
        let selector_js = js_string(selector)?;
        let value_js = js_string(value)?;

        // Set the value directly so a retry replaces what was typed before
        let filled = self.evaluate(&format!(
            r#"
            (() => {{
                const elem = document.querySelector({});
                if (!elem) {{
                    return false;
                }}
                elem.focus();
                elem.value = {};
                elem.dispatchEvent(new Event('input', {{ bubbles: true }}));
                elem.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            selector_js, value_js
        ))?;

        match filled {
            Some(serde_json::Value::Bool(true)) => {
                debug!("filled field: {}", selector);
                Ok(())
            }
            _ => Err(RegistrationError::ElementNotFound(selector.to_string())),
        }
    }

    fn click(&self, selector: &str) -> Result<(), RegistrationError> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|_| RegistrationError::ElementNotFound(selector.to_string()))?;

        element
            .click()
            .map_err(|e| RegistrationError::BrowserError(e.to_string()))?;

        debug!("clicked: {}", selector);
        Ok(())
    }

    fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), RegistrationError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|_| RegistrationError::Timeout(selector.to_string()))
    }

    fn wait_for_url(&self, fragment: &str, timeout: Duration) -> Result<(), RegistrationError> {
        let started = Instant::now();

        loop {
            let url = self.tab.get_url();
            if url.contains(fragment) {
                info!("reached {}", url);
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(RegistrationError::Timeout(format!("url containing {}", fragment)));
            }
            std::thread::sleep(URL_POLL_INTERVAL);
        }
    }

    fn select_first_valued_option(&self, selector: &str) -> Result<Option<String>, RegistrationError> {
        let selector_js = js_string(selector)?;

        let picked = self.evaluate(&format!(
            r#"
            (() => {{
                const select = document.querySelector({});
                if (!select) {{
                    return null;
                }}
                for (const opt of select.options) {{
                    if (opt.value) {{
                        select.value = opt.value;
                        opt.selected = true;
                        select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                        return opt.value;
                    }}
                }}
                return "";
            }})()
            "#,
            selector_js
        ))?;

        match picked {
            Some(serde_json::Value::String(value)) if value.is_empty() => Ok(None),
            Some(serde_json::Value::String(value)) => Ok(Some(value)),
            _ => Err(RegistrationError::ElementNotFound(selector.to_string())),
        }
    }
}

impl Drop for HeadlessBrowser {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            debug!("closing tab failed: {}", e);
        }
        info!("browser session released");
    }
}

/// Launches headless Chrome sessions
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

impl BrowserLauncher for ChromeLauncher {
    fn launch(&self) -> Result<Box<dyn PageDriver>, RegistrationError> {
        Ok(Box::new(HeadlessBrowser::new(&self.config)?))
    }
}

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> Result<String, RegistrationError> {
    serde_json::to_string(value).map_err(|e| RegistrationError::Other(e.to_string()))
}
