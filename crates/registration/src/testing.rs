//! Fakes for the browser, mailbox and notification seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeZone;

use trialbot_core::{InboxMessage, MailboxIdentity};

use crate::captcha::CAPTCHA_WIDGET;
use crate::core::{BrowserLauncher, PageDriver};
use crate::inbox::{LinkClicker, MailboxError, MailboxProvider};
use crate::notify::Notifier;
use crate::orchestrator::signup_engine::selectors::*;
use crate::orchestrator::signup_engine::DASHBOARD_FRAGMENT;
use crate::RegistrationError;

pub fn identity(name: &str) -> MailboxIdentity {
    MailboxIdentity {
        local_part: format!("{}_1700000000", name),
        domain: "snv.email".to_string(),
        created_at: chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    }
}

/// How the fake site behaves
#[derive(Debug, Clone)]
pub struct FakeSite {
    pub captcha_widget: bool,
    pub iframe_srcs: Vec<String>,
    /// The first submit shows the username-taken error
    pub username_taken: bool,
    pub redirects_to_dashboard: bool,
    pub server_options: Vec<String>,
    /// Selectors that are not on any page
    pub missing: Vec<String>,
}

impl Default for FakeSite {
    fn default() -> Self {
        Self {
            captcha_widget: false,
            iframe_srcs: vec![],
            username_taken: false,
            redirects_to_dashboard: true,
            server_options: vec![String::new(), "eu-1".to_string(), "us-1".to_string()],
            missing: vec![],
        }
    }
}

pub struct FakePage {
    site: FakeSite,
    url: Mutex<String>,
    submits: AtomicUsize,
    actions: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicBool>,
}

impl FakePage {
    pub fn new(site: FakeSite) -> Self {
        Self::with_log(site, Arc::default(), Arc::default())
    }

    fn with_log(site: FakeSite, actions: Arc<Mutex<Vec<String>>>, released: Arc<AtomicBool>) -> Self {
        Self {
            site,
            url: Mutex::new("about:blank".to_string()),
            submits: AtomicUsize::new(0),
            actions,
            released,
        }
    }

    fn log(&self, action: String) {
        self.actions.lock().unwrap().push(action);
    }

    fn is_missing(&self, selector: &str) -> bool {
        self.site.missing.iter().any(|m| m == selector)
    }
}

impl PageDriver for FakePage {
    fn goto(&self, url: &str) -> Result<(), RegistrationError> {
        *self.url.lock().unwrap() = url.to_string();
        self.log(format!("goto {}", url));
        Ok(())
    }

    fn has_element(&self, selector: &str) -> bool {
        if selector == CAPTCHA_WIDGET {
            return self.site.captcha_widget;
        }
        !self.is_missing(selector)
    }

    fn attribute_values(&self, selector: &str, _attribute: &str) -> Result<Vec<String>, RegistrationError> {
        if selector == "iframe" {
            return Ok(self.site.iframe_srcs.clone());
        }
        Ok(vec![])
    }

    fn fill(&self, selector: &str, value: &str) -> Result<(), RegistrationError> {
        if self.is_missing(selector) {
            return Err(RegistrationError::ElementNotFound(selector.to_string()));
        }
        self.log(format!("fill {}={}", selector, value));
        Ok(())
    }

    fn click(&self, selector: &str) -> Result<(), RegistrationError> {
        if self.is_missing(selector) {
            return Err(RegistrationError::ElementNotFound(selector.to_string()));
        }
        self.log(format!("click {}", selector));

        if selector == SUBMIT_BUTTON {
            let submits = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
            if self.site.redirects_to_dashboard && (!self.site.username_taken || submits >= 2) {
                *self.url.lock().unwrap() = format!("https://fxreplay.com{}", DASHBOARD_FRAGMENT);
            }
        }
        Ok(())
    }

    fn wait_for_element(&self, selector: &str, _timeout: Duration) -> Result<(), RegistrationError> {
        let present = match selector {
            USERNAME_TAKEN_ERROR => {
                self.site.username_taken && self.submits.load(Ordering::SeqCst) == 1
            }
            SERVER_SELECT => !self.site.server_options.is_empty(),
            other => !self.is_missing(other),
        };
        if present {
            Ok(())
        } else {
            Err(RegistrationError::Timeout(selector.to_string()))
        }
    }

    fn wait_for_url(&self, fragment: &str, _timeout: Duration) -> Result<(), RegistrationError> {
        if self.url.lock().unwrap().contains(fragment) {
            Ok(())
        } else {
            Err(RegistrationError::Timeout(format!("url containing {}", fragment)))
        }
    }

    fn select_first_valued_option(&self, selector: &str) -> Result<Option<String>, RegistrationError> {
        let picked = self.site.server_options.iter().find(|v| !v.is_empty()).cloned();
        if let Some(value) = &picked {
            self.log(format!("select {}={}", selector, value));
        }
        Ok(picked)
    }
}

impl Drop for FakePage {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

pub struct FakeLauncher {
    site: Option<FakeSite>,
    actions: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicBool>,
    launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Some(site),
            actions: Arc::default(),
            released: Arc::default(),
            launches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            site: None,
            ..Self::new(FakeSite::default())
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl BrowserLauncher for FakeLauncher {
    fn launch(&self) -> Result<Box<dyn PageDriver>, RegistrationError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let site = self
            .site
            .clone()
            .ok_or_else(|| RegistrationError::BrowserError("chrome not found".to_string()))?;
        Ok(Box::new(FakePage::with_log(
            site,
            self.actions.clone(),
            self.released.clone(),
        )))
    }
}

/// Serves scripted fetch results, then empty inboxes
#[derive(Default)]
pub struct FakeMailbox {
    responses: Mutex<VecDeque<Result<Vec<InboxMessage>, u16>>>,
    fetches: AtomicUsize,
}

impl FakeMailbox {
    pub fn scripted(responses: Vec<Result<Vec<InboxMessage>, u16>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailboxProvider for FakeMailbox {
    async fn fetch_messages(&self, _address: &str) -> Result<Vec<InboxMessage>, MailboxError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(messages)) => Ok(messages),
            Some(Err(status)) => Err(MailboxError::Status(status)),
            None => Ok(vec![]),
        }
    }
}

#[derive(Default)]
pub struct FakeClicker {
    pub fail: bool,
    clicks: Mutex<Vec<String>>,
}

impl FakeClicker {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkClicker for FakeClicker {
    async fn follow(&self, link: &str) -> Result<(), MailboxError> {
        self.clicks.lock().unwrap().push(link.to_string());
        if self.fail {
            Err(MailboxError::Status(503))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}

pub fn confirmation_message(link: &str) -> InboxMessage {
    InboxMessage {
        sender: "noreply@mandrillapp.com".to_string(),
        subject: "Confirm your email".to_string(),
        body_html: format!(r#"<p>Welcome to FX Replay</p><a href="{}">Confirm</a>"#, link),
    }
}
