use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::quota::{Account, Usage, UsageSource};
use crate::view::{self, Page, USAGE_BAR};

/// Seconds a status message stays in the info line
const STATUS_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

pub struct App {
    pub popup: Popup,

    // View tree: triggers, dialogs and the usage bar
    pub page: Page,

    pub config: AppConfig,
    pub source: UsageSource,

    // Last values read from the source
    pub usage: Usage,
    pub account: Option<Account>,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub last_refresh: Instant,
}

impl App {
    pub async fn new(config: AppConfig, source: UsageSource) -> Result<Self> {
        let mut app = Self::with_page(config, source, Page::account_page());
        app.refresh().await;
        Ok(app)
    }

    /// Build the app around an existing page and wire its triggers
    pub fn with_page(config: AppConfig, source: UsageSource, mut page: Page) -> Self {
        view::bind_triggers(&mut page);

        Self {
            popup: Popup::None,
            page,
            config,
            source,
            usage: Usage::default(),
            account: None,
            status_message: None,
            status_message_time: None,
            last_refresh: Instant::now(),
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Whether any dialog or popup captures keys
    pub fn has_overlay(&self) -> bool {
        self.popup != Popup::None || self.page.top_dialog_id().is_some()
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        if let Some(id) = self.page.top_dialog_id() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                view::close_dialog(&mut self.page, &id);
            }
            return Ok(());
        }

        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('t') => view::show_terms_dialog(&mut self.page),
            KeyCode::Char('R') => {
                self.refresh().await;
                if self.status_message.is_none() {
                    self.set_status("Usage refreshed");
                }
            }
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
            KeyCode::Char(c) => {
                // Page triggers are activated by their key
                if let Some(id) = self.page.trigger_for_key(c).map(|t| t.id.clone()) {
                    view::activate(&mut self.page, &id);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        if let Popup::Help = self.popup {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                self.popup = Popup::None;
            }
        }
        Ok(())
    }

    /// Re-read the usage source and redraw the usage bar
    pub async fn refresh(&mut self) {
        self.last_refresh = Instant::now();

        match self.source.read().await {
            Ok(snapshot) => {
                self.usage = snapshot.usage;
                self.account = snapshot.account;
            }
            Err(e) => {
                tracing::warn!("Could not read usage: {}", e);
                self.set_status(format!("Error: {}", e));
            }
        }

        view::update_usage_indicator(
            &mut self.page,
            USAGE_BAR,
            self.usage.current as f64,
            self.usage.total as f64,
        );
    }

    pub async fn tick(&mut self) -> Result<()> {
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_TIMEOUT_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        let every = Duration::from_secs(self.config.refresh_secs.max(1));
        if self.last_refresh.elapsed() >= every {
            self.refresh().await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use crate::view::{Tier, LOGIN_DIALOG, SIGNUP_DIALOG, TERMS_DIALOG};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn app(current: u64, total: u64) -> App {
        App::new(AppConfig::default(), UsageSource::Fixed { current, total })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_app_draws_usage_bar() {
        let app = app(45, 100).await;
        let bar = app.page.usage_bar().unwrap();
        assert_eq!(bar.width_percent, 45.0);
        assert_eq!(bar.tier, Tier::Warning);
    }

    #[tokio::test]
    async fn test_trigger_keys_open_dialogs() {
        let mut app = app(0, 10).await;

        app.handle_key(key(KeyCode::Char('l'))).await.unwrap();
        assert_eq!(app.page.top_dialog_id().as_deref(), Some(LOGIN_DIALOG));

        // Keys go to the open dialog; 's' does not open signup underneath
        app.handle_key(key(KeyCode::Char('s'))).await.unwrap();
        assert!(!app.page.dialog(SIGNUP_DIALOG).unwrap().is_open());

        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert!(!app.has_overlay());

        app.handle_key(key(KeyCode::Char('s'))).await.unwrap();
        assert_eq!(app.page.top_dialog_id().as_deref(), Some(SIGNUP_DIALOG));
    }

    #[tokio::test]
    async fn test_terms_key() {
        let mut app = app(0, 10).await;
        app.handle_key(key(KeyCode::Char('t'))).await.unwrap();
        assert!(app.page.dialog(TERMS_DIALOG).unwrap().is_open());

        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        assert!(!app.page.dialog(TERMS_DIALOG).unwrap().is_open());
    }

    #[tokio::test]
    async fn test_help_popup() {
        let mut app = app(0, 10).await;
        app.handle_key(key(KeyCode::Char('?'))).await.unwrap();
        assert_eq!(app.popup, Popup::Help);

        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.popup, Popup::None);
    }

    #[tokio::test]
    async fn test_unreadable_source_keeps_last_usage() {
        let mut app = app(8, 10).await;
        app.source = UsageSource::File {
            path: std::env::temp_dir().join("quotabar-test-missing").join("users.json"),
            account: None,
        };

        app.refresh().await;
        assert!(app.status_message.as_deref().unwrap_or("").starts_with("Error"));
        assert_eq!(app.usage, Usage { current: 8, total: 10 });
        assert_eq!(app.page.usage_bar().unwrap().tier, Tier::Critical);
    }
}
