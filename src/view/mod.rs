//! View tree and the element types the UI helpers operate on
//!
//! Elements are addressed by stable string ids. Helpers never look elements
//! up through global state: they receive a `ViewTree` (or an element handle)
//! from the caller, so the same code drives the terminal page and the
//! in-memory trees used in tests.

pub mod dialog;
pub mod usage;

pub use dialog::{activate, bind_triggers, close_dialog, open_dialog, show_terms_dialog};
pub use usage::{update_usage_indicator, Tier, UsageBar};

use std::sync::atomic::{AtomicU64, Ordering};

/// Trigger that opens the login dialog
pub const LOGIN_TRIGGER: &str = "loginBtn";
/// Trigger that opens the signup dialog
pub const SIGNUP_TRIGGER: &str = "signupBtn";
pub const LOGIN_DIALOG: &str = "loginModal";
pub const SIGNUP_DIALOG: &str = "signupModal";
pub const TERMS_DIALOG: &str = "termsModal";
pub const USAGE_BAR: &str = "usageBar";

// Bumped each time a dialog is shown; orders the open dialogs
static OPEN_SEQ: AtomicU64 = AtomicU64::new(0);

/// Layout state of a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    None,
    Flex,
}

/// A modal dialog
#[derive(Debug, Clone)]
pub struct Dialog {
    pub id: String,
    pub title: String,
    pub body: Vec<String>,
    pub display: Display,
    // Position in the stack of open dialogs, set when shown
    stack_seq: u64,
}

impl Dialog {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: Vec::new(),
            display: Display::None,
            stack_seq: 0,
        }
    }

    pub fn with_body(mut self, lines: &[&str]) -> Self {
        self.body = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Show the dialog on top of any other open dialog
    pub fn open(&mut self) {
        self.display = Display::Flex;
        self.stack_seq = OPEN_SEQ.fetch_add(1, Ordering::Relaxed) + 1;
    }

    pub fn close(&mut self) {
        self.display = Display::None;
    }

    pub fn is_open(&self) -> bool {
        self.display == Display::Flex
    }
}

/// What happens when a trigger is activated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenDialog(String),
}

/// An activatable element (a button on the page)
#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: String,
    pub label: String,
    pub key: char,
    pub on_activate: Option<Action>,
}

impl Trigger {
    pub fn new(id: impl Into<String>, label: impl Into<String>, key: char) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            key,
            on_activate: None,
        }
    }
}

/// Id-addressed access to the elements of a page
pub trait ViewTree {
    fn dialog_mut(&mut self, id: &str) -> Option<&mut Dialog>;
    fn trigger_mut(&mut self, id: &str) -> Option<&mut Trigger>;
    fn usage_bar_mut(&mut self, id: &str) -> Option<&mut UsageBar>;
}

/// In-memory view tree
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub dialogs: Vec<Dialog>,
    pub triggers: Vec<Trigger>,
    pub usage_bar: Option<(String, UsageBar)>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialog(mut self, dialog: Dialog) -> Self {
        self.dialogs.push(dialog);
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_usage_bar(mut self, id: impl Into<String>) -> Self {
        self.usage_bar = Some((id.into(), UsageBar::default()));
        self
    }

    /// The account page: login/signup triggers, their dialogs, the terms
    /// dialog and the usage bar
    pub fn account_page() -> Self {
        Self::new()
            .with_trigger(Trigger::new(LOGIN_TRIGGER, "Log in", 'l'))
            .with_trigger(Trigger::new(SIGNUP_TRIGGER, "Sign up", 's'))
            .with_dialog(Dialog::new(LOGIN_DIALOG, "Log in").with_body(&[
                "Log in on the web dashboard to manage your plan.",
                "Credits shown here refresh automatically.",
            ]))
            .with_dialog(Dialog::new(SIGNUP_DIALOG, "Sign up").with_body(&[
                "Create an account on the web dashboard.",
                "New accounts start with no credits until a plan is purchased.",
            ]))
            .with_dialog(Dialog::new(TERMS_DIALOG, "Terms of Service").with_body(&[
                "Credits are consumed one per generated video.",
                "Purchased credits stack on top of any remaining balance.",
                "Cancelled plans keep their credits until the plan expiry date.",
                "Refunds are not issued for consumed credits.",
            ]))
            .with_usage_bar(USAGE_BAR)
    }

    pub fn dialog(&self, id: &str) -> Option<&Dialog> {
        self.dialogs.iter().find(|d| d.id == id)
    }

    pub fn usage_bar(&self) -> Option<&UsageBar> {
        self.usage_bar.as_ref().map(|(_, bar)| bar)
    }

    /// Open dialogs in the order they were opened
    pub fn open_dialogs(&self) -> Vec<&Dialog> {
        let mut open: Vec<&Dialog> = self.dialogs.iter().filter(|d| d.is_open()).collect();
        open.sort_by_key(|d| d.stack_seq);
        open
    }

    /// The dialog drawn on top, if any
    pub fn top_dialog_id(&self) -> Option<String> {
        self.open_dialogs().last().map(|d| d.id.clone())
    }

    pub fn trigger_for_key(&self, key: char) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.key == key)
    }
}

impl ViewTree for Page {
    fn dialog_mut(&mut self, id: &str) -> Option<&mut Dialog> {
        self.dialogs.iter_mut().find(|d| d.id == id)
    }

    fn trigger_mut(&mut self, id: &str) -> Option<&mut Trigger> {
        self.triggers.iter_mut().find(|t| t.id == id)
    }

    fn usage_bar_mut(&mut self, id: &str) -> Option<&mut UsageBar> {
        match &mut self.usage_bar {
            Some((bar_id, bar)) if bar_id == id => Some(bar),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_page_has_all_elements() {
        let mut page = Page::account_page();

        for id in [LOGIN_DIALOG, SIGNUP_DIALOG, TERMS_DIALOG] {
            assert!(page.dialog(id).is_some(), "missing dialog {}", id);
            assert!(!page.dialog(id).unwrap().is_open());
        }
        assert!(page.trigger_mut(LOGIN_TRIGGER).is_some());
        assert!(page.trigger_mut(SIGNUP_TRIGGER).is_some());
        assert!(page.usage_bar_mut(USAGE_BAR).is_some());
        assert!(page.usage_bar_mut("otherBar").is_none());
    }

    #[test]
    fn test_open_dialogs_follow_open_order() {
        let mut page = Page::account_page();
        open_dialog(&mut page, TERMS_DIALOG);
        open_dialog(&mut page, LOGIN_DIALOG);

        let ids: Vec<&str> = page.open_dialogs().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![TERMS_DIALOG, LOGIN_DIALOG]);
        assert_eq!(page.top_dialog_id().as_deref(), Some(LOGIN_DIALOG));

        // Reopening an already open dialog brings it to the top
        open_dialog(&mut page, TERMS_DIALOG);
        assert_eq!(page.top_dialog_id().as_deref(), Some(TERMS_DIALOG));

        close_dialog(&mut page, TERMS_DIALOG);
        assert_eq!(page.top_dialog_id().as_deref(), Some(LOGIN_DIALOG));
    }

    #[test]
    fn test_lookup_and_close_keep_stacking_order() {
        let mut page = Page::account_page();
        open_dialog(&mut page, LOGIN_DIALOG);
        open_dialog(&mut page, SIGNUP_DIALOG);

        // Touching a dialog without showing it does not restack
        let _ = page.dialog_mut(LOGIN_DIALOG);
        close_dialog(&mut page, TERMS_DIALOG);
        assert_eq!(page.top_dialog_id().as_deref(), Some(SIGNUP_DIALOG));

        // A closed dialog reopened later goes back on top
        close_dialog(&mut page, LOGIN_DIALOG);
        assert_eq!(page.top_dialog_id().as_deref(), Some(SIGNUP_DIALOG));
        open_dialog(&mut page, LOGIN_DIALOG);
        assert_eq!(page.top_dialog_id().as_deref(), Some(LOGIN_DIALOG));
    }

    #[test]
    fn test_trigger_for_key() {
        let page = Page::account_page();
        assert_eq!(page.trigger_for_key('l').map(|t| t.id.as_str()), Some(LOGIN_TRIGGER));
        assert_eq!(page.trigger_for_key('s').map(|t| t.id.as_str()), Some(SIGNUP_TRIGGER));
        assert!(page.trigger_for_key('x').is_none());
    }
}
