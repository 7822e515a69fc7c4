//! Dialog visibility control and trigger binding

use super::{Action, Dialog, ViewTree, LOGIN_DIALOG, LOGIN_TRIGGER, SIGNUP_DIALOG, SIGNUP_TRIGGER, TERMS_DIALOG};

/// Show the dialog with the given id. Unknown ids are ignored.
pub fn open_dialog<T: ViewTree + ?Sized>(tree: &mut T, id: &str) {
    open(tree.dialog_mut(id));
}

/// Hide the dialog with the given id. Unknown ids are ignored.
pub fn close_dialog<T: ViewTree + ?Sized>(tree: &mut T, id: &str) {
    close(tree.dialog_mut(id));
}

pub fn show_terms_dialog<T: ViewTree + ?Sized>(tree: &mut T) {
    open_dialog(tree, TERMS_DIALOG);
}

/// Handle-level open for callers that already hold the element
pub fn open(dialog: Option<&mut Dialog>) {
    if let Some(dialog) = dialog {
        dialog.open();
    }
}

/// Handle-level close for callers that already hold the element
pub fn close(dialog: Option<&mut Dialog>) {
    if let Some(dialog) = dialog {
        dialog.close();
    }
}

/// Wire the login and signup triggers to their dialogs.
///
/// Called once when the page is ready. Either trigger may be missing.
pub fn bind_triggers<T: ViewTree + ?Sized>(tree: &mut T) {
    for (trigger_id, dialog_id) in [(LOGIN_TRIGGER, LOGIN_DIALOG), (SIGNUP_TRIGGER, SIGNUP_DIALOG)] {
        match tree.trigger_mut(trigger_id) {
            Some(trigger) => {
                trigger.on_activate = Some(Action::OpenDialog(dialog_id.to_string()));
                tracing::debug!("Bound {} -> {}", trigger_id, dialog_id);
            }
            None => tracing::debug!("No {} trigger on page, skipping binding", trigger_id),
        }
    }
}

/// Run the action bound to a trigger. Unknown or unbound triggers do nothing.
pub fn activate<T: ViewTree + ?Sized>(tree: &mut T, trigger_id: &str) {
    let action = tree
        .trigger_mut(trigger_id)
        .and_then(|t| t.on_activate.clone());

    if let Some(Action::OpenDialog(id)) = action {
        open_dialog(tree, &id);
    }
}
