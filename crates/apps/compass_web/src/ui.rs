//! Page chrome: the enter button and the body classes the stylesheet keys on.

use session::UiState;

pub const ENTER_BUTTON_ID: &str = "enter-ar";

/// Body class changes for a UI state. The two states are exclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClassChange {
    pub add: &'static str,
    pub remove: &'static str,
}

pub fn class_change(state: UiState) -> ClassChange {
    let other = match state {
        UiState::Unsupported => UiState::ArActive,
        UiState::ArActive => UiState::Unsupported,
    };
    ClassChange {
        add: state.css_class(),
        remove: other.css_class(),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn apply(document: &web_sys::Document, state: UiState) -> Result<(), wasm_bindgen::JsValue> {
    let Some(body) = document.body() else {
        return Err(wasm_bindgen::JsValue::from_str("document has no body"));
    };
    let change = class_change(state);
    let classes = body.class_list();
    classes.remove_1(change.remove)?;
    classes.add_1(change.add)
}
