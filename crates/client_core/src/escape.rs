//! Terminal-safe rendering of service-supplied text. Markup escaping goes
//! through `v_htmlescape` in the view.

use std::borrow::Cow;

/// Replaces control characters (including ESC, which starts terminal escape
/// sequences) with U+FFFD.
pub fn sanitize_terminal(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|ch| if ch.is_control() { '\u{FFFD}' } else { ch })
            .collect(),
    )
}
