//! Helper functions for store keys and record projection

use crate::PrincipalId;

/// Prefix shared by every key this crate writes
pub const KEY_PREFIX: &str = "content_index";

/// Key holding the process-wide invalidation mark
///
/// # Example
///
/// ```
/// use content_index::helpers::global_mark_key;
///
/// assert_eq!(global_mark_key(), "content_index:global:invalidated_at");
/// ```
pub fn global_mark_key() -> String {
    format!("{}:global:invalidated_at", KEY_PREFIX)
}

/// Key holding a principal's cached item array
pub fn principal_items_key(principal: &PrincipalId) -> String {
    format!("{}:principal:{}:items", KEY_PREFIX, principal)
}

/// Key holding a principal's index build timestamp
pub fn principal_built_at_key(principal: &PrincipalId) -> String {
    format!("{}:principal:{}:built_at", KEY_PREFIX, principal)
}

/// Escape a title for embedding in HTML markup
///
/// Well-formed entities already present in the title (`&amp;`, `&#8217;`,
/// `&#x2019;`) pass through unchanged.
///
/// # Example
///
/// ```
/// use content_index::helpers::escape_html;
///
/// assert_eq!(escape_html("Tom & Jerry <3"), "Tom &amp; Jerry &lt;3");
/// assert_eq!(escape_html("Rock &#8217;n&#8217; Roll"), "Rock &#8217;n&#8217; Roll");
/// ```
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for (pos, ch) in raw.char_indices() {
        match ch {
            '&' if starts_with_entity(&raw[pos..]) => escaped.push('&'),
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Longest entity body considered, excluding `&` and `;`
const MAX_ENTITY_LEN: usize = 32;

/// `text` starts with `&name;`, `&#digits;` or `&#xhex;`
fn starts_with_entity(text: &str) -> bool {
    let Some(end) = text
        .bytes()
        .take(MAX_ENTITY_LEN + 2)
        .position(|b| b == b';')
    else {
        return false;
    };
    let body = &text[1..end];

    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else if let Some(digits) = body.strip_prefix('#') {
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    } else {
        !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

/// Render an edit URL from a template containing `{id}` and `{type}` placeholders
///
/// # Example
///
/// ```
/// use content_index::helpers::render_edit_url;
///
/// let url = render_edit_url("/admin/{type}/{id}/edit", "42", "page");
/// assert_eq!(url, "/admin/page/42/edit");
/// ```
pub fn render_edit_url(template: &str, id: &str, content_type: &str) -> String {
    template.replace("{id}", id).replace("{type}", content_type)
}
