//! Session labels for the credential exchange.

/// Maximum label length accepted by the delegation protocol.
pub const MAX_SESSION_LABEL_LEN: usize = 64;

/// Audit correlation label `<tenantId>-<requestId>`.
///
/// Characters outside `[A-Za-z0-9+=,.@-]` become `-`; the label is cut at
/// [`MAX_SESSION_LABEL_LEN`] characters and padded to the protocol minimum
/// of two.
#[must_use]
pub fn session_label(tenant_id: &str, request_id: &str) -> String {
    let mut label: String = format!("{tenant_id}-{request_id}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '+' | '=' | ',' | '.' | '@' | '-') {
                c
            } else {
                '-'
            }
        })
        .take(MAX_SESSION_LABEL_LEN)
        .collect();
    while label.len() < 2 {
        label.push('-');
    }
    label
}
