//! Inbound mail payload and its address-based authentication.

use serde::{Deserialize, Serialize};

/// A plaintext mail addressed to `<secret>@<domain>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMail {
    pub recipient: String,
    pub body: String,
}

/// Returns whether the local part of `recipient` equals `secret`.
///
/// Malformed addresses and wrong secrets are indistinguishable to callers.
pub fn recipient_matches_secret(recipient: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    match recipient.trim().rsplit_once('@') {
        Some((local_part, _domain)) => local_part == secret,
        None => false,
    }
}

/// Drops trailing lines that are empty or whitespace-only.
pub fn trim_trailing_blank_lines(body: &str) -> &str {
    let mut end = body.len();
    loop {
        let head = &body[..end];
        let line_start = head.rfind('\n').map_or(0, |index| index + 1);
        if !head[line_start..].trim().is_empty() {
            return head;
        }
        if line_start == 0 {
            return "";
        }
        end = line_start - 1;
    }
}
