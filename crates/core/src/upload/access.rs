//! Who may see an uploaded file.

use parley_shared::types::{RealmId, UserId};

use super::types::{Attachment, Principal};

/// Outcome of the checks that need no extra lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    /// The principal may see the file.
    Granted,
    /// The principal may not see the file.
    Denied,
    /// Allowed only if the user received the file.
    NeedsRecipientCheck(UserId),
}

/// Decides access from the attachment alone.
///
/// `realm_id` is the realm the request was made against. Anonymous visitors
/// only see web-public files of that realm. Users see their own files,
/// realm-public files of their realm and web-public files of the requested
/// realm; anything else depends on whether they received the file.
#[must_use]
pub fn check_access(principal: &Principal, realm_id: RealmId, attachment: &Attachment) -> AccessCheck {
    let web_public_here = attachment.is_web_public && attachment.realm_id == realm_id;

    match *principal {
        Principal::Anonymous if web_public_here => AccessCheck::Granted,
        Principal::Anonymous => AccessCheck::Denied,
        Principal::User {
            user_id,
            realm_id: user_realm,
        } => {
            if attachment.owner_id == user_id
                || (attachment.is_realm_public && attachment.realm_id == user_realm)
                || web_public_here
            {
                AccessCheck::Granted
            } else {
                AccessCheck::NeedsRecipientCheck(user_id)
            }
        }
    }
}
