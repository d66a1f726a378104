//! Access policy for file records.
//!
//! Every metadata or storage operation funnels through [`authorize`], a pure
//! function over the acting identity and the record's ownership/visibility.
//! Handlers map [`Decision::Deny`] to a 403; a record that does not exist at
//! all is a 404 before this function is ever consulted.

use uuid::Uuid;

/// The identity acting on a request, as established by token validation.
#[derive(Clone, Copy, Debug)]
pub struct Actor {
    pub id: Uuid,
    pub is_admin: bool,
}

/// Operation kinds on a file record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileAction {
    /// Read the metadata record.
    ReadMetadata,
    /// Obtain a presigned download URL for the bytes.
    Download,
    /// Change filename, description, or visibility.
    UpdateMetadata,
    /// Obtain a presigned upload URL for the bytes.
    Upload,
    /// Remove the record and its backing object.
    Delete,
}

/// Outcome of an authorization check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Decide whether `actor` may perform `action` on a record owned by
/// `owner_id` with the given visibility.
///
/// Reads (metadata and download) are granted to the owner, an admin, or
/// anyone when the record is public. Writes and deletes are granted only to
/// the owner or an admin. Deterministic, no precedence ambiguity.
pub fn authorize(actor: Actor, owner_id: Uuid, is_public: bool, action: FileAction) -> Decision {
    let is_owner = actor.id == owner_id;
    let allowed = match action {
        FileAction::ReadMetadata | FileAction::Download => is_owner || actor.is_admin || is_public,
        FileAction::UpdateMetadata | FileAction::Upload | FileAction::Delete => {
            is_owner || actor.is_admin
        }
    };
    if allowed { Decision::Allow } else { Decision::Deny }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [FileAction; 5] = [
        FileAction::ReadMetadata,
        FileAction::Download,
        FileAction::UpdateMetadata,
        FileAction::Upload,
        FileAction::Delete,
    ];

    fn owner() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn owner_may_do_everything() {
        let owner_id = owner();
        let actor = Actor { id: owner_id, is_admin: false };
        for action in ALL_ACTIONS {
            assert_eq!(authorize(actor, owner_id, false, action), Decision::Allow);
            assert_eq!(authorize(actor, owner_id, true, action), Decision::Allow);
        }
    }

    #[test]
    fn admin_may_do_everything_on_foreign_records() {
        let actor = Actor { id: Uuid::new_v4(), is_admin: true };
        for action in ALL_ACTIONS {
            assert_eq!(authorize(actor, owner(), false, action), Decision::Allow);
        }
    }

    #[test]
    fn stranger_is_denied_every_action_on_private_records() {
        let actor = Actor { id: Uuid::new_v4(), is_admin: false };
        for action in ALL_ACTIONS {
            assert_eq!(authorize(actor, owner(), false, action), Decision::Deny);
        }
    }

    #[test]
    fn public_records_are_readable_but_not_writable_by_strangers() {
        let actor = Actor { id: Uuid::new_v4(), is_admin: false };
        let owner_id = owner();

        assert_eq!(
            authorize(actor, owner_id, true, FileAction::ReadMetadata),
            Decision::Allow
        );
        assert_eq!(
            authorize(actor, owner_id, true, FileAction::Download),
            Decision::Allow
        );

        for action in [FileAction::UpdateMetadata, FileAction::Upload, FileAction::Delete] {
            assert_eq!(authorize(actor, owner_id, true, action), Decision::Deny);
        }
    }

    #[test]
    fn download_and_metadata_read_gate_identically() {
        let owner_id = owner();
        let cases = [
            (Actor { id: owner_id, is_admin: false }, false),
            (Actor { id: Uuid::new_v4(), is_admin: false }, false),
            (Actor { id: Uuid::new_v4(), is_admin: true }, false),
            (Actor { id: Uuid::new_v4(), is_admin: false }, true),
        ];
        for (actor, is_public) in cases {
            assert_eq!(
                authorize(actor, owner_id, is_public, FileAction::ReadMetadata),
                authorize(actor, owner_id, is_public, FileAction::Download),
            );
        }
    }
}
