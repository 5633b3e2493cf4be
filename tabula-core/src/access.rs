//! Store-backed [`BaseLookup`].

use rusqlite::Connection;
use tabula_access::{BaseAccess, BaseLookup};
use tabula_model::BaseRole;
use tabula_store::{StoreError, bases, members};
use tabula_types::{BaseId, UserId};

/// Resolves ownership and membership against an open connection.
///
/// Trashed bases are still found here; the mutation guard reports them as
/// being in trash rather than missing.
pub struct StoreLookup<'a>(pub &'a Connection);

impl BaseLookup for StoreLookup<'_> {
    type Error = StoreError;

    fn base_access(&self, base_id: BaseId) -> Result<Option<BaseAccess>, StoreError> {
        Ok(bases::access(self.0, base_id)?.map(|(owner_id, visibility)| BaseAccess {
            owner_id,
            visibility,
        }))
    }

    fn membership_role(
        &self,
        base_id: BaseId,
        user_id: UserId,
    ) -> Result<Option<BaseRole>, StoreError> {
        members::role(self.0, base_id, user_id)
    }
}
