use feg_common::Secret;

use crate::traits::ReconciliationDbError;

#[allow(async_fn_in_trait)]
pub trait SecretStore {
    /// Looks up `name` in the key/value secrets table.
    async fn fetch_secret(&self, name: &str) -> Result<Option<Secret<String>>, ReconciliationDbError>;
}
