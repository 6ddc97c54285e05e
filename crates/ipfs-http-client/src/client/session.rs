use std::ops::Deref;

use ipfs_http_common::http_client::Connector;

use super::Client;

/// Scoped session on a [`Client`].
///
/// Dereferences to the client, so every API call is available on the guard.
/// Dropping the guard closes the session, whether the scope ends normally,
/// through `?`, or by unwinding.
#[must_use = "the session is closed as soon as the guard is dropped"]
pub struct SessionGuard<'a, C: Connector> {
    client: &'a Client<C>,
}

impl<'a, C: Connector> SessionGuard<'a, C> {
    pub(super) fn new(client: &'a Client<C>) -> Self {
        Self { client }
    }

    /// Close the session now rather than at the end of the scope.
    pub fn close(self) {}
}

impl<C: Connector> Deref for SessionGuard<'_, C> {
    type Target = Client<C>;

    fn deref(&self) -> &Self::Target {
        self.client
    }
}

impl<C: Connector> Drop for SessionGuard<'_, C> {
    fn drop(&mut self) {
        self.client.close();
    }
}
