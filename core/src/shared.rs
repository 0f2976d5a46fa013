//! Process-wide default client.
//!
//! Prefer passing a `Client` explicitly. The shared instance is for callers
//! that want one without wiring: it is created on first access and can be
//! configured once, before anything reads it, with `init_shared`.

use once_cell::sync::OnceCell;

use crate::client::Client;

static SHARED: OnceCell<Client> = OnceCell::new();

/// The shared client, created with `Client::new()` on first use.
pub fn shared() -> &'static Client {
    SHARED.get_or_init(Client::new)
}

/// Install `client` as the shared instance.
///
/// Succeeds only once and only if `shared()` has not run yet; otherwise the
/// client is handed back.
pub fn init_shared(client: Client) -> Result<(), Client> {
    SHARED.set(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_is_created_lazily_once_and_then_fixed() {
        let first = shared();
        assert_eq!(first.base_path(), "");
        assert!(first.headers().is_empty());
        assert!(std::ptr::eq(first, shared()));

        let late = Client::builder().base_path("http://late").build().unwrap();
        let rejected = init_shared(late).unwrap_err();
        assert_eq!(rejected.base_path(), "http://late");
        assert_eq!(shared().base_path(), "");
    }
}
