//! Session-backed cart store.
//!
//! Binds the pure cart state machine from `fernwood-core` to durable
//! per-visitor storage: the serialized cart lives in the session under a
//! fixed key, is hydrated at the start of each request that touches it,
//! and is written back after every mutation.
//!
//! Persistence is best-effort by contract. A cart mutation never fails
//! because the session store failed; storage errors are logged and the
//! in-memory cart remains authoritative for the rest of the request.
//! Unreadable persisted state is discarded in favor of an empty cart.

use tower_sessions::Session;

use fernwood_core::{Cart, CartCommand};

/// Session keys for cart data.
pub mod session_keys {
    /// Key under which the serialized cart snapshot is stored.
    pub const CART: &str = "cart";
}

/// The cart store: load-at-use, save-on-every-mutation.
///
/// Constructed per request from the extracted [`Session`]; the store holds
/// no state of its own beyond the session handle.
#[derive(Debug, Clone)]
pub struct CartStore {
    session: Session,
}

impl CartStore {
    /// Wrap a session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Load the cart from the session, falling back to an empty cart when
    /// nothing is stored or the stored state fails to parse.
    pub async fn load(&self) -> Cart {
        match self.session.get::<Cart>(session_keys::CART).await {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable cart state");
                Cart::new()
            }
        }
    }

    /// Apply a command to the stored cart and persist the successor state,
    /// returning it.
    ///
    /// Always succeeds: the transition itself is total, and a failed
    /// persistence write is logged rather than surfaced.
    pub async fn dispatch(&self, command: CartCommand) -> Cart {
        let cart = self.load().await.apply(command);
        self.save(&cart).await;
        cart
    }

    /// Best-effort write of the cart snapshot to the session.
    async fn save(&self, cart: &Cart) {
        if let Err(e) = self.session.insert(session_keys::CART, cart).await {
            tracing::error!(
                error = %e,
                "Failed to persist cart; in-memory state remains authoritative"
            );
        }
    }
}
