use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue},
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

/// Name of the cookie carrying the visitor's cart session id.
pub const SESSION_COOKIE: &str = "cart_session";

#[derive(Debug, Clone)]
struct CartSession {
    items: HashMap<Uuid, u32>,
    expires_at: DateTime<Utc>,
}

/// Server-side store of per-visitor carts: a `product id → quantity`
/// mapping keyed by session id.
///
/// Mutations go through `DashMap::entry`, which holds the shard write
/// lock for the whole read-modify-write, so concurrent requests from the
/// same visitor cannot lose updates. Every mutation refreshes the
/// session's expiry; expired sessions read as empty until the sweeper
/// drops them.
pub struct CartSessionStore {
    sessions: DashMap<Uuid, CartSession>,
    ttl: Duration,
}

impl CartSessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::seconds(ttl_secs.min(i64::MAX as u64) as i64),
        }
    }

    /// Increment the quantity for a product, inserting it when absent.
    pub fn add(&self, session_id: Uuid, product_id: Uuid, quantity: u32) -> HashMap<Uuid, u32> {
        self.mutate(session_id, |items| {
            let entry = items.entry(product_id).or_insert(0);
            *entry = entry.saturating_add(quantity);
        })
    }

    /// Set the quantity for a product exactly, inserting it when absent.
    pub fn set(&self, session_id: Uuid, product_id: Uuid, quantity: u32) -> HashMap<Uuid, u32> {
        self.mutate(session_id, |items| {
            items.insert(product_id, quantity);
        })
    }

    /// Remove a product from the cart. Removing an absent product is a
    /// no-op.
    pub fn remove(&self, session_id: Uuid, product_id: Uuid) -> HashMap<Uuid, u32> {
        self.mutate(session_id, |items| {
            items.remove(&product_id);
        })
    }

    /// Current contents of the session's cart. Missing and expired
    /// sessions read as empty.
    pub fn snapshot(&self, session_id: Uuid) -> HashMap<Uuid, u32> {
        match self.sessions.get(&session_id) {
            Some(session) if session.expires_at > Utc::now() => session.items.clone(),
            _ => HashMap::new(),
        }
    }

    /// Drop the session's cart entirely.
    pub fn clear(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        before - self.sessions.len()
    }

    /// Number of live sessions (expired-but-unswept included).
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn mutate(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&mut HashMap<Uuid, u32>),
    ) -> HashMap<Uuid, u32> {
        let now = Utc::now();
        let mut entry = self
            .sessions
            .entry(session_id)
            .or_insert_with(|| CartSession {
                items: HashMap::new(),
                expires_at: now + self.ttl,
            });

        // A session that outlived its TTL starts over
        if entry.expires_at <= now {
            entry.items.clear();
        }
        entry.expires_at = now + self.ttl;

        f(&mut entry.items);
        entry.items.clone()
    }
}

/// The visitor's cart session identity, minted lazily on first use.
///
/// Extracted from the `cart_session` cookie; when the cookie is missing
/// or malformed a fresh id is generated and `fresh` is set so the
/// handler can send it back via `Set-Cookie`.
#[derive(Debug, Clone, Copy)]
pub struct CartSessionId {
    pub id: Uuid,
    pub fresh: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for CartSessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| raw.split(';'))
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| name.trim() == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok());

        Ok(match existing {
            Some(id) => Self { id, fresh: false },
            None => Self {
                id: Uuid::new_v4(),
                fresh: true,
            },
        })
    }
}

/// Attach the session cookie to a response when the session was freshly
/// minted. The cookie is a browser-session cookie; the server-side TTL
/// governs actual cart lifetime.
pub fn with_session_cookie(session: CartSessionId, mut response: Response) -> Response {
    if !session.fresh {
        return response;
    }

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session.id
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CartSessionStore {
        CartSessionStore::new(3600)
    }

    #[test]
    fn add_sums_quantities_for_the_same_product() {
        let store = store();
        let session = Uuid::new_v4();
        let product = Uuid::new_v4();

        store.add(session, product, 3);
        let cart = store.add(session, product, 2);

        assert_eq!(cart.get(&product), Some(&5));
    }

    #[test]
    fn set_overwrites_instead_of_summing() {
        let store = store();
        let session = Uuid::new_v4();
        let product = Uuid::new_v4();

        store.add(session, product, 3);
        let cart = store.set(session, product, 1);

        assert_eq!(cart.get(&product), Some(&1));
    }

    #[test]
    fn set_inserts_an_absent_product() {
        let store = store();
        let session = Uuid::new_v4();
        let product = Uuid::new_v4();

        let cart = store.set(session, product, 4);

        assert_eq!(cart.get(&product), Some(&4));
    }

    #[test]
    fn remove_is_a_noop_for_absent_products() {
        let store = store();
        let session = Uuid::new_v4();
        let present = Uuid::new_v4();

        store.add(session, present, 1);
        let cart = store.remove(session, Uuid::new_v4());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&present), Some(&1));
    }

    #[test]
    fn sessions_are_isolated_from_each_other() {
        let store = store();
        let product = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.add(alice, product, 2);

        assert!(store.snapshot(bob).is_empty());
        assert_eq!(store.snapshot(alice).get(&product), Some(&2));
    }

    #[test]
    fn clear_empties_the_session() {
        let store = store();
        let session = Uuid::new_v4();

        store.add(session, Uuid::new_v4(), 2);
        store.clear(session);

        assert!(store.snapshot(session).is_empty());
    }

    #[test]
    fn expired_sessions_read_as_empty_and_get_swept() {
        let store = CartSessionStore::new(0);
        let session = Uuid::new_v4();

        store.add(session, Uuid::new_v4(), 2);

        assert!(store.snapshot(session).is_empty());
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn add_saturates_instead_of_overflowing() {
        let store = store();
        let session = Uuid::new_v4();
        let product = Uuid::new_v4();

        store.add(session, product, u32::MAX);
        let cart = store.add(session, product, 10);

        assert_eq!(cart.get(&product), Some(&u32::MAX));
    }
}
