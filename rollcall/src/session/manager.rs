use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Credentials, Identity, Restored, Role, Session, SessionStore, StoreError};

/// Held for the duration of one login flow. Dropping it allows the next one.
pub struct LoginTicket {
    _guard: OwnedMutexGuard<()>,
}

struct Inner {
    store: Arc<dyn SessionStore>,
    current: RwLock<Session>,
    /// Serializes writers across the persist-then-swap sequence so that
    /// memory and store never disagree for longer than one write.
    writer: Mutex<()>,
    login: Arc<Mutex<()>>,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("role", &self.role())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Restore the session from the store. Runs once at startup.
    ///
    /// Incomplete records are cleared from the store and result in a logged
    /// out session.
    pub async fn hydrate(store: Arc<dyn SessionStore>) -> Result<Self, StoreError> {
        let session = match store.load().await?.restore() {
            Restored::Empty => Session::LoggedOut,
            Restored::Partial => {
                warn!("discarding incomplete stored session");
                store.clear().await?;
                Session::LoggedOut
            }
            Restored::Complete(credentials) => {
                info!(
                    "restored {} session of {}",
                    credentials.role,
                    credentials.identity.display_name()
                );
                Session::LoggedIn(credentials)
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                store,
                current: RwLock::new(session),
                writer: Mutex::new(()),
                login: Arc::new(Mutex::new(())),
            }),
        })
    }

    /// A snapshot of the current session.
    pub fn get(&self) -> Session {
        self.inner.current.read().clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.inner.current.read().role()
    }

    /// Make sure no session of a role other than `role` is active.
    ///
    /// Logs out if another role is logged in, does nothing otherwise.
    pub async fn switch_role(&self, role: Role) -> Result<(), StoreError> {
        let _writer = self.inner.writer.lock().await;

        match self.role() {
            Some(current) if current != role => {
                debug!("switching from {current} to {role}, logging out first");
                self.clear_locked().await
            }
            _ => Ok(()),
        }
    }

    /// Replace the session with a new one.
    ///
    /// The store is written first. If that fails, the previous session stays
    /// in place, both in memory and in the store.
    pub async fn login(
        &self,
        identity: Identity,
        access_token: String,
        refresh_token: Option<String>,
        role: Role,
    ) -> Result<(), StoreError> {
        let credentials = Credentials {
            role,
            identity,
            access_token,
            refresh_token,
        };

        let _writer = self.inner.writer.lock().await;
        self.inner.store.save(&credentials).await?;

        info!(
            "logged in as {role} {}",
            credentials.identity.display_name()
        );
        *self.inner.current.write() = Session::LoggedIn(credentials);
        Ok(())
    }

    /// Clear the session. Logging out while logged out does nothing.
    pub async fn logout(&self) -> Result<(), StoreError> {
        let _writer = self.inner.writer.lock().await;

        let authenticated = self.inner.current.read().is_authenticated();
        if authenticated {
            self.clear_locked().await?;
        }
        Ok(())
    }

    /// Must only be called while holding the writer lock.
    async fn clear_locked(&self) -> Result<(), StoreError> {
        self.inner.store.clear().await?;
        *self.inner.current.write() = Session::LoggedOut;
        info!("logged out");
        Ok(())
    }

    /// Claim the right to run a login flow.
    ///
    /// Returns `None` while another flow still holds its ticket.
    pub fn begin_login(&self) -> Option<LoginTicket> {
        self.inner
            .login
            .clone()
            .try_lock_owned()
            .ok()
            .map(|guard| LoginTicket { _guard: guard })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::testing::MemoryStore;
    use crate::session::StoredSession;

    fn identity(name: &str) -> Identity {
        Identity(json!({ "name": name }))
    }

    async fn logged_in(store: &Arc<MemoryStore>, role: Role) -> SessionManager {
        let session = SessionManager::hydrate(store.clone()).await.unwrap();
        session
            .login(identity("someone"), "tok".to_string(), None, role)
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn starts_logged_out_with_empty_store() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::hydrate(store.clone()).await.unwrap();
        assert_eq!(session.get(), Session::LoggedOut);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn login_stores_exactly_what_was_given() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::hydrate(store.clone()).await.unwrap();

        session
            .login(
                identity("NGO Alpha"),
                "tok1".to_string(),
                Some("ref1".to_string()),
                Role::Ngo,
            )
            .await
            .unwrap();

        let expected = Credentials {
            role: Role::Ngo,
            identity: identity("NGO Alpha"),
            access_token: "tok1".to_string(),
            refresh_token: Some("ref1".to_string()),
        };
        assert_eq!(session.get(), Session::LoggedIn(expected.clone()));
        assert_eq!(
            store.contents(),
            StoredSession::from_credentials(&expected).unwrap()
        );
    }

    #[tokio::test]
    async fn empty_tokens_are_not_rejected() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::hydrate(store).await.unwrap();
        session
            .login(identity("x"), String::new(), None, Role::Admin)
            .await
            .unwrap();
        assert_eq!(session.get().access_token(), Some(""));
        assert!(session.get().is_authenticated());
    }

    #[tokio::test]
    async fn switching_to_the_same_role_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let session = logged_in(&store, Role::College).await;
        let before = session.get();
        let writes = store.writes();

        for _ in 0..3 {
            session.switch_role(Role::College).await.unwrap();
        }

        assert_eq!(session.get(), before);
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn switching_to_another_role_logs_out() {
        for (from, to) in [
            (Role::Ngo, Role::College),
            (Role::College, Role::Admin),
            (Role::Admin, Role::Ngo),
        ] {
            let store = Arc::new(MemoryStore::new());
            let session = logged_in(&store, from).await;

            session.switch_role(to).await.unwrap();

            assert_eq!(session.get(), Session::LoggedOut);
            assert!(store.contents().is_empty());
        }
    }

    #[tokio::test]
    async fn switching_while_logged_out_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::hydrate(store.clone()).await.unwrap();
        session.switch_role(Role::Admin).await.unwrap();
        assert_eq!(session.get(), Session::LoggedOut);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn logout_twice_is_logout_once() {
        let store = Arc::new(MemoryStore::new());
        let session = logged_in(&store, Role::Ngo).await;

        session.logout().await.unwrap();
        let after_one = (session.get(), store.contents(), store.writes());
        session.logout().await.unwrap();
        let after_two = (session.get(), store.contents(), store.writes());

        assert_eq!(after_one, after_two);
        assert_eq!(after_two.0, Session::LoggedOut);
    }

    #[tokio::test]
    async fn hydration_restores_complete_sessions() {
        let credentials = Credentials {
            role: Role::Admin,
            identity: Identity(json!({"email": "root@admin.org"})),
            access_token: "tok".to_string(),
            refresh_token: None,
        };
        let store = Arc::new(MemoryStore::with(
            StoredSession::from_credentials(&credentials).unwrap(),
        ));

        let session = SessionManager::hydrate(store).await.unwrap();
        assert_eq!(session.get(), Session::LoggedIn(credentials));
    }

    #[tokio::test]
    async fn hydration_discards_records_without_token() {
        let store = Arc::new(MemoryStore::with(StoredSession {
            role: Some("ngo".to_string()),
            identity: Some(r#"{"name":"NGO Alpha"}"#.to_string()),
            access_token: None,
            refresh_token: Some("ref".to_string()),
        }));

        let session = SessionManager::hydrate(store.clone()).await.unwrap();

        assert_eq!(session.get(), Session::LoggedOut);
        assert!(store.contents().is_empty());
    }

    #[tokio::test]
    async fn failed_login_write_keeps_previous_session() {
        let store = Arc::new(MemoryStore::new());
        let session = logged_in(&store, Role::Admin).await;
        let before = session.get();
        let stored_before = store.contents();

        store.fail(true);
        let result = session
            .login(identity("NGO Alpha"), "tok2".to_string(), None, Role::Ngo)
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable)));
        assert_eq!(session.get(), before);
        assert_eq!(store.contents(), stored_before);
    }

    #[tokio::test]
    async fn failed_logout_keeps_session() {
        let store = Arc::new(MemoryStore::new());
        let session = logged_in(&store, Role::College).await;
        let before = session.get();

        store.fail(true);
        assert!(session.logout().await.is_err());
        assert!(session.switch_role(Role::Admin).await.is_err());
        assert_eq!(session.get(), before);

        store.fail(false);
        session.logout().await.unwrap();
        assert_eq!(session.get(), Session::LoggedOut);
    }

    #[tokio::test]
    async fn only_one_login_flow_at_a_time() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::hydrate(store).await.unwrap();

        let ticket = session.begin_login().expect("first ticket");
        assert!(session.begin_login().is_none());
        assert!(session.clone().begin_login().is_none());

        drop(ticket);
        assert!(session.begin_login().is_some());
    }
}
