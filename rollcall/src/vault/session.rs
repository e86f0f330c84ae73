use std::str::FromStr;

use async_trait::async_trait;
use cookie::{Cookie, CookieJar};
use rusqlite::{named_params, Connection, OptionalExtension};
use vault::Action;

use crate::session::{Credentials, SessionStore, StoreError, StoredSession};

/// The one row of the `session` table this client uses.
const SESSION_KEY: &str = "current";

#[derive(Debug, Clone)]
pub struct SessionVault {
    vault: super::Vault,
}

impl SessionVault {
    pub(crate) fn new(vault: super::Vault) -> Self {
        Self { vault }
    }
}

macro_rules! session_vault_actions {
    ( $(
        $struct:ident : $fn:ident ( $( $arg:ident : $arg_ty:ty ),* ) -> $res:ty ;
    )* ) => {
        $(
            struct $struct {
                $( $arg: $arg_ty, )*
            }
        )*

        impl SessionVault {
            $(
                pub async fn $fn(&self, $( $arg: $arg_ty, )* ) -> Result<$res, vault::tokio::Error<rusqlite::Error>> {
                    self.vault.tokio_vault.execute($struct { $( $arg, )* }).await
                }
            )*
        }
    };
}

session_vault_actions! {
    GetSession : stored_session() -> StoredSession;
    SetSession : set_stored_session(stored: StoredSession) -> ();
    ClearSession : clear_stored_session() -> ();
    GetCookies : cookies(domain: String) -> CookieJar;
    SetCookies : set_cookies(domain: String, cookies: CookieJar) -> ();
    ClearCookies : clear_cookies(domain: Option<String>) -> ();
}

impl Action for GetSession {
    type Output = StoredSession;
    type Error = rusqlite::Error;

    fn run(self, conn: &mut Connection) -> Result<Self::Output, Self::Error> {
        let stored = conn
            .query_row(
                "
                SELECT role, identity, access_token, refresh_token
                FROM session
                WHERE key = ?
                ",
                [SESSION_KEY],
                |row| {
                    Ok(StoredSession {
                        role: row.get(0)?,
                        identity: row.get(1)?,
                        access_token: row.get(2)?,
                        refresh_token: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(stored.unwrap_or_default())
    }
}

impl Action for SetSession {
    type Output = ();
    type Error = rusqlite::Error;

    fn run(self, conn: &mut Connection) -> Result<Self::Output, Self::Error> {
        // A single statement, so either all four columns change or none do.
        conn.execute(
            "
            INSERT INTO session (key, role, identity, access_token, refresh_token)
            VALUES (:key, :role, :identity, :access_token, :refresh_token)
            ON CONFLICT (key) DO UPDATE
            SET role = :role,
                identity = :identity,
                access_token = :access_token,
                refresh_token = :refresh_token
            ",
            named_params! {
                ":key": SESSION_KEY,
                ":role": self.stored.role,
                ":identity": self.stored.identity,
                ":access_token": self.stored.access_token,
                ":refresh_token": self.stored.refresh_token,
            },
        )?;
        Ok(())
    }
}

impl Action for ClearSession {
    type Output = ();
    type Error = rusqlite::Error;

    fn run(self, conn: &mut Connection) -> Result<Self::Output, Self::Error> {
        conn.execute("DELETE FROM session WHERE key = ?", [SESSION_KEY])?;
        Ok(())
    }
}

impl Action for GetCookies {
    type Output = CookieJar;
    type Error = rusqlite::Error;

    fn run(self, conn: &mut Connection) -> Result<Self::Output, Self::Error> {
        let cookies = conn
            .prepare(
                "
                SELECT cookie
                FROM cookies
                WHERE domain = ?
                ",
            )?
            .query_map([self.domain], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut cookie_jar = CookieJar::new();
        for cookie in cookies {
            // Only ever written by us, but a broken cookie is no reason to
            // refuse starting up.
            if let Ok(cookie) = Cookie::from_str(&cookie) {
                cookie_jar.add_original(cookie);
            }
        }
        Ok(cookie_jar)
    }
}

impl Action for SetCookies {
    type Output = ();
    type Error = rusqlite::Error;

    fn run(self, conn: &mut Connection) -> Result<Self::Output, Self::Error> {
        let tx = conn.transaction()?;

        // The jar always contains all cookies we know for this domain.
        tx.execute("DELETE FROM cookies WHERE domain = ?", [&self.domain])?;

        let mut insert_cookie = tx.prepare(
            "
            INSERT INTO cookies (domain, name, cookie, expires)
            VALUES (:domain, :name, :cookie, :expires)
            ",
        )?;
        for cookie in self.cookies.iter() {
            insert_cookie.execute(named_params! {
                ":domain": self.domain,
                ":name": cookie.name(),
                ":cookie": format!("{cookie}"),
                ":expires": cookie.expires_datetime().map(|t| t.unix_timestamp()),
            })?;
        }
        drop(insert_cookie);

        tx.commit()?;
        Ok(())
    }
}

impl Action for ClearCookies {
    type Output = ();
    type Error = rusqlite::Error;

    fn run(self, conn: &mut Connection) -> Result<Self::Output, Self::Error> {
        if let Some(domain) = self.domain {
            conn.execute("DELETE FROM cookies WHERE domain = ?", [domain])?;
        } else {
            conn.execute_batch("DELETE FROM cookies")?;
        }

        Ok(())
    }
}

#[async_trait]
impl SessionStore for SessionVault {
    async fn load(&self) -> Result<StoredSession, StoreError> {
        Ok(self.stored_session().await?)
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let stored = StoredSession::from_credentials(credentials)?;
        Ok(self.set_stored_session(stored).await?)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Ok(self.clear_stored_session().await?)
    }
}
