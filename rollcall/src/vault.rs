mod migrate;
mod prepare;
mod session;

use std::fs;
use std::path::Path;

use rusqlite::Connection;
use vault::tokio::TokioVault;
use vault::Action;

pub use self::session::SessionVault;

#[derive(Debug, Clone)]
pub struct Vault {
    tokio_vault: TokioVault,
    ephemeral: bool,
}

struct GcAction;

impl Action for GcAction {
    type Output = ();
    type Error = rusqlite::Error;

    fn run(self, conn: &mut Connection) -> Result<Self::Output, Self::Error> {
        conn.execute_batch("ANALYZE; VACUUM;")
    }
}

impl Vault {
    pub fn ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub async fn close(&self) {
        self.tokio_vault.stop().await;
    }

    pub async fn gc(&self) -> Result<(), vault::tokio::Error<rusqlite::Error>> {
        self.tokio_vault.execute(GcAction).await
    }

    pub fn session(&self) -> SessionVault {
        SessionVault::new(self.clone())
    }
}

fn launch_from_connection(conn: Connection, ephemeral: bool) -> rusqlite::Result<Vault> {
    conn.pragma_update(None, "trusted_schema", false)?;

    let tokio_vault = TokioVault::launch_and_prepare(conn, &migrate::MIGRATIONS, prepare::prepare)?;
    Ok(Vault {
        tokio_vault,
        ephemeral,
    })
}

pub fn launch(path: &Path) -> rusqlite::Result<Vault> {
    // If this fails, rusqlite will complain about not being able to open the db
    // file anyways.
    let _ = fs::create_dir_all(path.parent().expect("path to file"));

    let conn = Connection::open(path)?;

    // Exclusive locking before switching to WAL so sqlite doesn't need any
    // shared memory files. Two clients sharing one data dir would otherwise
    // overwrite each other's session.
    // https://sqlite.org/pragma.html#pragma_locking_mode
    conn.pragma_update(None, "locking_mode", "exclusive")?;
    conn.pragma_update(None, "journal_mode", "wal")?;

    launch_from_connection(conn, false)
}

pub fn launch_in_memory() -> rusqlite::Result<Vault> {
    let conn = Connection::open_in_memory()?;
    launch_from_connection(conn, true)
}
