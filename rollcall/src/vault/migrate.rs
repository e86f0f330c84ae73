use rusqlite::Transaction;
use vault::Migration;

pub const MIGRATIONS: [Migration; 1] = [m1];

fn eprint_status(nr: usize, total: usize) {
    eprintln!("Migrating vault from {} to {} (out of {total})", nr, nr + 1);
}

fn m1(tx: &mut Transaction<'_>, nr: usize, total: usize) -> rusqlite::Result<()> {
    eprint_status(nr, total);
    tx.execute_batch(
        "
        -- Columns are nullable on purpose. Only complete rows are restored,
        -- anything else is treated as leftover and cleared on startup.
        CREATE TABLE session (
            key           TEXT NOT NULL PRIMARY KEY,
            role          TEXT,
            identity      TEXT,
            access_token  TEXT,
            refresh_token TEXT
        ) STRICT;

        CREATE TABLE cookies (
            domain  TEXT NOT NULL,
            name    TEXT NOT NULL,
            cookie  TEXT NOT NULL,
            expires INT,

            PRIMARY KEY (domain, name)
        ) STRICT;
        ",
    )
}
