use rusqlite::Connection;

pub fn prepare(conn: &mut Connection) -> rusqlite::Result<()> {
    // Cookies with an expiry date would be rejected by the server anyways.
    let removed = conn.execute(
        "
        DELETE FROM cookies
        WHERE expires IS NOT NULL
        AND expires < unixepoch()
        ",
        [],
    )?;

    if removed > 0 {
        eprintln!("Removed {removed} expired cookie(s) from vault");
    }

    Ok(())
}
