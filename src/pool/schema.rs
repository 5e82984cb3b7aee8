//! SQLite schema for the image pool

use rusqlite::Connection;

/// Create the `Images` and `Colors` tables and their indexes if missing
///
/// `Images.filename` is unique, which is what makes registration of an
/// already-known file a no-op.
///
/// # Errors
///
/// Returns the SQLite error if any statement fails
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS Images (
            image_id    INTEGER PRIMARY KEY,
            usages      INTEGER NOT NULL DEFAULT 0,
            w           INTEGER NOT NULL,
            h           INTEGER NOT NULL,
            filename    TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS Colors (
            color_id    INTEGER PRIMARY KEY,
            image_id    INTEGER NOT NULL REFERENCES Images(image_id) ON DELETE CASCADE,
            rank        INTEGER NOT NULL,
            L           REAL NOT NULL,
            a           REAL NOT NULL,
            b           REAL NOT NULL,
            red         INTEGER NOT NULL,
            green       INTEGER NOT NULL,
            blue        INTEGER NOT NULL,
            UNIQUE (image_id, rank)
        );

        CREATE INDEX IF NOT EXISTS idx_images_usages ON Images(usages);
        CREATE INDEX IF NOT EXISTS idx_colors_image_id ON Colors(image_id);",
    )
}
