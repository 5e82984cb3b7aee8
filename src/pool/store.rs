//! Durable registry of candidate images, their signatures and usage counters

use crate::color::lab::{Lab, Rgb};
use crate::color::signature::SalientColor;
use crate::io::error::{MosaicError, Result, StorageContext};
use crate::pool::schema;
use log::debug;
use rusqlite::{Connection, ErrorCode, OpenFlags, Row, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One registered pool image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    /// Pool-assigned identity
    pub id: i64,
    /// Times this image has been placed in the current run
    pub usage_count: u32,
    /// Width in pixels of the source file
    pub width: u32,
    /// Height in pixels of the source file
    pub height: u32,
    /// Path of the source file, unique across the pool
    pub filename: String,
}

/// One salient color belonging to a pool image
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureEntry {
    /// Row identity
    pub id: i64,
    /// Owning image
    pub image_id: i64,
    /// Abundance rank within the owning image, starting at 1
    pub rank: u32,
    /// Lab color
    pub lab: Lab,
    /// RGB color
    pub rgb: Rgb,
}

/// Raw scoring input: a signature entry joined with its image's usage state
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Owning image
    pub image_id: i64,
    /// Abundance rank of this color within the image
    pub rank: u32,
    /// Lab color of the entry
    pub lab: Lab,
    /// Usage count of the owning image when queried
    pub usage_count: u32,
    /// Source file of the owning image
    pub filename: String,
}

/// Handle to a SQLite-backed image pool
///
/// The connection sits behind a mutex so a single handle can be shared by
/// parallel matchers; every usage update is a single SQL statement.
pub struct ImagePool {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ImagePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePool")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ImagePool {
    /// Open or create a pool store at `path`
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::StorageUnavailable`] if the file cannot be
    /// opened or the schema cannot be created
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| MosaicError::StorageUnavailable {
            path: path.clone(),
            source,
        })?;
        Self::configure(conn, path)
    }

    /// Open a pool store that must already exist at `path`
    ///
    /// Unlike [`ImagePool::open`], a missing file is an error and nothing is
    /// created on disk.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::StorageUnavailable`] if no file exists at
    /// `path`, it cannot be opened for writing, or it is not a pool store
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| MosaicError::StorageUnavailable {
            path: path.clone(),
            source,
        })?;
        Self::configure(conn, path)
    }

    fn configure(conn: Connection, path: PathBuf) -> Result<Self> {
        let unavailable = |source| MosaicError::StorageUnavailable {
            path: path.clone(),
            source,
        };
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(unavailable)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(unavailable)?;
        schema::initialize(&conn).map_err(unavailable)?;

        debug!("Opened image pool at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Open a throwaway in-memory pool
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::StorageUnavailable`] if SQLite cannot allocate
    /// the database
    pub fn open_in_memory() -> Result<Self> {
        let unavailable = |source| MosaicError::StorageUnavailable {
            path: PathBuf::from(":memory:"),
            source,
        };
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(unavailable)?;
        schema::initialize(&conn).map_err(unavailable)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Location of the store on disk, `None` for in-memory pools
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // A panic while holding the lock cannot leave SQLite half-written, so a
    // poisoned mutex is still safe to use
    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an image and its signature as one atomic unit
    ///
    /// Returns the new image identity.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::DuplicateImage`] if `filename` is already
    /// registered, leaving the pool unchanged, or [`MosaicError::Storage`]
    /// on any other SQLite failure
    pub fn register(
        &self,
        filename: &str,
        width: u32,
        height: u32,
        signature: &[SalientColor],
    ) -> Result<i64> {
        let mut conn = self.connection();
        let tx = conn.transaction().during("begin registration")?;

        match tx.execute(
            "INSERT INTO Images (usages, w, h, filename) VALUES (0, ?1, ?2, ?3)",
            params![width, height, filename],
        ) {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(MosaicError::DuplicateImage {
                    filename: filename.to_string(),
                });
            }
            Err(source) => {
                return Err(MosaicError::Storage {
                    operation: "insert image",
                    source,
                });
            }
        }
        let image_id = tx.last_insert_rowid();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO Colors (image_id, rank, L, a, b, red, green, blue)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .during("prepare color insert")?;
            for color in signature {
                stmt.execute(params![
                    image_id,
                    color.rank,
                    color.lab.l,
                    color.lab.a,
                    color.lab.b,
                    color.rgb.red,
                    color.rgb.green,
                    color.rgb.blue,
                ])
                .during("insert color")?;
            }
        }

        tx.commit().during("commit registration")?;
        Ok(image_id)
    }

    /// Set every image's usage count back to zero
    ///
    /// Returns the number of images touched.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the update fails
    pub fn reset_usage(&self) -> Result<usize> {
        self.connection()
            .execute("UPDATE Images SET usages = 0", [])
            .during("reset usage")
    }

    /// Unconditionally add one to an image's usage count
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::InvalidParameter`] for an unknown image, or
    /// [`MosaicError::Storage`] if the update fails
    pub fn increment_usage(&self, image_id: i64) -> Result<()> {
        let updated = self
            .connection()
            .execute(
                "UPDATE Images SET usages = usages + 1 WHERE image_id = ?1",
                params![image_id],
            )
            .during("increment usage")?;
        if updated == 0 {
            return Err(crate::io::error::invalid_parameter(
                "image_id",
                &image_id,
                &"no such image in the pool",
            ));
        }
        Ok(())
    }

    /// Add one to an image's usage count only if it is still below
    /// `max_usages`
    ///
    /// The check and the increment are one statement, so two concurrent
    /// claimants can never both take the last available use. Returns whether
    /// the claim succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the update fails
    pub fn claim(&self, image_id: i64, max_usages: u32) -> Result<bool> {
        let updated = self
            .connection()
            .execute(
                "UPDATE Images SET usages = usages + 1 WHERE image_id = ?1 AND usages < ?2",
                params![image_id, max_usages],
            )
            .during("claim image")?;
        Ok(updated == 1)
    }

    /// Every signature entry whose image has `usage_count <= max_usages`
    ///
    /// Rows come back ordered by image identity then rank.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the query fails
    pub fn candidates(&self, max_usages: u32) -> Result<Vec<Candidate>> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT image_id, rank, L, a, b, usages, filename
                 FROM Colors
                 JOIN Images USING (image_id)
                 WHERE usages <= ?1
                 ORDER BY image_id, rank",
            )
            .during("prepare candidate query")?;

        let rows = stmt
            .query_map(params![max_usages], candidate_from_row)
            .during("query candidates")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .during("read candidates")
    }

    /// The `limit` signature entries nearest to `target` in the ab plane
    /// among images with `usage_count <= max_usages`
    ///
    /// Sorting and truncation happen inside SQLite, so only `limit` rows
    /// leave the store. Rows come back nearest first, ties broken by image
    /// identity then rank.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the query fails
    pub fn candidates_near(
        &self,
        target: Lab,
        max_usages: u32,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT image_id, rank, L, a, b, usages, filename
                 FROM Colors
                 JOIN Images USING (image_id)
                 WHERE usages <= ?1
                 ORDER BY (a - ?2) * (a - ?2) + (b - ?3) * (b - ?3), image_id, rank
                 LIMIT ?4",
            )
            .during("prepare nearest candidate query")?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(
                params![max_usages, target.a, target.b, limit],
                candidate_from_row,
            )
            .during("query nearest candidates")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .during("read nearest candidates")
    }

    /// All registered images ordered by identity
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the query fails
    pub fn images(&self) -> Result<Vec<ImageRecord>> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare("SELECT image_id, usages, w, h, filename FROM Images ORDER BY image_id")
            .during("prepare image listing")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ImageRecord {
                    id: row.get(0)?,
                    usage_count: row.get(1)?,
                    width: row.get(2)?,
                    height: row.get(3)?,
                    filename: row.get(4)?,
                })
            })
            .during("list images")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .during("read images")
    }

    /// All signature entries ordered by image then rank
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the query fails
    pub fn signatures(&self) -> Result<Vec<SignatureEntry>> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare(
                "SELECT color_id, image_id, rank, L, a, b, red, green, blue
                 FROM Colors ORDER BY image_id, rank",
            )
            .during("prepare signature listing")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SignatureEntry {
                    id: row.get(0)?,
                    image_id: row.get(1)?,
                    rank: row.get(2)?,
                    lab: Lab::new(row.get(3)?, row.get(4)?, row.get(5)?),
                    rgb: Rgb::new(row.get(6)?, row.get(7)?, row.get(8)?),
                })
            })
            .during("list signatures")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .during("read signatures")
    }

    /// Usage count of one image
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the image does not exist or the
    /// query fails
    pub fn usage_count(&self, image_id: i64) -> Result<u32> {
        self.connection()
            .query_row(
                "SELECT usages FROM Images WHERE image_id = ?1",
                params![image_id],
                |row| row.get(0),
            )
            .during("read usage count")
    }

    /// Number of registered images
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the query fails
    pub fn image_count(&self) -> Result<usize> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM Images", [], |row| row.get(0))
            .during("count images")
    }

    /// Whether a file is already registered
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Storage`] if the query fails
    pub fn contains(&self, filename: &str) -> Result<bool> {
        self.connection()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM Images WHERE filename = ?1)",
                params![filename],
                |row| row.get(0),
            )
            .during("look up filename")
    }
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    Ok(Candidate {
        image_id: row.get(0)?,
        rank: row.get(1)?,
        lab: Lab::new(row.get(2)?, row.get(3)?, row.get(4)?),
        usage_count: row.get(5)?,
        filename: row.get(6)?,
    })
}
