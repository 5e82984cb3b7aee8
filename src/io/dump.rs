//! Read-only listing of every pool row, for debugging

use crate::io::error::Result;
use crate::pool::store::ImagePool;
use std::io::Write;

/// Write all `Images` rows followed by all `Colors` rows to `out`
///
/// # Errors
///
/// Returns an error if the pool cannot be queried or `out` rejects a write
pub fn dump_pool<W: Write>(pool: &ImagePool, out: &mut W) -> Result<()> {
    let images = pool.images()?;
    writeln!(out, "Images ({})", images.len())?;
    writeln!(out, "{:>6} {:>6} {:>6} {:>6}  filename", "id", "usages", "w", "h")?;
    for image in &images {
        writeln!(
            out,
            "{:>6} {:>6} {:>6} {:>6}  {}",
            image.id, image.usage_count, image.width, image.height, image.filename
        )?;
    }

    let signatures = pool.signatures()?;
    writeln!(out)?;
    writeln!(out, "Colors ({})", signatures.len())?;
    writeln!(
        out,
        "{:>6} {:>6} {:>4} {:>8} {:>8} {:>8}  rgb",
        "id", "image", "rank", "L", "a", "b"
    )?;
    for entry in &signatures {
        writeln!(
            out,
            "{:>6} {:>6} {:>4} {:>8.3} {:>8.3} {:>8.3}  {} {}",
            entry.id,
            entry.image_id,
            entry.rank,
            entry.lab.l,
            entry.lab.a,
            entry.lab.b,
            entry.rgb.to_hex(),
            format_args!("({}, {}, {})", entry.rgb.red, entry.rgb.green, entry.rgb.blue)
        )?;
    }
    Ok(())
}
