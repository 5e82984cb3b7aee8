//! Unit tests mirroring the `src/` tree, one file per source file

mod mosaic;
