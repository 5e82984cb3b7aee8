pub mod assembler;
pub mod tiles;
