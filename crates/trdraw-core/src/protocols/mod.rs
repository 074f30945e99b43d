//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: wire constants and field widths (source of truth)
//! - `reader`: field reads over a byte source and protocol conventions
//! - `parser`: domain-level decoding (no direct byte handling)
//! - `error`: explicit, actionable errors
//!
//! Parsers perform no I/O of their own; they pull bytes through a
//! `ByteSource` handed in by the caller.

pub mod trd;
