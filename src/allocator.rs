//! Process-wide allocator.
//!
//! Every buffer the binary handles (whole-file plaintext, container bytes)
//! goes through mimalloc.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
