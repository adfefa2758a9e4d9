//! LZ4 block compression and decompression.
//!
//! This module contains the core LZ4 block-format engine, ported from lz4.c v1.10.0.

pub mod compress;
pub mod decompress_api;
pub mod decompress_core;
pub mod stream;
pub mod types;

// Re-export the most important public API items at the module level.
pub use compress::{
    compress_bound, compress_default, compress_dest_size, compress_fast, Lz4Error,
    LZ4_ACCELERATION_DEFAULT, LZ4_ACCELERATION_MAX, LZ4_MAX_INPUT_SIZE,
};
pub use decompress_api::{decoder_ring_buffer_size, decompress_safe, decompress_safe_partial, decompress_safe_using_dict, Lz4StreamDecode};
pub use stream::Lz4Stream;
pub use types::{StreamStateInternal, LZ4_DISTANCE_MAX};

// ─────────────────────────────────────────────────────────────────────────────
// Vec-returning convenience wrappers
// ─────────────────────────────────────────────────────────────────────────────

/// Compress `src` into a freshly-allocated `Vec`, sized with [`compress_bound`].
///
/// Returns an empty `Vec` if `src` is too large to represent
/// (`src.len() > LZ4_MAX_INPUT_SIZE`) or if compression otherwise fails.
pub fn compress_block_to_vec(src: &[u8]) -> Vec<u8> {
    let bound = compress_bound(src.len() as i32);
    if bound <= 0 {
        return Vec::new();
    }
    let mut dst = vec![0u8; bound as usize];
    match compress_default(src, &mut dst) {
        Ok(written) => {
            dst.truncate(written);
            dst
        }
        Err(_) => Vec::new(),
    }
}

/// Decompress `src` into a freshly-allocated `Vec` of exactly `original_size` bytes.
///
/// Returns an empty `Vec` if decompression fails or does not produce exactly
/// `original_size` bytes.
pub fn decompress_block_to_vec(src: &[u8], original_size: usize) -> Vec<u8> {
    let mut dst = vec![0u8; original_size];
    match decompress_safe(src, &mut dst) {
        Ok(written) if written == original_size => dst,
        _ => Vec::new(),
    }
}
