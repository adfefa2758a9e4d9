//! LZ4 Frame format — streaming compression and decompression.
//!
//! Corresponds to lz4frame.c / lz4frame.h / lz4frame_static.h from LZ4 v1.10.0.

pub mod cdict;
pub mod compress;
pub mod decompress;
pub mod header;
pub mod types;

// Re-export key public API items at the module level.
pub use cdict::Lz4FCDict;
pub use compress::{
    lz4f_compress_begin, lz4f_compress_bound, lz4f_compress_end, lz4f_compress_frame,
    lz4f_compress_frame_using_cdict, lz4f_compress_update, lz4f_create_compression_context,
    lz4f_flush, lz4f_free_compression_context, lz4f_uncompressed_update, CompressOptions,
};
pub use header::lz4f_compress_frame_bound;
pub use decompress::{
    lz4f_create_decompression_context, lz4f_decompress, lz4f_decompress_using_dict,
    lz4f_free_decompression_context, lz4f_get_frame_info, lz4f_header_size,
    lz4f_reset_decompression_context, DecompressOptions, Lz4FDCtx,
};
pub use types::{
    BlockChecksum, BlockMode, BlockSizeId, ContentChecksum, FrameInfo, FrameType, Lz4FCCtx,
    Lz4FError, Preferences,
};

// ─────────────────────────────────────────────────────────────────────────────
// Vec-returning convenience wrappers
// ─────────────────────────────────────────────────────────────────────────────

/// Compress `src` into a freshly-allocated `Vec` holding a complete LZ4 frame.
///
/// Sized with [`lz4f_compress_frame_bound`]. Returns an empty `Vec` only if the
/// underlying one-shot compression fails (e.g. `src` exceeds the representable
/// frame content size); a frame header alone makes the non-empty case the norm,
/// even for empty `src`.
pub fn compress_frame_to_vec(src: &[u8]) -> Vec<u8> {
    let bound = lz4f_compress_frame_bound(src.len(), None);
    let mut dst = vec![0u8; bound];
    match lz4f_compress_frame(&mut dst, src, None) {
        Ok(written) => {
            dst.truncate(written);
            dst
        }
        Err(_) => Vec::new(),
    }
}

/// Decompress a complete LZ4 frame held in `src` into a freshly-allocated `Vec`.
///
/// Drives [`lz4f_decompress`] to completion over a growing output buffer,
/// bailing out with the first fatal [`Lz4FError`] encountered. Stops early
/// (returning whatever was decoded so far) if the state machine reports no
/// progress is possible with the remaining input — this happens on a
/// truncated frame that ends mid-header or mid-block.
pub fn decompress_frame_to_vec(src: &[u8]) -> Result<Vec<u8>, Lz4FError> {
    let mut dctx = lz4f_create_decompression_context(types::LZ4F_VERSION)?;
    let mut out = Vec::new();
    let mut pos = 0usize;
    let mut chunk = 64 * 1024;

    while pos < src.len() {
        let mut buf = vec![0u8; chunk];
        let (consumed, produced, hint) =
            lz4f_decompress(&mut dctx, Some(&mut buf), &src[pos..], None)?;
        out.extend_from_slice(&buf[..produced]);
        pos += consumed;
        if hint == 0 {
            break;
        }
        if consumed == 0 && produced == 0 {
            // No progress possible with the bytes remaining: truncated input.
            break;
        }
        chunk = hint.max(64);
    }

    lz4f_free_decompression_context(dctx);
    Ok(out)
}
