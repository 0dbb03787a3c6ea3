//! Global tile ID flag codec.
//!
//! Tiled stores orientation in the four high bits of a 32-bit GID. The low
//! 28 bits hold the pure tile index (`local index + firstgid`).

use crate::error::{Result, SbError};

pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
pub const ROTATED_HEXAGONAL_120: u32 = 0x1000_0000;

/// All four flag bits.
pub const FLAG_MASK: u32 =
    FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY | ROTATED_HEXAGONAL_120;

/// Reject values outside `(0, u32::MAX)`.
pub fn validate(value: u64) -> Result<u32> {
    if value == 0 || value >= u64::from(u32::MAX) {
        return Err(SbError::GidOutOfRange { value });
    }
    Ok(value as u32)
}

/// Strip all flag bits, leaving the tile index.
pub fn pure_gid(gid: u32) -> Result<u32> {
    Ok(validate(gid.into())? & !FLAG_MASK)
}

/// Keep only the flag bits.
pub fn flags_only(gid: u32) -> Result<u32> {
    Ok(validate(gid.into())? & FLAG_MASK)
}

pub fn is_flipped_horizontally(gid: u32) -> Result<bool> {
    Ok(validate(gid.into())? & FLIPPED_HORIZONTALLY != 0)
}

pub fn is_flipped_vertically(gid: u32) -> Result<bool> {
    Ok(validate(gid.into())? & FLIPPED_VERTICALLY != 0)
}

pub fn is_flipped_diagonally(gid: u32) -> Result<bool> {
    Ok(validate(gid.into())? & FLIPPED_DIAGONALLY != 0)
}

/// Pack orientation flags onto a pure GID.
///
/// Flags are applied diagonal, then horizontal, then vertical.
pub fn apply_flags(pure: u32, flip_diagonal: bool, flip_horizontal: bool, flip_vertical: bool) -> Result<u32> {
    let mut gid = validate(pure.into())?;
    if flip_diagonal {
        gid |= FLIPPED_DIAGONALLY;
    }
    if flip_horizontal {
        gid |= FLIPPED_HORIZONTALLY;
    }
    if flip_vertical {
        gid |= FLIPPED_VERTICALLY;
    }
    Ok(gid)
}

/// Compute `local + firstgid` as a validated pure GID.
pub fn from_local(local: u32, firstgid: u32) -> Result<u32> {
    validate(u64::from(local) + u64::from(firstgid))
}
