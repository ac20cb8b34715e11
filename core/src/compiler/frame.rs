//! Stack-frame layout planning.
//!
//! A call frame, from the bottom up: the return slot, each parameter
//! (word-aligned), the saved return pc and the saved caller bp. `bp` points
//! just above the saved bp, so everything the caller set up sits at
//! negative bp-relative offsets and locals grow upward from offset 0.
//!
//! ```text
//!  [ return slot ]        bp - below_bp
//!  [ parameter 0 ]
//!  [ parameter k-1 ]
//!  [ saved return pc ]    bp - 16
//!  [ saved caller bp ]    bp - 8
//!  [ locals ... ]         bp + 0, upward
//! ```

use crate::types::{word_align, FuncType};
use crate::vm::WORD_SIZE;

use super::error::CompileError;

#[derive(Debug)]
pub struct FrameLayout<'a> {
    /// bp-relative byte offset of the return slot.
    pub return_slot: i16,
    /// bp-relative byte offset of each parameter, in declaration order.
    pub params: Vec<(&'a str, i16)>,
    /// Total bytes below bp: return slot, parameters, saved pc, saved bp.
    pub below_bp: i64,
}

/// Plan the deterministic bp-relative placement for one function.
pub fn plan<'a>(line: i64, func: &FuncType<'a>) -> Result<FrameLayout<'a>, CompileError> {
    let word = WORD_SIZE as i64;

    let params_space: i64 = func
        .params
        .iter()
        .map(|(_, ty)| word_align(ty.byte_size()))
        .sum();
    let return_space = word_align(func.ret.byte_size());
    // Saved return pc and saved bp account for the two extra words.
    let below_bp = 2 * word + params_space + return_space;

    let quarter = |offset: i64| -> Result<i16, CompileError> {
        offset
            .try_into()
            .map_err(|_| CompileError::OffsetOutOfRange { line, offset })
    };

    let return_slot = quarter(-below_bp)?;
    let mut cursor = -below_bp + return_space;
    let mut params = Vec::with_capacity(func.params.len());
    for (name, ty) in func.params {
        params.push((*name, quarter(cursor)?));
        cursor += word_align(ty.byte_size());
    }
    debug_assert_eq!(cursor, -2 * word, "parameters end at the saved pc");

    Ok(FrameLayout {
        return_slot,
        params,
        below_bp,
    })
}
