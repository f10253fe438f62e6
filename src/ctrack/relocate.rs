//! Reachability-driven relocation of native tracks

use crate::ctrack::error::{Error, Result};
use crate::memory::{write_u16, Window};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

/// Offset of the track's pointer table.
pub const POINTERS_OFFSET: usize = 1;

/// Number of pointers in the pointer table.
pub const POINTER_COUNT: usize = 5;

/// Number of channel entry points; the last pointer is the instrument table.
pub const CHANNEL_COUNT: usize = 4;

pub const INSTRUMENT_ENTRY_SIZE: usize = 4;

/// Channel pointer value marking an unused channel.
pub const NO_CHANNEL: u16 = 0xFFFF;

/// `04 count lo hi`: repeat from the target address `count` times, or jump
/// there forever if `count` is zero.
pub const OP_LOOP: u8 = 4;

/// End of channel data.
pub const OP_END: u8 = 9;

const OP_SIZES: [usize; 10] = [2, 2, 2, 2, 4, 2, 1, 3, 2, 1];

/// Size in bytes of an instruction, including its opcode.
///
/// Opcodes without parameters are stored as-is, and so is note data, so any
/// opcode past the end of the table counts as a single byte.
pub fn opcode_size(opcode: u8) -> usize {
    OP_SIZES.get(usize::from(opcode)).copied().unwrap_or(1)
}

/// Determine if `addr` is within the track or at its very end.
fn reach(window: &Window<'_>, addr: u16) -> Option<usize> {
    window
        .decode_addr(addr)
        .filter(|offset| *offset <= window.len())
}

/// Move a native track assembled for `base` so that it runs at `new_base`.
///
/// Only pointers that can be proven to be pointers are touched: the pointer
/// table, and the target of every loop instruction reachable from a channel
/// entry point. Everything else in the track is copied as-is.
pub fn relocate_track(data: &[u8], base: u16, new_base: u16) -> Result<Vec<u8>> {
    let window = Window::new(data, base);
    let ptrs = window
        .read_u16_array(POINTERS_OFFSET, POINTER_COUNT)
        .ok_or(Error::TruncatedHeader { len: data.len() })?;

    let instr_table = ptrs[CHANNEL_COUNT];
    let table_offset =
        reach(&window, instr_table).ok_or(Error::InvalidInstrumentTable { addr: instr_table })?;

    if table_offset == data.len() {
        warn!(
            "Track at ${:04X} has its instrument table at the end of its data",
            base
        );
    }

    if (data.len() - table_offset) % INSTRUMENT_ENTRY_SIZE != 0 {
        return Err(Error::InvalidInstrumentTable { addr: instr_table });
    }

    let delta = new_base.wrapping_sub(base);
    let mut out = data.to_vec();
    let mut visited = HashSet::new();

    for (idx, addr) in ptrs.iter().enumerate() {
        if *addr == 0 || *addr == NO_CHANNEL {
            continue;
        }

        let slot_offset = POINTERS_OFFSET + idx * 2;

        if reach(&window, *addr).is_none() {
            return Err(Error::InvalidAddress {
                channel: idx,
                addr: base.wrapping_add(slot_offset as u16),
            });
        }

        write_u16(&mut out, slot_offset, addr.wrapping_add(delta));

        if idx < CHANNEL_COUNT {
            relocate_channel(&window, &mut out, idx, *addr, delta, &mut visited)?;
        }
    }

    debug!(
        "Relocated track from ${:04X} to ${:04X} ({} instructions reached)",
        base,
        new_base,
        visited.len()
    );

    Ok(out)
}

/// Walk every instruction reachable from `entry`, relocating loop targets.
///
/// Instructions are decoded from the original track in `window` and patched
/// into `out`. `visited` holds the addresses of every instruction decoded so
/// far, so no instruction is patched twice even when it is shared between
/// channels.
fn relocate_channel(
    window: &Window<'_>,
    out: &mut [u8],
    channel: usize,
    entry: u16,
    delta: u16,
    visited: &mut HashSet<u16>,
) -> Result<()> {
    let mut queue = VecDeque::new();
    queue.push_back(entry);

    while let Some(start) = queue.pop_front() {
        let mut addr = start;

        while visited.insert(addr) {
            let invalid = Error::InvalidAddress { channel, addr };
            let offset = window.decode_addr(addr).ok_or_else(|| invalid.clone())?;
            let opcode = window.read_u8(offset).ok_or_else(|| invalid.clone())?;

            match opcode {
                OP_LOOP => {
                    let count = window.read_u8(offset + 1).ok_or_else(|| invalid.clone())?;
                    let target = window.read_u16(offset + 2).ok_or_else(|| invalid.clone())?;

                    if reach(window, target).is_none() {
                        return Err(invalid);
                    }

                    queue.push_back(target);
                    write_u16(out, offset + 2, target.wrapping_add(delta));

                    if count == 0 {
                        break;
                    }
                }
                OP_END => break,
                _ => {}
            }

            addr = addr
                .checked_add(opcode_size(opcode) as u16)
                .ok_or(invalid)?;
        }
    }

    Ok(())
}
