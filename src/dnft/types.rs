//! Fixed-layout records of a Dn-FamiTracker BIN export.
//!
//! All records are little-endian and tightly packed. Each one knows how to
//! decode itself from a byte slice and, where the record holds addresses that
//! need relocating, how to store itself back.

use crate::memory::{write_u16, Window};
use std::fmt;

/// The module header found at the start of every export.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub song_list: u16,
    pub instrument_list: u16,
    pub sample_list: u16,
    pub samples: u16,
    pub groove_list: u16,
    pub flags: u8,

    /// Engine speed in frames per minute.
    pub ntsc_speed: u16,
    pub pal_speed: u16,
}

impl Header {
    pub const SIZE: usize = 15;

    /// Names of the five section pointers, in the order they are stored.
    pub const SECTIONS: [&'static str; 5] = [
        "song_list",
        "instrument_list",
        "sample_list",
        "samples",
        "groove_list",
    ];

    pub const FLAGS_OFFSET: usize = 10;

    pub fn read(window: &Window<'_>) -> Option<Self> {
        let b = window.retrieve(0, Self::SIZE)?;
        let word = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);

        Some(Header {
            song_list: word(0),
            instrument_list: word(2),
            sample_list: word(4),
            samples: word(6),
            groove_list: word(8),
            flags: b[10],
            ntsc_speed: word(11),
            pal_speed: word(13),
        })
    }

    pub fn write(&self, data: &mut [u8]) {
        let addrs = self.section_addrs();

        for (i, addr) in addrs.iter().enumerate() {
            write_u16(data, i * 2, *addr);
        }

        data[Self::FLAGS_OFFSET] = self.flags;
        write_u16(data, 11, self.ntsc_speed);
        write_u16(data, 13, self.pal_speed);
    }

    /// The five section pointers, in storage order.
    pub fn section_addrs(&self) -> [u16; 5] {
        [
            self.song_list,
            self.instrument_list,
            self.sample_list,
            self.samples,
            self.groove_list,
        ]
    }

    /// Byte offset of the `index`th section pointer.
    pub fn section_offset(index: usize) -> usize {
        index * 2
    }

    pub fn relocate(&mut self, delta: u16) {
        self.song_list = self.song_list.wrapping_add(delta);
        self.instrument_list = self.instrument_list.wrapping_add(delta);
        self.sample_list = self.sample_list.wrapping_add(delta);
        self.samples = self.samples.wrapping_add(delta);
        self.groove_list = self.groove_list.wrapping_add(delta);
    }

    pub fn flags(&self) -> HeaderFlags {
        HeaderFlags(self.flags)
    }
}

/// The flags byte of a module header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeaderFlags(pub u8);

impl HeaderFlags {
    pub const BANK_SWITCHED: u8 = 1 << 0;
    pub const OLD_VIBRATO: u8 = 1 << 1;
    pub const LINEAR_PITCH: u8 = 1 << 2;

    /// Every flag bit this crate knows the meaning of.
    pub const KNOWN: u8 = Self::BANK_SWITCHED | Self::OLD_VIBRATO | Self::LINEAR_PITCH;

    pub fn is_bank_switched(self) -> bool {
        self.0 & Self::BANK_SWITCHED != 0
    }

    pub fn is_old_vibrato(self) -> bool {
        self.0 & Self::OLD_VIBRATO != 0
    }

    pub fn is_linear_pitch(self) -> bool {
        self.0 & Self::LINEAR_PITCH != 0
    }

    /// Any set bits that are not one of the known flags.
    pub fn unknown_bits(self) -> u8 {
        self.0 & !Self::KNOWN
    }
}

impl fmt::Display for HeaderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();

        if self.is_bank_switched() {
            names.push("bank-switched");
        }

        if self.is_old_vibrato() {
            names.push("old vibrato");
        }

        if self.is_linear_pitch() {
            names.push("linear pitch");
        }

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SongInfo {
    /// Address of the frame pointer table.
    pub frames: u16,
    pub frame_count: u8,
    pub pattern_length: u8,
    pub speed: u8,
    pub tempo: u8,
    pub groove_pos: u8,
    pub bank: u8,
}

impl SongInfo {
    pub const SIZE: usize = 8;

    pub fn read(window: &Window<'_>, offset: usize) -> Option<Self> {
        let b = window.retrieve(offset, Self::SIZE)?;

        Some(SongInfo {
            frames: u16::from_le_bytes([b[0], b[1]]),
            frame_count: b[2],
            pattern_length: b[3],
            speed: b[4],
            tempo: b[5],
            groove_pos: b[6],
            bank: b[7],
        })
    }
}

/// An entry of the DPCM instrument (key map) list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DpcmInstrument {
    pub pitch: u8,
    pub unk1: u8,
    pub sample_idx: u8,
}

impl DpcmInstrument {
    pub const SIZE: usize = 3;

    pub fn read(window: &Window<'_>, offset: usize) -> Option<Self> {
        let b = window.retrieve(offset, Self::SIZE)?;

        Some(DpcmInstrument {
            pitch: b[0],
            unk1: b[1],
            sample_idx: b[2],
        })
    }
}

/// A DPCM sample descriptor.
///
/// Samples are not addressed with pointers. `address` counts 64-byte units
/// up from `$C000` and `size` counts 16-byte units, plus one byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub address: u8,
    pub size: u8,
    pub bank: u8,
}

impl Sample {
    pub const SIZE: usize = 3;

    pub const SIZE_OFFSET: usize = 1;

    /// Base of the region sample addresses are counted from.
    pub const REGION_BASE: u32 = 0xC000;

    /// Granularity of sample addresses.
    pub const ADDRESS_UNIT: u32 = 0x40;

    /// Granularity of sample sizes.
    pub const SIZE_UNIT: u32 = 0x10;

    pub fn read(window: &Window<'_>, offset: usize) -> Option<Self> {
        let b = window.retrieve(offset, Self::SIZE)?;

        Some(Sample {
            address: b[0],
            size: b[1],
            bank: b[2],
        })
    }

    /// The absolute address the sample starts at.
    pub fn start_addr(&self) -> u32 {
        Self::REGION_BASE + u32::from(self.address) * Self::ADDRESS_UNIT
    }

    /// Length of the sample in bytes.
    pub fn byte_len(&self) -> u32 {
        u32::from(self.size) * Self::SIZE_UNIT + 1
    }

    /// The address one past the last byte of the sample.
    pub fn end_addr(&self) -> u32 {
        self.start_addr() + self.byte_len()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InstrumentHeader {
    pub kind: u8,

    /// One bit per envelope sequence the instrument uses.
    pub env_mask: u8,
}

impl InstrumentHeader {
    pub const SIZE: usize = 2;

    pub fn read(window: &Window<'_>, offset: usize) -> Option<Self> {
        let b = window.retrieve(offset, Self::SIZE)?;

        Some(InstrumentHeader {
            kind: b[0],
            env_mask: b[1],
        })
    }

    /// How many sequence pointers follow the header.
    pub fn sequence_count(&self) -> usize {
        self.env_mask.count_ones() as usize
    }

    pub fn instrument_type(&self) -> Option<InstrumentType> {
        InstrumentType::from_u8(self.kind)
    }
}

/// Sound chip an instrument is written for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstrumentType {
    Apu,
    Triangle,
    Noise,
    Dpcm,
    Vrc6,
    Sawtooth,
    Vrc7,
    Fds,
    Mmc5,
    N163,
    S5b,
}

impl InstrumentType {
    pub fn from_u8(kind: u8) -> Option<Self> {
        use InstrumentType::*;

        match kind {
            0 => Some(Apu),
            1 => Some(Triangle),
            2 => Some(Noise),
            3 => Some(Dpcm),
            4 => Some(Vrc6),
            5 => Some(Sawtooth),
            6 => Some(Vrc7),
            7 => Some(Fds),
            8 => Some(Mmc5),
            9 => Some(N163),
            10 => Some(S5b),
            _ => None,
        }
    }

    /// Yield a name for this instrument type.
    pub fn friendly_name(self) -> &'static str {
        use InstrumentType::*;

        match self {
            Apu => "2A03",
            Triangle => "2A03 triangle",
            Noise => "2A03 noise",
            Dpcm => "2A03 DPCM",
            Vrc6 => "VRC6",
            Sawtooth => "VRC6 sawtooth",
            Vrc7 => "VRC7",
            Fds => "FDS",
            Mmc5 => "MMC5",
            N163 => "N163",
            S5b => "5B",
        }
    }
}
