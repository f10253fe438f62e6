//! Parsed, relocatable view of a Dn-FamiTracker BIN export

use crate::dnft::error::{Error, Result};
use crate::dnft::types::{DpcmInstrument, Header, InstrumentHeader, Sample, SongInfo};
use crate::memory::{write_u16, Window};
use std::cmp::{max, min};
use tracing::debug;

/// The lowest address the DPCM region may be moved to.
pub const DPCM_BASE_MIN: u16 = 0xC000;

/// The highest address the DPCM region may be moved to.
pub const DPCM_BASE_MAX: u16 = 0xFFC0;

/// One past the last byte of the 6502 address space.
pub const ADDRESS_SPACE_END: u32 = 0x10000;

/// A song, and the location of every pointer it owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    /// Offset of the song's entry in the song table.
    entry_offset: usize,
    addr: u16,
    info_offset: usize,
    info: SongInfo,
    frame_table_offset: usize,
    frame_addrs: Vec<u16>,
    channel_count: usize,
    frames: Vec<Frame>,
}

impl Song {
    pub fn addr(&self) -> u16 {
        self.addr
    }

    pub fn info(&self) -> &SongInfo {
        &self.info
    }

    pub fn frame_addrs(&self) -> &[u16] {
        &self.frame_addrs
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of channels in every frame of this song.
    ///
    /// This is not stored in the module; it is inferred while parsing.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn relocate(&mut self, delta: u16, data: &mut [u8]) {
        self.addr = self.addr.wrapping_add(delta);
        write_u16(data, self.entry_offset, self.addr);

        self.info.frames = self.info.frames.wrapping_add(delta);
        write_u16(data, self.info_offset, self.info.frames);

        for (i, addr) in self.frame_addrs.iter_mut().enumerate() {
            *addr = addr.wrapping_add(delta);
            write_u16(data, self.frame_table_offset + i * 2, *addr);
        }

        for frame in self.frames.iter_mut() {
            frame.relocate(delta, data);
        }
    }
}

/// A single frame: one pattern address per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    offset: usize,
    channel_addrs: Vec<u16>,
}

impl Frame {
    pub fn channel_addrs(&self) -> &[u16] {
        &self.channel_addrs
    }

    fn relocate(&mut self, delta: u16, data: &mut [u8]) {
        for (i, addr) in self.channel_addrs.iter_mut().enumerate() {
            *addr = addr.wrapping_add(delta);
            write_u16(data, self.offset + i * 2, *addr);
        }
    }
}

/// An instrument and its envelope sequence pointers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instrument {
    entry_offset: usize,
    addr: u16,
    header: InstrumentHeader,
    seq_table_offset: usize,
    seq_addrs: Vec<u16>,
}

impl Instrument {
    pub fn addr(&self) -> u16 {
        self.addr
    }

    pub fn header(&self) -> &InstrumentHeader {
        &self.header
    }

    pub fn seq_addrs(&self) -> &[u16] {
        &self.seq_addrs
    }

    fn relocate(&mut self, delta: u16, data: &mut [u8]) {
        self.addr = self.addr.wrapping_add(delta);
        write_u16(data, self.entry_offset, self.addr);

        for (i, addr) in self.seq_addrs.iter_mut().enumerate() {
            *addr = addr.wrapping_add(delta);
            write_u16(data, self.seq_table_offset + i * 2, *addr);
        }
    }
}

/// A Dn-FamiTracker BIN export.
///
/// The module owns its bytes. Everything else is a view of those bytes that
/// was worked out while parsing: the header, every song, frame and instrument
/// along with the offsets of all the pointers they contain. Relocation edits
/// both the view and the bytes, so `binary` always reflects the current base
/// address.
#[derive(Clone, Debug)]
pub struct Module {
    data: Vec<u8>,
    base_addr: u16,
    header: Header,
    songs: Vec<Song>,
    instruments: Vec<Instrument>,
    dpcm_instruments: Vec<DpcmInstrument>,
    samples_offset: usize,
    samples: Vec<Sample>,
    dpcm_base_addr: u16,
    dpcm_size: u32,
}

impl Module {
    /// Parse a module that was exported to load at `base_addr`.
    ///
    /// Parsing never alters the data. Any structural problem is reported with
    /// the field, offset and value that caused it.
    pub fn parse(data: Vec<u8>, base_addr: u16) -> Result<Self> {
        let window = Window::new(&data, base_addr);
        let header = Header::read(&window).ok_or(Error::TruncatedHeader { len: data.len() })?;

        check_sections(&window, &header)?;
        check_flags(&header)?;
        check_grooves(&window, &header)?;

        let songs = load_songs(&window, &header)?;
        let instruments = load_instruments(&window, &header)?;
        let (dpcm_instruments, samples_offset, samples) = load_samples(&window, &header)?;
        let (dpcm_base_addr, dpcm_size) = dpcm_region(&samples, samples_offset)?;

        debug!(
            "Parsed module at ${:04X}: {} songs, {} instruments, {} samples",
            base_addr,
            songs.len(),
            instruments.len(),
            samples.len()
        );

        Ok(Module {
            data,
            base_addr,
            header,
            songs,
            instruments,
            dpcm_instruments,
            samples_offset,
            samples,
            dpcm_base_addr,
            dpcm_size,
        })
    }

    /// Move the module so that it runs when loaded at `new_base`, with its
    /// DPCM samples expected at `new_dpcm_base`.
    ///
    /// Relocation always starts from the current base, so it can be applied
    /// any number of times. All parameters are checked before anything is
    /// changed; on error the module is left untouched.
    pub fn rebase(&mut self, new_base: u16, new_dpcm_base: u16) -> Result<()> {
        if !(DPCM_BASE_MIN..=DPCM_BASE_MAX).contains(&new_dpcm_base) {
            return Err(Error::InvalidParameter(
                "new_dpcm_base must be between $C000 and $FFC0",
            ));
        }

        if u32::from(new_dpcm_base) % Sample::ADDRESS_UNIT != 0 {
            return Err(Error::InvalidParameter(
                "new_dpcm_base must be a multiple of 64",
            ));
        }

        if u32::from(new_base) + self.dpcm_size > ADDRESS_SPACE_END {
            return Err(Error::InvalidParameter(
                "new_base overflows address space",
            ));
        }

        if u32::from(new_dpcm_base) + self.dpcm_size > ADDRESS_SPACE_END {
            return Err(Error::InvalidParameter(
                "new_dpcm_base leaves samples outside of the address space",
            ));
        }

        let delta = new_base.wrapping_sub(self.base_addr);

        self.header.relocate(delta);
        self.header.write(&mut self.data);

        for song in self.songs.iter_mut() {
            song.relocate(delta, &mut self.data);
        }

        for instr in self.instruments.iter_mut() {
            instr.relocate(delta, &mut self.data);
        }

        let dpcm_delta = dpcm_units(new_dpcm_base).wrapping_sub(dpcm_units(self.dpcm_base_addr));

        for (i, sample) in self.samples.iter_mut().enumerate() {
            sample.address = sample.address.wrapping_add(dpcm_delta);
            self.data[self.samples_offset + i * Sample::SIZE] = sample.address;
        }

        debug!(
            "Rebased module from ${:04X} to ${:04X}, DPCM from ${:04X} to ${:04X}",
            self.base_addr, new_base, self.dpcm_base_addr, new_dpcm_base
        );

        self.base_addr = new_base;

        if !self.samples.is_empty() {
            self.dpcm_base_addr = new_dpcm_base;
        }

        Ok(())
    }

    /// The module's bytes, as relocated so far.
    pub fn binary(&self) -> &[u8] {
        &self.data
    }

    pub fn into_binary(self) -> Vec<u8> {
        self.data
    }

    pub fn base_addr(&self) -> u16 {
        self.base_addr
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// The DPCM instrument (key map) list.
    pub fn dpcm_instruments(&self) -> &[DpcmInstrument] {
        &self.dpcm_instruments
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Start of the smallest region covering every DPCM sample.
    ///
    /// Modules without samples report the bottom of the sample area.
    pub fn dpcm_base_addr(&self) -> u16 {
        self.dpcm_base_addr
    }

    /// Size of the smallest region covering every DPCM sample.
    pub fn dpcm_size(&self) -> u32 {
        self.dpcm_size
    }
}

/// Count of 64-byte sample units between `$C000` and `addr`.
fn dpcm_units(addr: u16) -> u8 {
    ((u32::from(addr).saturating_sub(Sample::REGION_BASE)) / Sample::ADDRESS_UNIT) as u8
}

/// Resolve a pointer to an offset, requiring `size` bytes to exist there.
///
/// `structure`, `field` and `field_offset` identify where the pointer itself
/// was read from, for error reporting.
fn locate(
    window: &Window<'_>,
    addr: u16,
    size: usize,
    structure: &'static str,
    field: &'static str,
    field_offset: usize,
) -> Result<usize> {
    window
        .decode_addr(addr)
        .filter(|_| window.check_addr(addr, size, false))
        .ok_or(Error::InvalidAddress {
            structure,
            field,
            offset: field_offset,
            value: addr,
        })
}

fn check_sections(window: &Window<'_>, header: &Header) -> Result<()> {
    let mut prev_addr = 0;

    for (i, (addr, field)) in header
        .section_addrs()
        .iter()
        .zip(Header::SECTIONS.iter())
        .enumerate()
    {
        let offset = Header::section_offset(i);

        locate(window, *addr, 1, "Header", *field, offset)?;

        if *addr < prev_addr {
            return Err(Error::SectionOrdering {
                field: *field,
                offset,
                value: *addr,
            });
        }

        prev_addr = *addr;
    }

    Ok(())
}

fn check_flags(header: &Header) -> Result<()> {
    let flags = header.flags();

    if flags.is_bank_switched() {
        return Err(Error::BankSwitched {
            offset: Header::FLAGS_OFFSET,
            value: header.flags,
        });
    }

    if flags.unknown_bits() != 0 {
        return Err(Error::UnsupportedFlag {
            offset: Header::FLAGS_OFFSET,
            value: header.flags,
        });
    }

    Ok(())
}

/// Grooves are not modeled at all, so the groove list must be empty.
fn check_grooves(window: &Window<'_>, header: &Header) -> Result<()> {
    let offset = locate(
        window,
        header.groove_list,
        1,
        "Header",
        "groove_list",
        Header::section_offset(4),
    )?;

    match window.read_u8(offset) {
        Some(0) => Ok(()),
        Some(value) => Err(Error::Grooves { offset, value }),
        None => Err(Error::InvalidAddress {
            structure: "Header",
            field: "groove_list",
            offset: Header::section_offset(4),
            value: header.groove_list,
        }),
    }
}

/// Determine how many entries a pointer table holds.
///
/// Tables of this kind are immediately followed by whatever their first entry
/// points to, so the distance between the table and its first target is the
/// table's size.
fn table_len(
    window: &Window<'_>,
    table_addr: u16,
    table_offset: usize,
    structure: &'static str,
    field: &'static str,
) -> Result<usize> {
    let first_addr = window.read_u16(table_offset).ok_or(Error::InvalidAddress {
        structure,
        field,
        offset: table_offset,
        value: table_addr,
    })?;

    first_addr
        .checked_sub(table_addr)
        .map(|distance| usize::from(distance) / 2)
        .ok_or(Error::InvalidAddress {
            structure,
            field,
            offset: table_offset,
            value: first_addr,
        })
}

fn load_songs(window: &Window<'_>, header: &Header) -> Result<Vec<Song>> {
    if header.song_list == header.instrument_list {
        return Ok(Vec::new());
    }

    let table_offset = locate(
        window,
        header.song_list,
        2,
        "Header",
        "song_list",
        Header::section_offset(0),
    )?;
    let num_songs = table_len(window, header.song_list, table_offset, "SongTable", "song_addrs")?;
    let song_addrs = window
        .read_u16_array(table_offset, num_songs)
        .ok_or(Error::InvalidAddress {
            structure: "Header",
            field: "song_list",
            offset: Header::section_offset(0),
            value: header.song_list,
        })?;

    song_addrs
        .iter()
        .enumerate()
        .map(|(i, addr)| load_song(window, table_offset + i * 2, *addr))
        .collect()
}

fn load_song(window: &Window<'_>, entry_offset: usize, addr: u16) -> Result<Song> {
    let info_offset = locate(window, addr, SongInfo::SIZE, "SongTable", "song_addrs", entry_offset)?;
    let info = SongInfo::read(window, info_offset).ok_or(Error::InvalidAddress {
        structure: "SongTable",
        field: "song_addrs",
        offset: entry_offset,
        value: addr,
    })?;

    let frame_count = usize::from(info.frame_count);
    let frame_table_offset = locate(
        window,
        info.frames,
        frame_count * 2,
        "SongInfo",
        "frames",
        info_offset,
    )?;
    let frame_addrs = window
        .read_u16_array(frame_table_offset, frame_count)
        .ok_or(Error::InvalidAddress {
            structure: "SongInfo",
            field: "frames",
            offset: info_offset,
            value: info.frames,
        })?;

    let channel_count = match frame_addrs.as_slice() {
        [] => 0,
        [only] => single_frame_channels(window, *only, frame_table_offset)?,
        [first, second, ..] => second
            .checked_sub(*first)
            .map(|distance| usize::from(distance) / 2)
            .ok_or(Error::InvalidAddress {
                structure: "FrameTable",
                field: "frame_addrs",
                offset: frame_table_offset + 2,
                value: *second,
            })?,
    };

    let frames = frame_addrs
        .iter()
        .enumerate()
        .map(|(i, frame_addr)| {
            let entry_offset = frame_table_offset + i * 2;
            let offset = locate(
                window,
                *frame_addr,
                channel_count * 2,
                "FrameTable",
                "frame_addrs",
                entry_offset,
            )?;
            let channel_addrs = window.read_u16_array(offset, channel_count).ok_or(
                Error::InvalidAddress {
                    structure: "FrameTable",
                    field: "frame_addrs",
                    offset: entry_offset,
                    value: *frame_addr,
                },
            )?;

            Ok(Frame {
                offset,
                channel_addrs,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Song {
        entry_offset,
        addr,
        info_offset,
        info,
        frame_table_offset,
        frame_addrs,
        channel_count,
        frames,
    })
}

/// Count the channels of a song with only one frame.
///
/// With no second frame to measure against, the channel array is assumed to
/// end where the earliest pattern it points to begins. Pointers are read
/// until the scan reaches the lowest pattern address seen so far; running off
/// the end of the module first is an error.
fn single_frame_channels(
    window: &Window<'_>,
    frame_addr: u16,
    entry_offset: usize,
) -> Result<usize> {
    let mut offset = locate(window, frame_addr, 2, "FrameTable", "frame_addrs", entry_offset)?;
    let mut frame_end = window.read_u16(offset).ok_or(Error::InvalidAddress {
        structure: "FrameTable",
        field: "frame_addrs",
        offset: entry_offset,
        value: frame_addr,
    })?;
    let mut scan_addr = u32::from(frame_addr) + 2;
    let mut num_chans = 1;

    offset += 2;

    while scan_addr < u32::from(frame_end) {
        let chan_addr = window.read_u16(offset).ok_or(Error::InvalidAddress {
            structure: "Frame",
            field: "channel_addrs",
            offset,
            value: scan_addr as u16,
        })?;

        frame_end = min(frame_end, chan_addr);
        num_chans += 1;
        offset += 2;
        scan_addr += 2;
    }

    Ok(num_chans)
}

fn load_instruments(window: &Window<'_>, header: &Header) -> Result<Vec<Instrument>> {
    if header.instrument_list == header.sample_list {
        return Ok(Vec::new());
    }

    let table_offset = locate(
        window,
        header.instrument_list,
        2,
        "Header",
        "instrument_list",
        Header::section_offset(1),
    )?;
    let num_instrs = table_len(
        window,
        header.instrument_list,
        table_offset,
        "InstrumentTable",
        "instrument_addrs",
    )?;
    let instr_addrs = window
        .read_u16_array(table_offset, num_instrs)
        .ok_or(Error::InvalidAddress {
            structure: "Header",
            field: "instrument_list",
            offset: Header::section_offset(1),
            value: header.instrument_list,
        })?;

    instr_addrs
        .iter()
        .enumerate()
        .map(|(i, addr)| load_instrument(window, table_offset + i * 2, *addr))
        .collect()
}

fn load_instrument(window: &Window<'_>, entry_offset: usize, addr: u16) -> Result<Instrument> {
    let offset = locate(
        window,
        addr,
        InstrumentHeader::SIZE,
        "InstrumentTable",
        "instrument_addrs",
        entry_offset,
    )?;
    let header = InstrumentHeader::read(window, offset).ok_or(Error::InvalidAddress {
        structure: "InstrumentTable",
        field: "instrument_addrs",
        offset: entry_offset,
        value: addr,
    })?;

    let seq_table_offset = offset + InstrumentHeader::SIZE;
    let seq_addrs = window
        .read_u16_array(seq_table_offset, header.sequence_count())
        .ok_or(Error::InvalidAddress {
            structure: "InstrumentHeader",
            field: "env_mask",
            offset: offset + 1,
            value: u16::from(header.env_mask),
        })?;

    Ok(Instrument {
        entry_offset,
        addr,
        header,
        seq_table_offset,
        seq_addrs,
    })
}

fn load_samples(
    window: &Window<'_>,
    header: &Header,
) -> Result<(Vec<DpcmInstrument>, usize, Vec<Sample>)> {
    let list_offset = locate(
        window,
        header.sample_list,
        0,
        "Header",
        "sample_list",
        Header::section_offset(2),
    )?;
    let samples_offset = locate(
        window,
        header.samples,
        0,
        "Header",
        "samples",
        Header::section_offset(3),
    )?;

    let num_instrs = usize::from(header.samples.saturating_sub(header.sample_list)) / DpcmInstrument::SIZE;
    let num_samples = usize::from(header.groove_list.saturating_sub(header.samples)) / Sample::SIZE;

    let dpcm_instruments = (0..num_instrs)
        .map(|i| {
            let offset = list_offset + i * DpcmInstrument::SIZE;

            DpcmInstrument::read(window, offset).ok_or(Error::InvalidAddress {
                structure: "Header",
                field: "sample_list",
                offset: Header::section_offset(2),
                value: header.sample_list,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let samples = (0..num_samples)
        .map(|i| {
            let offset = samples_offset + i * Sample::SIZE;

            Sample::read(window, offset).ok_or(Error::InvalidAddress {
                structure: "Header",
                field: "samples",
                offset: Header::section_offset(3),
                value: header.samples,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((dpcm_instruments, samples_offset, samples))
}

/// Compute the smallest region covering every sample.
fn dpcm_region(samples: &[Sample], samples_offset: usize) -> Result<(u16, u32)> {
    let mut base_addr = ADDRESS_SPACE_END;
    let mut end_addr = Sample::REGION_BASE;

    for (i, sample) in samples.iter().enumerate() {
        base_addr = min(base_addr, sample.start_addr());
        end_addr = max(end_addr, sample.end_addr());

        if end_addr > ADDRESS_SPACE_END {
            return Err(Error::SampleOverflow {
                index: i,
                offset: samples_offset + i * Sample::SIZE + Sample::SIZE_OFFSET,
                value: sample.size,
            });
        }
    }

    if base_addr < end_addr {
        Ok((base_addr as u16, end_addr - base_addr))
    } else {
        Ok((DPCM_BASE_MIN, 0))
    }
}
