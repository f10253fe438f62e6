//! Module parser and rebaser tests

use crate::dnft::{Error, ErrorKind, Header, InstrumentType, Module};
use crate::memory::write_u16;

struct SongSpec {
    frame_count: u8,
    channels: usize,
}

/// Assembles small but complete BIN exports for testing.
///
/// Sections are laid out back to back in the order the driver expects, with
/// one byte of pattern data per channel per frame and one byte of sequence
/// data per envelope.
struct Fixture {
    base: u16,
    songs: Vec<SongSpec>,
    env_masks: Vec<u8>,
    dpcm_instruments: usize,
    samples: Vec<(u8, u8)>,
    flags: u8,
    groove: u8,
}

impl Fixture {
    fn new(base: u16) -> Self {
        Fixture {
            base,
            songs: vec![SongSpec {
                frame_count: 3,
                channels: 4,
            }],
            env_masks: vec![0b0000_0101, 0b0001_1111],
            dpcm_instruments: 2,
            samples: vec![(0, 0), (10, 5)],
            flags: 0,
            groove: 0,
        }
    }

    fn bare(base: u16) -> Self {
        Fixture {
            base,
            songs: Vec::new(),
            env_masks: Vec::new(),
            dpcm_instruments: 0,
            samples: Vec::new(),
            flags: 0,
            groove: 0,
        }
    }

    fn addr(&self, offset: usize) -> u16 {
        self.base.wrapping_add(offset as u16)
    }

    fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; Header::SIZE];

        let song_list = out.len();
        out.resize(song_list + self.songs.len() * 2, 0);

        for (i, spec) in self.songs.iter().enumerate() {
            let info = out.len();
            let frame_table = info + 8;
            let frames = frame_table + usize::from(spec.frame_count) * 2;
            let patterns = frames + usize::from(spec.frame_count) * spec.channels * 2;
            let end = patterns + usize::from(spec.frame_count) * spec.channels;

            out.resize(end, 0xFF);
            write_u16(&mut out, song_list + i * 2, self.addr(info));
            write_u16(&mut out, info, self.addr(frame_table));
            out[info + 2..info + 8].copy_from_slice(&[spec.frame_count, 64, 6, 150, 0, 0]);

            for f in 0..usize::from(spec.frame_count) {
                let frame = frames + f * spec.channels * 2;

                write_u16(&mut out, frame_table + f * 2, self.addr(frame));

                for c in 0..spec.channels {
                    let pattern = patterns + f * spec.channels + c;
                    write_u16(&mut out, frame + c * 2, self.addr(pattern));
                }
            }
        }

        let instrument_list = out.len();
        out.resize(instrument_list + self.env_masks.len() * 2, 0);

        for (i, mask) in self.env_masks.iter().enumerate() {
            let instr = out.len();
            let count = mask.count_ones() as usize;
            let seqs = instr + 2 + count * 2;

            write_u16(&mut out, instrument_list + i * 2, self.addr(instr));
            out.extend_from_slice(&[0, *mask]);
            out.resize(seqs + count, 0x7F);

            for s in 0..count {
                write_u16(&mut out, instr + 2 + s * 2, self.addr(seqs + s));
            }
        }

        let sample_list = out.len();
        for i in 0..self.dpcm_instruments {
            out.extend_from_slice(&[0x0F, 0, i as u8]);
        }

        let samples = out.len();
        for (address, size) in self.samples.iter() {
            out.extend_from_slice(&[*address, *size, 0]);
        }

        let groove_list = out.len();
        out.push(self.groove);

        write_u16(&mut out, 0, self.addr(song_list));
        write_u16(&mut out, 2, self.addr(instrument_list));
        write_u16(&mut out, 4, self.addr(sample_list));
        write_u16(&mut out, 6, self.addr(samples));
        write_u16(&mut out, 8, self.addr(groove_list));
        out[10] = self.flags;
        write_u16(&mut out, 11, 0x0E1A);
        write_u16(&mut out, 13, 0x0BB8);

        out
    }

    fn parse(&self) -> Result<Module, Error> {
        Module::parse(self.build(), self.base)
    }
}

#[test]
fn parse_header() {
    let module = Fixture::new(0).parse().unwrap();
    let header = module.header();

    assert_eq!(header.song_list, Header::SIZE as u16);
    assert!(header.song_list <= header.instrument_list);
    assert!(header.instrument_list <= header.sample_list);
    assert!(header.sample_list <= header.samples);
    assert!(header.samples <= header.groove_list);
    assert_eq!(header.ntsc_speed, 0x0E1A);
    assert_eq!(header.pal_speed, 0x0BB8);
    assert_eq!(module.base_addr(), 0);
}

#[test]
fn parse_multiframe_channel_count() {
    let module = Fixture::new(0).parse().unwrap();
    let song = &module.songs()[0];

    assert_eq!(module.songs().len(), 1);
    assert_eq!(song.info().frame_count, 3);
    assert_eq!(song.frame_addrs()[1] - song.frame_addrs()[0], 8);
    assert_eq!(song.channel_count(), 4);
    assert_eq!(song.frames().len(), 3);

    for frame in song.frames() {
        assert_eq!(frame.channel_addrs().len(), 4);
    }
}

#[test]
fn parse_single_frame_channel_count() {
    let mut fixture = Fixture::new(0);
    fixture.songs = vec![
        SongSpec {
            frame_count: 1,
            channels: 5,
        },
        SongSpec {
            frame_count: 2,
            channels: 5,
        },
    ];

    let module = fixture.parse().unwrap();

    assert_eq!(module.songs().len(), 2);
    assert_eq!(module.songs()[0].channel_count(), 5);
    assert_eq!(module.songs()[0].frames()[0].channel_addrs().len(), 5);
    assert_eq!(module.songs()[1].channel_count(), 5);
}

#[test]
fn parse_single_frame_uses_lowest_pattern() {
    let mut fixture = Fixture::bare(0);
    fixture.songs = vec![SongSpec {
        frame_count: 1,
        channels: 3,
    }];

    let mut data = fixture.build();

    // Header, song table, song info and frame table put the frame at 27 and
    // the patterns at 33. Reversing the pattern order means the frame ends
    // at the last channel's pattern rather than the first.
    write_u16(&mut data, 27, 35);
    write_u16(&mut data, 31, 33);

    let module = Module::parse(data, 0).unwrap();

    assert_eq!(module.songs()[0].channel_count(), 3);
}

#[test]
fn parse_single_frame_runs_off_end() {
    let mut fixture = Fixture::bare(0);
    fixture.songs = vec![SongSpec {
        frame_count: 1,
        channels: 1,
    }];

    let mut data = fixture.build();
    assert_eq!(data.len(), 31);

    write_u16(&mut data, 27, 0xFFFF);

    let err = Module::parse(data, 0).unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidAddress {
            structure: "Frame",
            field: "channel_addrs",
            offset: 31,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn parse_instrument_sequences() {
    let module = Fixture::new(0).parse().unwrap();
    let instrs = module.instruments();

    assert_eq!(instrs.len(), 2);
    assert_eq!(instrs[0].header().env_mask, 0b101);
    assert_eq!(instrs[0].seq_addrs().len(), 2);
    assert_eq!(instrs[1].seq_addrs().len(), 5);
    assert_eq!(instrs[0].header().instrument_type(), Some(InstrumentType::Apu));
}

#[test]
fn parse_empty_lists() {
    let module = Fixture::bare(0).parse().unwrap();

    assert!(module.songs().is_empty());
    assert!(module.instruments().is_empty());
    assert!(module.dpcm_instruments().is_empty());
    assert!(module.samples().is_empty());
    assert_eq!(module.dpcm_size(), 0);
    assert_eq!(module.dpcm_base_addr(), 0xC000);
}

#[test]
fn parse_dpcm_region() {
    let module = Fixture::new(0).parse().unwrap();

    assert_eq!(module.dpcm_instruments().len(), 2);
    assert_eq!(module.dpcm_instruments()[1].sample_idx, 1);
    assert_eq!(module.samples().len(), 2);
    assert_eq!(module.samples()[1].start_addr(), 0xC000 + 10 * 64);
    assert_eq!(module.samples()[1].end_addr(), 0xC000 + 10 * 64 + 5 * 16 + 1);
    assert_eq!(module.dpcm_base_addr(), 0xC000);
    assert_eq!(module.dpcm_size(), 10 * 64 + 5 * 16 + 1);
}

#[test]
fn parse_dpcm_region_unordered() {
    let mut fixture = Fixture::new(0);
    fixture.samples = vec![(20, 1), (4, 0)];

    let module = fixture.parse().unwrap();

    assert_eq!(module.dpcm_base_addr(), 0xC000 + 4 * 64);
    assert_eq!(module.dpcm_size(), 16 * 64 + 17);
}

#[test]
fn parse_dpcm_overflow() {
    let mut fixture = Fixture::new(0);
    fixture.samples = vec![(0, 0), (0xFF, 0xFF)];

    let err = fixture.parse().unwrap_err();

    assert!(matches!(
        err,
        Error::SampleOverflow {
            index: 1,
            value: 0xFF,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn parse_section_ordering() {
    let mut data = Fixture::new(0).build();

    write_u16(&mut data, 4, 0x0001);

    let err = Module::parse(data, 0).unwrap_err();

    assert!(matches!(
        err,
        Error::SectionOrdering {
            field: "sample_list",
            offset: 4,
            value: 1,
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn parse_invalid_section_addr() {
    let data = Fixture::new(0x8000).build();
    let len = data.len();

    let err = Module::parse(data.clone(), 0).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidAddress {
            structure: "Header",
            field: "song_list",
            offset: 0,
            ..
        }
    ));

    let mut data = data;
    write_u16(&mut data, 8, 0x8000 + len as u16);

    let err = Module::parse(data, 0x8000).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidAddress {
            field: "groove_list",
            offset: 8,
            ..
        }
    ));
}

#[test]
fn parse_truncated() {
    assert_eq!(
        Module::parse(vec![0; 10], 0).unwrap_err(),
        Error::TruncatedHeader { len: 10 }
    );
}

#[test]
fn parse_flags() {
    let mut fixture = Fixture::new(0);
    fixture.flags = 0b110;

    let module = fixture.parse().unwrap();
    assert!(module.header().flags().is_old_vibrato());
    assert!(module.header().flags().is_linear_pitch());

    fixture.flags = 0b001;
    let err = fixture.parse().unwrap_err();
    assert!(matches!(err, Error::BankSwitched { offset: 10, value: 1 }));
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    fixture.flags = 0b1000;
    let err = fixture.parse().unwrap_err();
    assert!(matches!(err, Error::UnsupportedFlag { offset: 10, value: 8 }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn parse_grooves() {
    let mut fixture = Fixture::new(0);
    fixture.groove = 3;

    let data = fixture.build();
    let groove_offset = data.len() - 1;
    let err = Module::parse(data, 0).unwrap_err();

    assert_eq!(
        err,
        Error::Grooves {
            offset: groove_offset,
            value: 3
        }
    );
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(err.offset(), Some(groove_offset));
}

#[test]
fn parse_nonzero_base() {
    let module = Fixture::new(0x8000).parse().unwrap();

    assert_eq!(module.header().song_list, 0x8000 + Header::SIZE as u16);
    assert_eq!(module.songs()[0].channel_count(), 4);
    assert_eq!(module.instruments()[1].seq_addrs().len(), 5);
}

#[test]
fn rebase_addresses() {
    let mut module = Fixture::new(0).parse().unwrap();
    let orig_song = module.songs()[0].clone();
    let orig_seqs = module.instruments()[0].seq_addrs().to_vec();

    module.rebase(0xA000, 0xF300).unwrap();

    let song = &module.songs()[0];

    assert_eq!(module.base_addr(), 0xA000);
    assert_eq!(module.header().song_list, 0xA000 + Header::SIZE as u16);
    assert_eq!(song.addr(), orig_song.addr() + 0xA000);
    assert_eq!(song.info().frames, orig_song.info().frames + 0xA000);
    assert_eq!(song.frame_addrs()[2], orig_song.frame_addrs()[2] + 0xA000);
    assert_eq!(
        song.frames()[1].channel_addrs()[3],
        orig_song.frames()[1].channel_addrs()[3] + 0xA000
    );
    assert_eq!(module.instruments()[0].seq_addrs()[1], orig_seqs[1] + 0xA000);

    assert_eq!(module.dpcm_base_addr(), 0xF300);
    assert_eq!(module.samples()[0].address, 0x33 * 4);
    assert_eq!(module.samples()[1].address, 0x33 * 4 + 10);
}

#[test]
fn rebase_matches_native_build() {
    let mut module = Fixture::new(0).parse().unwrap();

    module.rebase(0x8000, 0xC000).unwrap();

    assert_eq!(module.binary(), Fixture::new(0x8000).build().as_slice());
}

#[test]
fn rebase_round_trip() {
    let orig = Fixture::new(0).build();
    let mut module = Module::parse(orig.clone(), 0).unwrap();

    module.rebase(0xA000, 0xF300).unwrap();
    assert_ne!(module.binary(), orig.as_slice());

    module.rebase(0x9123, 0xD040).unwrap();
    module.rebase(0, 0xC000).unwrap();
    assert_eq!(module.binary(), orig.as_slice());

    let reparsed = Module::parse(module.into_binary(), 0).unwrap();
    assert_eq!(reparsed.dpcm_base_addr(), 0xC000);
}

#[test]
fn rebase_idempotent() {
    let orig = Fixture::new(0x8000).build();
    let mut module = Module::parse(orig.clone(), 0x8000).unwrap();
    let dpcm_base = module.dpcm_base_addr();

    module.rebase(0x8000, dpcm_base).unwrap();

    assert_eq!(module.binary(), orig.as_slice());
}

#[test]
fn rebase_invalid_parameters() {
    let orig = Fixture::new(0).build();
    let mut module = Module::parse(orig.clone(), 0).unwrap();

    for (base, dpcm_base) in [
        (0xA000, 0xBFC0),
        (0xA000, 0xC001),
        (0xFF00, 0xC000),
        (0xA000, 0xFFC0),
    ]
    .iter()
    {
        let err = module.rebase(*base, *dpcm_base).unwrap_err();

        assert!(matches!(err, Error::InvalidParameter(_)));
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert_eq!(module.binary(), orig.as_slice());
        assert_eq!(module.base_addr(), 0);
    }
}

#[test]
fn rebase_without_samples_keeps_dpcm_base() {
    let mut module = Fixture::bare(0).parse().unwrap();

    assert_eq!(module.dpcm_base_addr(), 0xC000);

    module.rebase(0xA000, 0xF300).unwrap();

    assert_eq!(module.base_addr(), 0xA000);
    assert_eq!(module.dpcm_base_addr(), 0xC000);
    assert_eq!(module.dpcm_size(), 0);
}
