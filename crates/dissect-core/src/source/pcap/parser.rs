use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::{PcapNGPacketBlock, PcapReaderIterator},
};

use crate::source::{CapturedFrame, FrameSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{
    is_pcapng_magic, legacy_ts_to_seconds, linktype_for_interface, pcapng_ts_to_seconds,
    read_magic_and_rewind,
};

/// Frame source over a `.pcap` or `.pcapng` file.
pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

enum Step {
    Frame(CapturedFrame),
    Skip,
    Eof,
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(SourceError::from)?;
        let inner = create_reader(file).map_err(SourceError::from)?;
        Ok(Self { inner })
    }
}

impl FrameSource for PcapFileSource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError> {
        next_frame(&mut self.inner).map_err(SourceError::from)
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut file)?;

    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcapng reader init", e))?;
        Ok(PcapReader::Ng {
            reader,
            linktypes: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcap reader init", e))?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: None,
        })
    }
}

fn next_frame(reader: &mut PcapReader) -> Result<Option<CapturedFrame>, PcapSourceError> {
    loop {
        let step = match reader {
            PcapReader::Legacy { reader, linktype } => {
                advance(reader, "pcap", |block| legacy_frame(block, linktype))?
            }
            PcapReader::Ng { reader, linktypes } => {
                advance(reader, "pcapng", |block| ng_frame(block, linktypes))?
            }
        };
        match step {
            Step::Frame(frame) => return Ok(Some(frame)),
            Step::Skip => continue,
            Step::Eof => return Ok(None),
        }
    }
}

fn advance<R: PcapReaderIterator>(
    reader: &mut R,
    context: &'static str,
    mut on_block: impl FnMut(PcapBlockOwned<'_>) -> Option<CapturedFrame>,
) -> Result<Step, PcapSourceError> {
    match reader.next() {
        Ok((offset, block)) => {
            let frame = on_block(block);
            reader.consume(offset);
            Ok(frame.map_or(Step::Skip, Step::Frame))
        }
        Err(PcapError::Eof) => Ok(Step::Eof),
        Err(PcapError::Incomplete(_)) => {
            reader
                .refill()
                .map_err(|e| PcapSourceError::pcap(context, e))?;
            Ok(Step::Skip)
        }
        Err(e) => Err(PcapSourceError::pcap(context, e)),
    }
}

fn legacy_frame(block: PcapBlockOwned<'_>, linktype: &mut Option<Linktype>) -> Option<CapturedFrame> {
    match block {
        PcapBlockOwned::LegacyHeader(header) => {
            *linktype = Some(header.network);
            None
        }
        PcapBlockOwned::Legacy(packet) => Some(CapturedFrame {
            ts: Some(legacy_ts_to_seconds(packet.ts_sec, packet.ts_usec)),
            linktype: linktype.unwrap_or(Linktype::ETHERNET),
            data: packet.data.to_vec(),
        }),
        _ => None,
    }
}

fn ng_frame(block: PcapBlockOwned<'_>, linktypes: &mut Vec<Linktype>) -> Option<CapturedFrame> {
    match block {
        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
            linktypes.push(intf.linktype);
            None
        }
        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => Some(CapturedFrame {
            ts: Some(pcapng_ts_to_seconds(packet.ts_high, packet.ts_low)),
            linktype: linktype_for_interface(linktypes, packet.if_id),
            data: packet.packet_data().to_vec(),
        }),
        _ => None,
    }
}
