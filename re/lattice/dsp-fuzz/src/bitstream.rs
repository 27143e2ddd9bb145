use std::collections::HashMap;

use bitvec::vec::BitVec;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BitPos {
    pub frame: usize,
    pub bit: usize,
}

/// A bit position relative to one tile of a block group.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct TileBit {
    /// Index into the group's tile list.
    pub tile: usize,
    pub frame: usize,
    pub bit: usize,
}

impl core::fmt::Debug for TileBit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.tile, self.frame, self.bit)
    }
}

/// Configuration frames of a built design, as produced by `bitgen -a`.
///
/// Frames are taken to appear in the ASCII output in the same order as the `start_frame`
/// numbering of the device tile grid, with bit 0 first on each line. Nothing checks this
/// against the tile grid; [`Bitstream::shape`] only catches builds whose frame geometry
/// differs from the baseline.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Bitstream {
    pub frames: Vec<BitVec>,
}

impl Bitstream {
    pub fn new(num_frames: usize, frame_len: usize) -> Self {
        Bitstream {
            frames: vec![BitVec::repeat(false, frame_len); num_frames],
        }
    }

    /// Parses an ASCII bitstream: every line made up only of `0` and `1` is one frame, in
    /// order. Header and comment lines are skipped.
    pub fn parse_ascii(data: &str) -> Result<Self, String> {
        let mut frames: Vec<BitVec> = vec![];
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || !line.bytes().all(|b| b == b'0' || b == b'1') {
                continue;
            }
            let frame: BitVec = line.bytes().map(|b| b == b'1').collect();
            if let Some(first) = frames.first() {
                if first.len() != frame.len() {
                    return Err(format!(
                        "frame {n} has {got} bits, expected {exp}",
                        n = frames.len(),
                        got = frame.len(),
                        exp = first.len()
                    ));
                }
            }
            frames.push(frame);
        }
        if frames.is_empty() {
            return Err("no frames in bitstream".into());
        }
        Ok(Bitstream { frames })
    }

    /// Number of frames and length of the first frame.
    pub fn shape(&self) -> (usize, usize) {
        (
            self.frames.len(),
            self.frames.first().map_or(0, |frame| frame.len()),
        )
    }

    pub fn get(&self, pos: BitPos) -> bool {
        self.frames
            .get(pos.frame)
            .and_then(|frame| frame.get(pos.bit).map(|b| *b))
            .unwrap_or(false)
    }

    pub fn set(&mut self, pos: BitPos, val: bool) {
        self.frames[pos.frame].set(pos.bit, val);
    }

    /// Bits whose value in `other` differs from `self`, with their value in `other`.
    pub fn diff(&self, other: &Bitstream) -> HashMap<BitPos, bool> {
        let mut res = HashMap::new();
        let num_frames = self.frames.len().max(other.frames.len());
        for frame in 0..num_frames {
            let len = [&self.frames, &other.frames]
                .iter()
                .filter_map(|frames| frames.get(frame))
                .map(|f| f.len())
                .max()
                .unwrap_or(0);
            for bit in 0..len {
                let pos = BitPos { frame, bit };
                let new = other.get(pos);
                if self.get(pos) != new {
                    res.insert(pos, new);
                }
            }
        }
        res
    }
}
