use std::fmt::Display;
use std::str::FromStr;

use crate::error::Error;
use crate::prim::PrimitiveKind;

/// Number of columns (and `MIB_DSP` tiles per plane) in one DSP block group.
pub const GROUP_WIDTH: usize = 9;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Device {
    Lfe5u25f,
    Lfe5u85f,
    Lfe5um5g85f,
}

struct DeviceInfo {
    device: Device,
    name: &'static str,
    // Diamond part parameters: architecture, package, performance grade.
    arch: &'static str,
    package: &'static str,
    perf: &'static str,
    // Base (row, column) of the representative DSP block group.
    dsp_base: (u32, u32),
}

// The 85F parts share a die; row 34 holds a DSP block group in the middle of the array.
const DEVICES: &[DeviceInfo] = &[
    DeviceInfo {
        device: Device::Lfe5u25f,
        name: "LFE5U-25F",
        arch: "sa5p00",
        package: "CABGA381",
        perf: "6",
        dsp_base: (13, 4),
    },
    DeviceInfo {
        device: Device::Lfe5u85f,
        name: "LFE5U-85F",
        arch: "sa5p00",
        package: "CABGA381",
        perf: "6",
        dsp_base: (34, 58),
    },
    DeviceInfo {
        device: Device::Lfe5um5g85f,
        name: "LFE5UM5G-85F",
        arch: "sa5p00g",
        package: "CABGA381",
        perf: "8",
        dsp_base: (34, 58),
    },
];

impl Device {
    pub const ALL: [Device; 3] = [Device::Lfe5u25f, Device::Lfe5u85f, Device::Lfe5um5g85f];

    fn info(self) -> &'static DeviceInfo {
        // DEVICES is in declaration order
        &DEVICES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn arch(self) -> &'static str {
        self.info().arch
    }

    pub fn package(self) -> &'static str {
        self.info().package
    }

    pub fn performance(self) -> &'static str {
        self.info().perf
    }

    pub fn tile_group(self) -> TileGroup {
        let (row, col) = self.info().dsp_base;
        let mut tiles = Vec::with_capacity(GROUP_WIDTH * 2);
        for i in 0..GROUP_WIDTH {
            let index = i as u8;
            let col = col + i as u32;
            tiles.push(TileAddr {
                row,
                col,
                plane: TilePlane::Primary,
                index,
            });
            tiles.push(TileAddr {
                row,
                col,
                plane: TilePlane::Secondary,
                index,
            });
        }
        TileGroup {
            device: self,
            row,
            col,
            tiles,
        }
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DEVICES
            .iter()
            .find(|info| info.name == s)
            .map(|info| info.device)
            .ok_or_else(|| Error::UnsupportedDevice(s.to_string()))
    }
}

/// The two configuration planes of a DSP column. Some DSP configuration bits live only in
/// the secondary (`MIB2`) plane.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TilePlane {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TileAddr {
    pub row: u32,
    pub col: u32,
    pub plane: TilePlane,
    /// Position within the block group.
    pub index: u8,
}

impl TileAddr {
    pub fn kind(&self) -> String {
        match self.plane {
            TilePlane::Primary => format!("MIB_DSP{}", self.index),
            TilePlane::Secondary => format!("MIB2_DSP{}", self.index),
        }
    }
}

impl Display for TileAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MIB_R{}C{}:{}", self.row, self.col, self.kind())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TileGroup {
    pub device: Device,
    pub row: u32,
    pub col: u32,
    pub tiles: Vec<TileAddr>,
}

impl TileGroup {
    pub fn tile_names(&self) -> Vec<String> {
        self.tiles.iter().map(|t| t.to_string()).collect()
    }

    /// Instances of one primitive type within this group.
    pub fn instances(&self, kind: PrimitiveKind) -> Vec<PrimitiveInstance> {
        let info = kind.info();
        info.instances
            .iter()
            .map(|&(idx, offset)| PrimitiveInstance {
                kind,
                label: format!("{site}_{idx}", site = info.site),
                loc: format!(
                    "{site}_R{row}C{col}",
                    site = info.site,
                    row = self.row,
                    col = self.col + u32::from(offset)
                ),
            })
            .collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PrimitiveInstance {
    pub kind: PrimitiveKind,
    /// Name used for the job and as a prefix of result keys, e.g. `MULT9_0`.
    pub label: String,
    /// Placement site, e.g. `MULT9_R13C4`.
    pub loc: String,
}

#[derive(Clone, Debug)]
pub struct Geometry {
    pub device: Device,
    pub group: TileGroup,
    pub instances: Vec<PrimitiveInstance>,
}

pub fn resolve(device: &str) -> Result<Geometry, Error> {
    let device: Device = device.parse()?;
    let group = device.tile_group();
    let instances = PrimitiveKind::ALL
        .into_iter()
        .flat_map(|kind| group.instances(kind))
        .collect();
    Ok(Geometry {
        device,
        group,
        instances,
    })
}
