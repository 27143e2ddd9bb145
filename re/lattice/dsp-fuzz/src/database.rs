use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::bitstream::{BitPos, TileBit};
use crate::device::{Device, TileGroup};
use crate::error::Error;

/// Where a tile's configuration bits sit in the frame array.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct TileInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub start_frame: usize,
    pub start_bit: usize,
    #[serde(rename = "cols")]
    pub frames: usize,
    #[serde(rename = "rows")]
    pub bits: usize,
}

impl TileInfo {
    fn contains(&self, pos: BitPos) -> bool {
        (self.start_frame..self.start_frame + self.frames).contains(&pos.frame)
            && (self.start_bit..self.start_bit + self.bits).contains(&pos.bit)
    }
}

#[derive(Clone, Debug)]
pub struct Database {
    pub device: Device,
    pub tiles: BTreeMap<String, TileInfo>,
}

static DATABASE: OnceLock<Database> = OnceLock::new();

/// Loads the device database for the process. Must happen once, before any job runs.
pub fn load(root: &Path, device: Device) -> Result<&'static Database, Error> {
    if DATABASE.get().is_some() {
        return Err(Error::DatabaseAlreadyLoaded);
    }
    let db = Database::from_dir(root, device)?;
    DATABASE.set(db).map_err(|_| Error::DatabaseAlreadyLoaded)?;
    get().ok_or(Error::DatabaseAlreadyLoaded)
}

pub fn get() -> Option<&'static Database> {
    DATABASE.get()
}

impl Database {
    pub fn from_dir(root: &Path, device: Device) -> Result<Self, Error> {
        let path = root.join("ECP5").join(device.name()).join("tilegrid.json");
        let data = std::fs::read_to_string(&path)
            .map_err(|e| Error::Database(format!("{}: {e}", path.display())))?;
        Self::from_tilegrid(device, &data)
            .map_err(|e| Error::Database(format!("{}: {e}", path.display())))
    }

    pub fn from_tilegrid(device: Device, data: &str) -> Result<Self, Error> {
        let tiles: BTreeMap<String, TileInfo> =
            serde_json::from_str(data).map_err(|e| Error::Database(e.to_string()))?;
        Ok(Database { device, tiles })
    }

    /// Bit rectangles of every tile in a block group, in group order.
    pub fn group_bits(&self, group: &TileGroup) -> Result<GroupBits, Error> {
        if group.device != self.device {
            return Err(Error::Database(format!(
                "database is for {}, block group is on {}",
                self.device, group.device
            )));
        }
        let mut rects = vec![];
        for tile in &group.tiles {
            let name = tile.to_string();
            let Some(info) = self.tiles.get(&name) else {
                return Err(Error::Database(format!("tile {name} missing")));
            };
            if info.kind != tile.kind() {
                return Err(Error::Database(format!(
                    "tile {name} has type {}, expected {}",
                    info.kind,
                    tile.kind()
                )));
            }
            rects.push(info.clone());
        }
        Ok(GroupBits { rects })
    }
}

#[derive(Clone, Debug)]
pub struct GroupBits {
    rects: Vec<TileInfo>,
}

impl GroupBits {
    pub fn xlat(&self, pos: BitPos) -> Option<TileBit> {
        let (tile, info) = self
            .rects
            .iter()
            .enumerate()
            .find(|(_, info)| info.contains(pos))?;
        Some(TileBit {
            tile,
            frame: pos.frame - info.start_frame,
            bit: pos.bit - info.start_bit,
        })
    }
}
