use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::bitstream::Bitstream;
use crate::builder::DesignBuilder;
use crate::device::{Device, PrimitiveInstance, TileGroup};
use crate::error::Error;
use crate::fuzz::EnumAttribution;
use crate::prim::PrimitiveKind;
use crate::sweep::{Nominal, Substitutions};

/// Design templates used by every job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobConfig {
    /// Design with nothing placed; built once per job.
    pub baseline_template: PathBuf,
    /// Design instantiating one DSP primitive.
    pub template: PathBuf,
}

impl JobConfig {
    pub fn from_dir(dir: &Path) -> Self {
        JobConfig {
            baseline_template: dir.join("empty.ncl"),
            template: dir.join("dspconfig.ncl"),
        }
    }
}

/// Fuzzing of one primitive instance.
#[derive(Clone, Debug)]
pub struct Job {
    pub device: Device,
    pub inst: PrimitiveInstance,
    pub group: Arc<TileGroup>,
    pub config: JobConfig,
}

impl Job {
    pub fn label(&self) -> &str {
        &self.inst.label
    }

    pub fn nominal(&self) -> Nominal {
        Nominal::new(&self.inst)
    }
}

/// One job per instance of each requested primitive type, all sharing one block group.
pub fn make_jobs(device: Device, kinds: &[PrimitiveKind], config: &JobConfig) -> Vec<Job> {
    let group = Arc::new(device.tile_group());
    let mut res = vec![];
    for &kind in kinds {
        for inst in group.instances(kind) {
            res.push(Job {
                device,
                inst,
                group: group.clone(),
                config: config.clone(),
            });
        }
    }
    res
}

/// Builds the reference design of a job: the empty template, nothing substituted.
pub fn build_baseline(job: &Job, builder: &impl DesignBuilder) -> Result<Bitstream, Error> {
    builder
        .build(
            job.device,
            &job.config.baseline_template,
            &Substitutions::new(),
        )
        .map_err(|source| Error::Build {
            job: job.label().to_string(),
            field: None,
            source,
        })
}

#[derive(Clone, Debug, Serialize)]
pub struct JobResult {
    pub job: String,
    pub device: String,
    pub loc: String,
    pub tiles: Vec<String>,
    pub fields: BTreeMap<String, EnumAttribution>,
}

impl JobResult {
    pub fn new(job: &Job) -> Self {
        JobResult {
            job: job.label().to_string(),
            device: job.device.to_string(),
            loc: job.inst.loc.clone(),
            tiles: job.group.tile_names(),
            fields: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, field: String, attr: EnumAttribution) -> Result<(), Error> {
        if self.fields.contains_key(&field) {
            return Err(Error::DuplicateField {
                job: self.job.clone(),
                field,
            });
        }
        self.fields.insert(field, attr);
        Ok(())
    }

    pub fn write_json(&self, dir: &Path) -> Result<PathBuf, Error> {
        let path = dir.join(format!("{}.json", self.job));
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::from)?;
        std::fs::write(&path, data)?;
        Ok(path)
    }
}
