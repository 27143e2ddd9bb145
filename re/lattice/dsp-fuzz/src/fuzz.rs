use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::bitstream::{Bitstream, TileBit};
use crate::builder::DesignBuilder;
use crate::database::Database;
use crate::dispatch::Trial;
use crate::error::Error;
use crate::job::Job;

/// Which tile bits encode a field, and the pattern each value puts on them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EnumAttribution {
    pub bits: Vec<TileBit>,
    pub values: BTreeMap<String, Vec<bool>>,
}

/// Everything an enum fuzzer needs to attribute one field.
pub struct FuzzRequest<'a> {
    pub job: &'a Job,
    /// Qualified as `LABEL.FIELD`.
    pub field: String,
    pub trials: &'a [Trial],
    pub baseline: &'a Bitstream,
    pub structural: bool,
}

impl FuzzRequest<'_> {
    pub fn candidates(&self) -> Vec<&str> {
        self.trials.iter().map(|t| t.value.as_str()).collect()
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Fuzz {
            job: self.job.label().to_string(),
            field: self.field.clone(),
            message: message.into(),
        }
    }
}

pub trait EnumFuzzer: Sync {
    fn fuzz(&self, req: &FuzzRequest<'_>) -> Result<EnumAttribution, Error>;
}

/// Builds every candidate and diffs it against the baseline, within the job's block group.
pub struct DiffFuzzer<'a, B: DesignBuilder> {
    pub builder: &'a B,
    pub db: &'a Database,
}

impl<'a, B: DesignBuilder> DiffFuzzer<'a, B> {
    pub fn new(builder: &'a B, db: &'a Database) -> Self {
        DiffFuzzer { builder, db }
    }
}

impl<B: DesignBuilder> EnumFuzzer for DiffFuzzer<'_, B> {
    fn fuzz(&self, req: &FuzzRequest<'_>) -> Result<EnumAttribution, Error> {
        let job = req.job;
        let group_bits = self.db.group_bits(&job.group)?;
        let mut seen = BTreeSet::new();
        for value in req.candidates() {
            if !seen.insert(value) {
                return Err(req.error(format!("candidate {value} given twice")));
            }
        }
        let mut diffs = vec![];
        for trial in req.trials {
            let bs = self
                .builder
                .build(job.device, &job.config.template, &trial.subst)
                .map_err(|source| Error::Build {
                    job: job.label().to_string(),
                    field: Some(req.field.clone()),
                    source,
                })?;
            if bs.shape() != req.baseline.shape() {
                return Err(req.error(format!(
                    "{value}: bitstream has {got:?} frames and bits, baseline has {exp:?}",
                    value = trial.value,
                    got = bs.shape(),
                    exp = req.baseline.shape()
                )));
            }
            // bits outside the block group are routing noise
            let diff: BTreeMap<TileBit, bool> = req
                .baseline
                .diff(&bs)
                .into_iter()
                .filter_map(|(pos, val)| Some((group_bits.xlat(pos)?, val)))
                .collect();
            diffs.push((trial.value.clone(), diff));
        }
        // baseline value of every bit any candidate touches
        let mut bits = BTreeMap::new();
        for (_, diff) in &diffs {
            for (&bit, &val) in diff {
                bits.insert(bit, !val);
            }
        }
        if !req.structural {
            // bits every candidate sets belong to the instantiation, not to this field
            bits.retain(|bit, _| !diffs.iter().all(|(_, diff)| diff.contains_key(bit)));
        }
        let bits_vec: Vec<_> = bits.keys().copied().collect();
        let values = diffs
            .into_iter()
            .map(|(value, diff)| {
                (
                    value,
                    bits_vec
                        .iter()
                        .map(|bit| diff.get(bit).copied().unwrap_or(bits[bit]))
                        .collect(),
                )
            })
            .collect();
        Ok(EnumAttribution {
            bits: bits_vec,
            values,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use assert_matches::assert_matches;

    use super::{DiffFuzzer, EnumFuzzer, FuzzRequest};
    use crate::bitstream::{BitPos, Bitstream, TileBit};
    use crate::builder::DesignBuilder;
    use crate::database::tests::synthetic;
    use crate::device::Device;
    use crate::dispatch::Trial;
    use crate::error::{BuildError, Error};
    use crate::job::{Job, JobConfig, make_jobs};
    use crate::prim::PrimitiveKind;
    use crate::sweep::{Substitutions, sweeps_for};

    /// Pretends to be a toolchain. Every design sets frame 0 bit 0 (an instantiated
    /// primitive), unless commented out. `settings` of the form `FIELD=VALUE` set one bit
    /// of tile 1: the position of `VALUE` in a list of clock names, or a bit derived from
    /// its spelling otherwise. The value `FAIL` makes the build fail. Frame 30 is outside
    /// the block group and always toggles.
    pub(crate) struct FakeBuilder;

    const FAKE_VALUES: &[&str] = &["NONE", "CLK0", "CLK1", "CLK2", "CLK3"];

    fn fake_bit(value: &str) -> usize {
        match FAKE_VALUES.iter().position(|&v| v == value) {
            Some(idx) => idx,
            None => value.bytes().map(usize::from).sum::<usize>() % 7 + 1,
        }
    }

    impl DesignBuilder for FakeBuilder {
        fn build(
            &self,
            _device: Device,
            _template: &Path,
            subst: &Substitutions,
        ) -> Result<Bitstream, BuildError> {
            let mut bs = Bitstream::new(32, 16);
            if subst.is_empty() {
                return Ok(bs);
            }
            bs.set(BitPos { frame: 30, bit: 0 }, true);
            if subst.get("comment").is_some_and(|c| c == "//") {
                return Ok(bs);
            }
            bs.set(BitPos { frame: 0, bit: 0 }, true);
            let settings = subst.get("settings").map(String::as_str).unwrap_or("");
            if let Some((_, value)) = settings.split_once('=') {
                if value == "FAIL" {
                    return Err(BuildError::Toolchain(format!("bad value {value}")));
                }
                let bit = fake_bit(value);
                if bit != 0 {
                    bs.set(BitPos { frame: 1, bit }, true);
                }
            }
            Ok(bs)
        }
    }

    fn job() -> Job {
        make_jobs(
            Device::Lfe5u25f,
            &[PrimitiveKind::Mult9],
            &JobConfig::from_dir(Path::new("templates")),
        )
        .remove(0)
    }

    fn trials(job: &Job, field: &str) -> (Vec<Trial>, bool) {
        let sweep = sweeps_for(PrimitiveKind::Mult9)
            .into_iter()
            .find(|s| s.field == field)
            .unwrap();
        let trials = sweep
            .values
            .iter()
            .map(|v| Trial::new(job, &sweep, v).unwrap())
            .collect();
        (trials, sweep.structural)
    }

    #[test]
    fn test_enum() {
        let db = synthetic(Device::Lfe5u25f);
        let fuzzer = DiffFuzzer::new(&FakeBuilder, &db);
        let job = job();
        let baseline = Bitstream::new(32, 16);
        let (trials, structural) = trials(&job, "REG_INPUTA_CLK");
        let res = fuzzer
            .fuzz(&FuzzRequest {
                job: &job,
                field: "MULT9_0.REG_INPUTA_CLK".into(),
                trials: &trials,
                baseline: &baseline,
                structural,
            })
            .unwrap();
        // frame 1 is tile 1 of the group, the secondary plane of column 0
        assert_eq!(
            res.bits,
            (1..5)
                .map(|bit| TileBit {
                    tile: 1,
                    frame: 0,
                    bit
                })
                .collect::<Vec<_>>()
        );
        assert_eq!(res.values["NONE"], [false, false, false, false]);
        assert_eq!(res.values["CLK2"], [false, true, false, false]);
        assert_eq!(res.values.len(), 5);
    }

    #[test]
    fn test_structural() {
        let db = synthetic(Device::Lfe5u25f);
        let fuzzer = DiffFuzzer::new(&FakeBuilder, &db);
        let job = job();
        let baseline = Bitstream::new(32, 16);
        let (trials, structural) = trials(&job, "MODE");
        assert!(structural);
        let res = fuzzer
            .fuzz(&FuzzRequest {
                job: &job,
                field: "MULT9_0.MODE".into(),
                trials: &trials,
                baseline: &baseline,
                structural,
            })
            .unwrap();
        assert_eq!(
            res.bits,
            [TileBit {
                tile: 0,
                frame: 0,
                bit: 0
            }]
        );
        assert_eq!(res.values["NONE"], [false]);
        assert_eq!(res.values["MULT9X9D"], [true]);
    }

    #[test]
    fn test_build_failure() {
        let db = synthetic(Device::Lfe5u25f);
        let fuzzer = DiffFuzzer::new(&FakeBuilder, &db);
        let job = job();
        let baseline = Bitstream::new(32, 16);
        let (mut trials, _) = trials(&job, "GSR");
        trials[1]
            .subst
            .insert("settings".into(), "GSR=FAIL".into());
        assert_matches!(
            fuzzer.fuzz(&FuzzRequest {
                job: &job,
                field: "MULT9_0.GSR".into(),
                trials: &trials,
                baseline: &baseline,
                structural: false,
            }),
            Err(Error::Build { job, field: Some(field), source: BuildError::Toolchain(_) })
                if job == "MULT9_0" && field == "MULT9_0.GSR"
        );
    }

    #[test]
    fn test_duplicate_candidate() {
        let db = synthetic(Device::Lfe5u25f);
        let fuzzer = DiffFuzzer::new(&FakeBuilder, &db);
        let job = job();
        let baseline = Bitstream::new(32, 16);
        let (mut trials, _) = trials(&job, "REG_INPUTA_CLK");
        trials.push(trials[1].clone());
        assert_matches!(
            fuzzer.fuzz(&FuzzRequest {
                job: &job,
                field: "MULT9_0.REG_INPUTA_CLK".into(),
                trials: &trials,
                baseline: &baseline,
                structural: false,
            }),
            Err(Error::Fuzz { .. })
        );
    }

    /// Builds one frame short whenever a `settings` string is given.
    struct ShortBuilder;

    impl DesignBuilder for ShortBuilder {
        fn build(
            &self,
            device: Device,
            template: &Path,
            subst: &Substitutions,
        ) -> Result<Bitstream, BuildError> {
            let mut bs = FakeBuilder.build(device, template, subst)?;
            if subst.get("settings").is_some_and(|s| !s.is_empty()) {
                bs.frames.pop();
            }
            Ok(bs)
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let db = synthetic(Device::Lfe5u25f);
        let fuzzer = DiffFuzzer::new(&ShortBuilder, &db);
        let job = job();
        let baseline = Bitstream::new(32, 16);
        let (gsr, _) = trials(&job, "GSR");
        assert_matches!(
            fuzzer.fuzz(&FuzzRequest {
                job: &job,
                field: "MULT9_0.GSR".into(),
                trials: &gsr,
                baseline: &baseline,
                structural: false,
            }),
            Err(Error::Fuzz { field, message, .. })
                if field == "MULT9_0.GSR" && message.contains("(31, 16)")
        );
        let (mode, structural) = trials(&job, "MODE");
        assert!(
            fuzzer
                .fuzz(&FuzzRequest {
                    job: &job,
                    field: "MULT9_0.MODE".into(),
                    trials: &mode,
                    baseline: &baseline,
                    structural,
                })
                .is_ok()
        );
    }
}
