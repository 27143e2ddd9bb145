use crate::bitstream::Bitstream;
use crate::error::Error;
use crate::fuzz::{EnumFuzzer, FuzzRequest};
use crate::job::{Job, JobResult};
use crate::sweep::{FieldSweep, Substitutions};

/// One candidate value of one field, with the complete context to build it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Trial {
    pub field: String,
    pub value: String,
    pub subst: Substitutions,
}

impl Trial {
    pub fn new(job: &Job, sweep: &FieldSweep, value: &str) -> Result<Self, Error> {
        Ok(Trial {
            field: sweep.field.clone(),
            value: value.to_string(),
            subst: sweep.context(&job.nominal(), value)?,
        })
    }
}

/// `LABEL.FIELD`, the key a field's attribution is stored under.
pub fn qualified_field(job: &Job, sweep: &FieldSweep) -> String {
    format!("{}.{}", job.label(), sweep.field)
}

/// Fuzzes one field of a job and records the attribution in `result`.
pub fn run_sweep(
    job: &Job,
    sweep: &FieldSweep,
    baseline: &Bitstream,
    fuzzer: &(impl EnumFuzzer + ?Sized),
    result: &mut JobResult,
    debug: u8,
) -> Result<(), Error> {
    sweep.validate()?;
    let field = qualified_field(job, sweep);
    if result.fields.contains_key(&field) {
        return Err(Error::DuplicateField {
            job: job.label().to_string(),
            field,
        });
    }
    let trials = sweep
        .values
        .iter()
        .map(|&value| Trial::new(job, sweep, value))
        .collect::<Result<Vec<_>, _>>()?;
    if debug >= 2 {
        eprintln!("{field}: {n} candidates", n = trials.len());
    }
    if debug >= 3 {
        for trial in &trials {
            eprintln!("{field}: {value}: {subst:?}", value = trial.value, subst = trial.subst);
        }
    }
    let attr = fuzzer.fuzz(&FuzzRequest {
        job,
        field: field.clone(),
        trials: &trials,
        baseline,
        structural: sweep.structural,
    })?;
    if debug >= 2 {
        eprintln!("{field}: {n} bits", n = attr.bits.len());
    }
    result.insert(field, attr)
}
