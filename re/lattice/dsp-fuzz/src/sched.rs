use indicatif::ProgressBar;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::builder::DesignBuilder;
use crate::dispatch::run_sweep;
use crate::error::Error;
use crate::fuzz::EnumFuzzer;
use crate::job::{Job, JobResult, build_baseline};
use crate::sweep::sweeps_for;

/// Runs the jobs of one device: a baseline, then every field sweep in turn.
pub struct Runner<'a, B: DesignBuilder, F: EnumFuzzer> {
    pub builder: &'a B,
    pub fuzzer: &'a F,
    pub debug: u8,
    pub bar: ProgressBar,
}

impl<'a, B: DesignBuilder, F: EnumFuzzer> Runner<'a, B, F> {
    pub fn new(builder: &'a B, fuzzer: &'a F, debug: u8, jobs: &[Job]) -> Self {
        Runner {
            builder,
            fuzzer,
            debug,
            bar: ProgressBar::new(total_sweeps(jobs)),
        }
    }

    pub fn run_job(&self, job: &Job) -> Result<JobResult, Error> {
        if self.debug >= 1 {
            eprintln!("{}: building baseline", job.label());
        }
        let baseline = build_baseline(job, self.builder)?;
        let mut result = JobResult::new(job);
        for sweep in sweeps_for(job.inst.kind) {
            run_sweep(
                job,
                &sweep,
                &baseline,
                self.fuzzer,
                &mut result,
                self.debug,
            )?;
            self.bar.inc(1);
        }
        if self.debug >= 1 {
            eprintln!("{}: {} fields", job.label(), result.fields.len());
        }
        Ok(result)
    }
}

pub fn total_sweeps(jobs: &[Job]) -> u64 {
    jobs.iter()
        .map(|job| sweeps_for(job.inst.kind).len() as u64)
        .sum()
}

#[derive(Debug)]
pub struct JobReport {
    pub job: String,
    pub result: Result<JobResult, Error>,
}

/// Runs every job on a pool of `num_threads` workers (0 for one per CPU).
///
/// A failing job does not stop the others; reports come back in job order.
pub fn run_all<J>(jobs: &[Job], num_threads: usize, job_fn: J) -> Result<Vec<JobReport>, Error>
where
    J: Fn(&Job) -> Result<JobResult, Error> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(pool.install(|| {
        jobs.par_iter()
            .map(|job| JobReport {
                job: job.label().to_string(),
                result: job_fn(job),
            })
            .collect()
    }))
}
