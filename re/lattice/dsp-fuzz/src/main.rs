use std::error::Error;
use std::fs::create_dir_all;
use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use prjcombine_re_lattice_dsp_fuzz::builder::DiamondBuilder;
use prjcombine_re_lattice_dsp_fuzz::dispatch::qualified_field;
use prjcombine_re_lattice_dsp_fuzz::fuzz::DiffFuzzer;
use prjcombine_re_lattice_dsp_fuzz::job::{Job, JobConfig, make_jobs};
use prjcombine_re_lattice_dsp_fuzz::sched::{Runner, run_all};
use prjcombine_re_lattice_dsp_fuzz::sweep::sweeps_for;
use prjcombine_re_lattice_dsp_fuzz::{ErrorClass, PrimitiveKind, database, resolve};
use prjcombine_re_toolchain::Toolchain;
use simple_error::bail;

#[derive(Debug, Parser)]
#[command(
    name = "ecp5_dsp_fuzz",
    about = "Find the configuration bits of ECP5 DSP primitives."
)]
struct Args {
    toolchain: PathBuf,
    database: PathBuf,
    #[arg(long, env = "TRELLIS_DEVICE", default_value = "LFE5U-25F")]
    device: String,
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))]
    templates: PathBuf,
    #[arg(long, default_value = ".")]
    output: PathBuf,
    #[arg(short, long, default_value = "0")]
    num_threads: usize,
    /// Only fuzz these primitives (mult9, alu24, pradd9).
    #[arg(long)]
    prim: Vec<PrimitiveKind>,
    /// Print the jobs and sweeps without building anything.
    #[arg(long)]
    dry_run: bool,
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

fn print_plan(jobs: &[Job]) {
    for job in jobs {
        println!("job {label} at {loc}", label = job.label(), loc = job.inst.loc);
        for sweep in sweeps_for(job.inst.kind) {
            println!(
                "    {field}{structural}: {values}",
                field = qualified_field(job, &sweep),
                structural = if sweep.structural { " (structural)" } else { "" },
                values = sweep.values.iter().join(" ")
            );
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let geom = resolve(&args.device)?;
    let kinds = if args.prim.is_empty() {
        PrimitiveKind::ALL.to_vec()
    } else {
        args.prim.iter().copied().unique().collect()
    };
    let jobs = make_jobs(geom.device, &kinds, &JobConfig::from_dir(&args.templates));
    if args.dry_run {
        println!(
            "device {dev}: tiles {tiles}",
            dev = geom.device,
            tiles = geom.group.tile_names().join(" ")
        );
        print_plan(&jobs);
        return Ok(());
    }
    let tc = Toolchain::from_file(&args.toolchain)?;
    let db = database::load(&args.database, geom.device)?;
    create_dir_all(&args.output)?;

    let builder = DiamondBuilder::new(&tc, args.debug >= 1);
    let fuzzer = DiffFuzzer::new(&builder, db);
    let runner = Runner::new(&builder, &fuzzer, args.debug, &jobs);
    let reports = run_all(&jobs, args.num_threads, |job| runner.run_job(job))?;
    runner.bar.finish();

    let mut failed = 0;
    for report in &reports {
        let res = match &report.result {
            Ok(res) => res,
            Err(e) => {
                failed += 1;
                if e.class() == ErrorClass::Authoring {
                    println!("{job}: AUTHORING ERROR: {e}", job = report.job);
                } else {
                    println!("{job}: failed: {e}", job = report.job);
                }
                continue;
            }
        };
        match res.write_json(&args.output) {
            Ok(path) => println!(
                "{job}: {n} fields, written to {path}",
                job = report.job,
                n = res.fields.len(),
                path = path.display()
            ),
            Err(e) => {
                failed += 1;
                println!("{job}: failed: {e}", job = report.job);
            }
        }
    }
    if failed != 0 {
        bail!("{failed} of {n} jobs failed", n = reports.len());
    }
    Ok(())
}
