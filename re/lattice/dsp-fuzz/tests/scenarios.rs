use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use assert_matches::assert_matches;
use prjcombine_re_lattice_dsp_fuzz::bitstream::{BitPos, Bitstream};
use prjcombine_re_lattice_dsp_fuzz::builder::{DesignBuilder, device_context};
use prjcombine_re_lattice_dsp_fuzz::database::{self, Database};
use prjcombine_re_lattice_dsp_fuzz::fuzz::DiffFuzzer;
use prjcombine_re_lattice_dsp_fuzz::job::{JobConfig, make_jobs};
use prjcombine_re_lattice_dsp_fuzz::sched::{Runner, run_all};
use prjcombine_re_lattice_dsp_fuzz::sweep::{Substitutions, sweeps_for};
use prjcombine_re_lattice_dsp_fuzz::template::Template;
use prjcombine_re_lattice_dsp_fuzz::{BuildError, Device, Error, PrimitiveKind, resolve};
use serde_json::json;

fn templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Renders the real templates, then "compiles" the text: an uncommented `site` line
/// sets a bit in the column of the placed site, and every `program` setting sets a bit
/// derived from its text next to it.
struct TextBuilder;

impl TextBuilder {
    fn column(device: Device, site: &str) -> usize {
        let base = device.tile_group().col as usize;
        let col: usize = site.rsplit_once('C').unwrap().1.parse().unwrap();
        col - base
    }
}

impl DesignBuilder for TextBuilder {
    fn build(
        &self,
        device: Device,
        template: &Path,
        subst: &Substitutions,
    ) -> Result<Bitstream, BuildError> {
        let text = Template::from_file(template)?.substitute(&device_context(device, subst))?;
        let mut bs = Bitstream::new(40, 16);
        let mut column = None;
        for line in text.lines().map(str::trim) {
            if let Some(site) = line.strip_prefix("site ") {
                column = Some(Self::column(device, site.trim_end_matches(';')));
            }
        }
        let Some(column) = column else {
            return Ok(bs);
        };
        // primary plane tile of the column
        let frame = column * 2;
        bs.set(BitPos { frame, bit: 0 }, true);
        for line in text.lines().map(str::trim) {
            if let Some(program) = line.strip_prefix("program ") {
                let program = program.trim_end_matches(';').trim_matches('"');
                for setting in program.split_whitespace().filter(|s| !s.starts_with("MODE:")) {
                    let bit = setting.bytes().map(usize::from).sum::<usize>() % 7 + 1;
                    bs.set(BitPos { frame, bit }, true);
                }
            }
        }
        // global configuration outside the block group
        bs.set(BitPos { frame: 39, bit: 15 }, true);
        Ok(bs)
    }
}

fn tilegrid(device: Device) -> String {
    let mut grid = serde_json::Map::new();
    for (i, tile) in device.tile_group().tiles.iter().enumerate() {
        grid.insert(
            tile.to_string(),
            json!({"type": tile.kind(), "start_frame": i, "start_bit": 0, "cols": 1, "rows": 8}),
        );
    }
    serde_json::Value::Object(grid).to_string()
}

#[test]
fn shipped_templates_cover_contexts() {
    let empty = Template::from_file(&templates().join("empty.ncl")).unwrap();
    let header: BTreeSet<_> = ["arch", "device", "package", "performance"].into();
    assert!(empty.placeholders().is_subset(&header));

    let dsp = Template::from_file(&templates().join("dspconfig.ncl")).unwrap();
    for device in Device::ALL {
        let jobs = make_jobs(device, &PrimitiveKind::ALL, &JobConfig::from_dir(&templates()));
        for job in &jobs {
            for sweep in sweeps_for(job.inst.kind) {
                for &value in &sweep.values {
                    let ctx = device_context(device, &sweep.context(&job.nominal(), value).unwrap());
                    let text = dsp.substitute(&ctx).unwrap();
                    assert!(text.contains(&format!("site {};", job.inst.loc)));
                }
            }
        }
    }
}

#[test]
fn end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("ECP5").join("LFE5U-25F");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("tilegrid.json"), tilegrid(Device::Lfe5u25f)).unwrap();

    let geom = resolve("LFE5U-25F").unwrap();
    let db = database::load(root.path(), geom.device).unwrap();
    assert_matches!(
        database::load(root.path(), geom.device),
        Err(Error::DatabaseAlreadyLoaded)
    );
    assert!(std::ptr::eq(db, database::get().unwrap()));

    let jobs = make_jobs(
        geom.device,
        &[PrimitiveKind::Mult9, PrimitiveKind::Alu24],
        &JobConfig::from_dir(&templates()),
    );
    let fuzzer = DiffFuzzer::new(&TextBuilder, db);
    let runner = Runner::new(&TextBuilder, &fuzzer, 0, &jobs);
    let reports = run_all(&jobs, 2, |job| runner.run_job(job)).unwrap();
    assert_eq!(reports.len(), 4);

    let out = tempfile::tempdir().unwrap();
    for report in &reports {
        let res = report.result.as_ref().unwrap();
        res.write_json(out.path()).unwrap();
    }
    let data: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("ALU24_7.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(data["loc"], "ALU24_R13C11");
    assert_eq!(data["tiles"].as_array().unwrap().len(), 18);
    // ALU24_7 sits in column 7 of the group, whose primary tile is tile 14
    let mode = &data["fields"]["ALU24_7.MODE"];
    assert_eq!(mode["bits"], json!([{"tile": 14, "frame": 0, "bit": 0}]));
    assert_eq!(mode["values"]["NONE"], json!([false]));
    assert_eq!(mode["values"]["ALU24B"], json!([true]));
    // the instantiation bit is set by both values, so only the setting bits remain
    let resetmode = &data["fields"]["ALU24_7.RESETMODE"];
    assert_eq!(
        resetmode["bits"],
        json!([
            {"tile": 14, "frame": 0, "bit": 2},
            {"tile": 14, "frame": 0, "bit": 4}
        ])
    );
    assert_eq!(resetmode["values"]["SYNC"], json!([true, false]));
    assert_eq!(resetmode["values"]["ASYNC"], json!([false, true]));
    assert_eq!(resetmode["values"].as_object().unwrap().len(), 2);
    assert_eq!(
        data["fields"].as_object().unwrap().len(),
        sweeps_for(PrimitiveKind::Alu24).len()
    );
}

#[test]
fn missing_database() {
    let root = tempfile::tempdir().unwrap();
    assert_matches!(
        Database::from_dir(root.path(), Device::Lfe5um5g85f),
        Err(Error::Database(msg)) if msg.contains("LFE5UM5G-85F")
    );
}

#[test]
fn unsupported_device() {
    let err = resolve("LFE5U-45F").unwrap_err();
    assert_eq!(err.to_string(), "unsupported device \"LFE5U-45F\"");
}
