use std::path::Path;

use prjcombine_re_toolchain::Toolchain;

use crate::bitstream::Bitstream;
use crate::device::Device;
use crate::error::BuildError;
use crate::sweep::Substitutions;
use crate::template::Template;

/// Turns a design template plus substitutions into a bitstream.
///
/// Builds must be deterministic: the same inputs give the same bitstream.
pub trait DesignBuilder: Sync {
    fn build(
        &self,
        device: Device,
        template: &Path,
        subst: &Substitutions,
    ) -> Result<Bitstream, BuildError>;
}

/// Builds designs with Lattice Diamond: `ncl2ncd` then `bitgen`, in a scratch directory.
pub struct DiamondBuilder<'a> {
    pub tc: &'a Toolchain,
    pub verbose: bool,
}

impl<'a> DiamondBuilder<'a> {
    pub fn new(tc: &'a Toolchain, verbose: bool) -> Self {
        DiamondBuilder { tc, verbose }
    }
}

/// The device header keys every template may use, on top of the caller's context.
pub fn device_context(device: Device, subst: &Substitutions) -> Substitutions {
    let mut res = subst.clone();
    for (k, v) in [
        ("arch", device.arch()),
        ("device", device.name()),
        ("package", device.package()),
        ("performance", device.performance()),
    ] {
        res.insert(k.to_string(), v.to_string());
    }
    res
}

impl DesignBuilder for DiamondBuilder<'_> {
    fn build(
        &self,
        device: Device,
        template: &Path,
        subst: &Substitutions,
    ) -> Result<Bitstream, BuildError> {
        let text = Template::from_file(template)?.substitute(&device_context(device, subst))?;
        let dir = tempfile::Builder::new()
            .prefix("prjcombine_ecp5_dsp")
            .tempdir()
            .map_err(|e| BuildError::Toolchain(format!("creating scratch directory: {e}")))?;
        std::fs::write(dir.path().join("top.ncl"), text)
            .map_err(|e| BuildError::Toolchain(format!("writing top.ncl: {e}")))?;
        let tc_err = |e: simple_error::SimpleError| BuildError::Toolchain(e.to_string());
        self.tc
            .run("ncl2ncd", &["top.ncl"], dir.path(), self.verbose)
            .map_err(tc_err)?;
        self.tc
            .run(
                "bitgen",
                &["-d", "-w", "-a", "top.ncd", "top.rbt"],
                dir.path(),
                self.verbose,
            )
            .map_err(tc_err)?;
        let data = std::fs::read_to_string(dir.path().join("top.rbt"))
            .map_err(|e| BuildError::Toolchain(format!("reading top.rbt: {e}")))?;
        Bitstream::parse_ascii(&data).map_err(|e| BuildError::Toolchain(format!("top.rbt: {e}")))
    }
}
