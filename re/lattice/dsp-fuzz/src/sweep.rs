use std::collections::BTreeMap;

use crate::device::PrimitiveInstance;
use crate::error::Error;
use crate::prim::{
    CE_VALUES, CLK_DIVIDERS, CLK_VALUES, DIV_VALUES, GSR_VALUES, PrimitiveInfo, PrimitiveKind,
    RESETMODE_VALUES, RST_VALUES,
};

/// Template placeholder name → replacement text.
pub type Substitutions = BTreeMap<String, String>;

/// One configurable field of a primitive and the closed set of values it is swept over.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldSweep {
    pub field: String,
    pub values: Vec<&'static str>,
    /// Set only on the `MODE` sweep: its `NONE` value removes the instantiation altogether
    /// rather than setting an attribute on it.
    pub structural: bool,
}

/// The parts of a substitution context that do not depend on the swept field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Nominal {
    pub loc: String,
    pub mode: &'static str,
    pub cell_model: &'static str,
}

impl Nominal {
    pub fn new(inst: &PrimitiveInstance) -> Self {
        let info = inst.kind.info();
        Nominal {
            loc: inst.loc.clone(),
            mode: info.mode,
            cell_model: info.cell_model,
        }
    }
}

impl FieldSweep {
    fn new(field: impl Into<String>, values: &[&'static str]) -> Self {
        FieldSweep {
            field: field.into(),
            values: values.to_vec(),
            structural: false,
        }
    }

    /// Substitution context for one candidate value. Every field other than this one is
    /// left at its nominal value, which means it does not appear in `settings` at all.
    pub fn context(&self, nominal: &Nominal, value: &str) -> Result<Substitutions, Error> {
        if !self.values.iter().any(|&v| v == value) {
            return Err(Error::UnknownValue {
                field: self.field.clone(),
                value: value.to_string(),
            });
        }
        let (mode, settings, comment) = if self.structural {
            let comment = if value == "NONE" { "//" } else { "" };
            (value.to_string(), String::new(), comment)
        } else {
            (
                nominal.mode.to_string(),
                format!("{}={value}", self.field),
                "",
            )
        };
        Ok(Substitutions::from([
            ("loc".to_string(), nominal.loc.clone()),
            ("mode".to_string(), mode),
            ("cmodel".to_string(), nominal.cell_model.to_string()),
            ("settings".to_string(), settings),
            ("comment".to_string(), comment.to_string()),
        ]))
    }

    /// Checks the sweep is usable: a closed set of at least two distinct values.
    pub fn validate(&self) -> Result<(), Error> {
        let malformed = |reason: &str| Error::MalformedSweep {
            field: self.field.clone(),
            reason: reason.to_string(),
        };
        if self.values.len() < 2 {
            return Err(malformed("fewer than two values"));
        }
        for (i, value) in self.values.iter().enumerate() {
            if self.values[..i].contains(value) {
                return Err(malformed("duplicate value"));
            }
        }
        if self.structural && !self.values.contains(&"NONE") {
            return Err(malformed("structural sweep without NONE"));
        }
        Ok(())
    }
}

fn sweeps_from_info(info: &PrimitiveInfo) -> Vec<FieldSweep> {
    let mut res = vec![FieldSweep {
        field: "MODE".into(),
        values: vec!["NONE", info.mode],
        structural: true,
    }];
    for reg in info.registers {
        res.push(FieldSweep::new(format!("REG_{reg}_CLK"), CLK_VALUES));
        res.push(FieldSweep::new(format!("REG_{reg}_CE"), CE_VALUES));
        res.push(FieldSweep::new(format!("REG_{reg}_RST"), RST_VALUES));
    }
    for clk in CLK_DIVIDERS {
        res.push(FieldSweep::new(format!("{clk}_DIV"), DIV_VALUES));
    }
    res.push(FieldSweep::new("GSR", GSR_VALUES));
    res.push(FieldSweep::new("RESETMODE", RESETMODE_VALUES));
    for &(field, values) in info.fields {
        res.push(FieldSweep::new(field, values));
    }
    res
}

/// All field sweeps of a primitive type, in a fixed order.
pub fn sweeps_for(kind: PrimitiveKind) -> Vec<FieldSweep> {
    sweeps_from_info(kind.info())
}
