use std::fmt::Display;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PrimitiveKind {
    Mult9,
    Alu24,
    Pradd9,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 3] = [
        PrimitiveKind::Mult9,
        PrimitiveKind::Alu24,
        PrimitiveKind::Pradd9,
    ];

    pub fn info(self) -> &'static PrimitiveInfo {
        match self {
            PrimitiveKind::Mult9 => &MULT9,
            PrimitiveKind::Alu24 => &ALU24,
            PrimitiveKind::Pradd9 => &PRADD9,
        }
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveKind::Mult9 => write!(f, "mult9"),
            PrimitiveKind::Alu24 => write!(f, "alu24"),
            PrimitiveKind::Pradd9 => write!(f, "pradd9"),
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown primitive {s:?}"))
    }
}

/// Static description of one DSP primitive type.
///
/// Everything that differs between primitives lives here: the site naming, where the
/// instances sit within a DSP block group, and which fields the primitive exposes.
/// Field value lists mirror the encodings Diamond accepts and are never discovered.
#[derive(Debug)]
pub struct PrimitiveInfo {
    pub kind: PrimitiveKind,
    /// Site name prefix, as in `MULT9_R13C4`.
    pub site: &'static str,
    /// Mode of an active instance; the `MODE` sweep toggles between `NONE` and this.
    pub mode: &'static str,
    pub cell_model: &'static str,
    /// (label index, column offset from the block group base) of each instance.
    pub instances: &'static [(u8, u8)],
    /// Registers with their own clock, clock enable and reset selection.
    pub registers: &'static [&'static str],
    /// Primitive-specific fields, swept after the common ones.
    pub fields: &'static [(&'static str, &'static [&'static str])],
}

pub const CLK_VALUES: &[&str] = &["NONE", "CLK0", "CLK1", "CLK2", "CLK3"];
pub const CE_VALUES: &[&str] = &["CE0", "CE1", "CE2", "CE3"];
pub const RST_VALUES: &[&str] = &["RST0", "RST1", "RST2", "RST3"];
pub const CLK_DIVIDERS: &[&str] = &["CLK0", "CLK1", "CLK2", "CLK3"];
pub const DIV_VALUES: &[&str] = &["ENABLED", "DISABLED"];
pub const GSR_VALUES: &[&str] = &["DISABLED", "ENABLED"];
pub const RESETMODE_VALUES: &[&str] = &["SYNC", "ASYNC"];

const BOOL_VALUES: &[&str] = &["FALSE", "TRUE"];

static MULT9: PrimitiveInfo = PrimitiveInfo {
    kind: PrimitiveKind::Mult9,
    site: "MULT9",
    mode: "MULT9X9D",
    cell_model: "MULT9X9D",
    instances: &[(0, 0), (1, 1)],
    registers: &["INPUTA", "INPUTB", "INPUTC", "PIPELINE", "OUTPUT"],
    fields: &[
        ("CAS_MATCH_REG", BOOL_VALUES),
        ("MULT_BYPASS", &["DISABLED", "ENABLED"]),
        (
            "SOURCEB_MODE",
            &["B_SHIFT", "C_SHIFT", "B_C_DYNAMIC", "HIGHSPEED"],
        ),
        ("HIGHSPEED_CLK", CLK_VALUES),
    ],
};

static ALU24: PrimitiveInfo = PrimitiveInfo {
    kind: PrimitiveKind::Alu24,
    site: "ALU24",
    mode: "ALU24B",
    cell_model: "ALU24B",
    instances: &[(3, 3), (7, 7)],
    registers: &["OUTPUT", "OPCODE_0", "OPCODE_1", "INPUTCFB"],
    fields: &[],
};

static PRADD9: PrimitiveInfo = PrimitiveInfo {
    kind: PrimitiveKind::Pradd9,
    site: "PRADD9",
    // Also the mode of every non-MODE sweep. Older PRADD9 fuzzers used plain "PRADD"
    // there, which disagrees with the MODE sweep's active value.
    mode: "PRADD9A",
    cell_model: "PRADD9",
    instances: &[(0, 0)],
    registers: &["INPUTA", "INPUTB", "INPUTC", "OPPRE"],
    fields: &[
        ("CAS_MATCH_REG", BOOL_VALUES),
        (
            "SOURCEA_MODE",
            &["A_SHIFT", "C_SHIFT", "A_C_DYNAMIC", "HIGHSPEED"],
        ),
        ("SOURCEB_MODE", &["SHIFT", "PARALLEL", "INTERNAL"]),
        ("FB_MUX", &["SHIFT", "SHIFT_BYPASS", "DISABLED"]),
        ("SYMMETRY_MODE", &["DIRECT", "INTERNAL"]),
        ("HIGHSPEED_CLK", CLK_VALUES),
    ],
};
