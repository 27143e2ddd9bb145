use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::BuildError;
use crate::sweep::Substitutions;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(?:\$|\{([A-Za-z_][A-Za-z0-9_]*)\})").unwrap());

/// Design text with `${name}` placeholders. `$$` stands for a literal `$`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    pub name: String,
    text: String,
}

impl Template {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Template {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BuildError::Template(format!("{}: {e}", path.display())))?;
        Ok(Template::new(path.display().to_string(), text))
    }

    pub fn placeholders(&self) -> BTreeSet<&str> {
        PLACEHOLDER_RE
            .captures_iter(&self.text)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    pub fn substitute(&self, subst: &Substitutions) -> Result<String, BuildError> {
        let mut res = String::with_capacity(self.text.len());
        let mut pos = 0;
        for cap in PLACEHOLDER_RE.captures_iter(&self.text) {
            let whole = cap.get(0).unwrap();
            res.push_str(&self.text[pos..whole.start()]);
            match cap.get(1) {
                None => res.push('$'),
                Some(name) => match subst.get(name.as_str()) {
                    Some(val) => res.push_str(val),
                    None => {
                        return Err(BuildError::Template(format!(
                            "{}: no value for ${{{}}}",
                            self.name,
                            name.as_str()
                        )));
                    }
                },
            }
            pos = whole.end();
        }
        res.push_str(&self.text[pos..]);
        Ok(res)
    }
}
