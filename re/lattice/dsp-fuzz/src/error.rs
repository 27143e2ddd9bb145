use std::fmt::{self, Display, Formatter};

/// Failure of a single design build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The template itself is bad: unreadable, or references a placeholder the context lacks.
    Template(String),
    /// The vendor tools failed on an otherwise well-formed design.
    Toolchain(String),
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Template(msg) => write!(f, "template error: {msg}"),
            BuildError::Toolchain(msg) => write!(f, "toolchain error: {msg}"),
        }
    }
}

impl std::error::Error for BuildError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorClass {
    /// Nothing can run; abort the process.
    Configuration,
    /// Defect in the sweep model; fails the owning job.
    Authoring,
    /// Build or diff failure; fails the owning job.
    Toolchain,
}

#[derive(Debug)]
pub enum Error {
    UnsupportedDevice(String),
    Database(String),
    DatabaseAlreadyLoaded,
    DuplicateField {
        job: String,
        field: String,
    },
    UnknownValue {
        field: String,
        value: String,
    },
    MalformedSweep {
        field: String,
        reason: String,
    },
    Build {
        job: String,
        field: Option<String>,
        source: BuildError,
    },
    Fuzz {
        job: String,
        field: String,
        message: String,
    },
    Io(std::io::Error),
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::UnsupportedDevice(_) | Error::Database(_) | Error::DatabaseAlreadyLoaded => {
                ErrorClass::Configuration
            }
            Error::DuplicateField { .. }
            | Error::UnknownValue { .. }
            | Error::MalformedSweep { .. } => ErrorClass::Authoring,
            Error::Build {
                source: BuildError::Template(_),
                ..
            } => ErrorClass::Authoring,
            Error::Build { .. } | Error::Fuzz { .. } | Error::Io(_) => ErrorClass::Toolchain,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedDevice(dev) => write!(f, "unsupported device {dev:?}"),
            Error::Database(msg) => write!(f, "device database: {msg}"),
            Error::DatabaseAlreadyLoaded => write!(f, "device database loaded twice"),
            Error::DuplicateField { job, field } => {
                write!(f, "{job}: field {field} attributed twice")
            }
            Error::UnknownValue { field, value } => {
                write!(f, "{field}: {value:?} is not a legal value")
            }
            Error::MalformedSweep { field, reason } => {
                write!(f, "{field}: malformed sweep: {reason}")
            }
            Error::Build {
                job,
                field: Some(field),
                source,
            } => write!(f, "{job}: building {field}: {source}"),
            Error::Build {
                job,
                field: None,
                source,
            } => write!(f, "{job}: building baseline: {source}"),
            Error::Fuzz {
                job,
                field,
                message,
            } => write!(f, "{job}: fuzzing {field}: {message}"),
            Error::Io(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Build { source, .. } => Some(source),
            Error::Io(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildError, Error, ErrorClass};

    #[test]
    fn test_class() {
        assert_eq!(
            Error::UnsupportedDevice("LFE5U-45F".into()).class(),
            ErrorClass::Configuration
        );
        let dup = Error::DuplicateField {
            job: "MULT9_0".into(),
            field: "MULT9_0.GSR".into(),
        };
        assert_eq!(dup.class(), ErrorClass::Authoring);
        assert_eq!(dup.to_string(), "MULT9_0: field MULT9_0.GSR attributed twice");
        let tpl = Error::Build {
            job: "ALU24_3".into(),
            field: None,
            source: BuildError::Template("no value for ${loc}".into()),
        };
        assert_eq!(tpl.class(), ErrorClass::Authoring);
        let tc = Error::Build {
            job: "ALU24_3".into(),
            field: Some("ALU24_3.GSR".into()),
            source: BuildError::Toolchain("non-zero bitgen exit status".into()),
        };
        assert_eq!(tc.class(), ErrorClass::Toolchain);
        assert_eq!(
            tc.to_string(),
            "ALU24_3: building ALU24_3.GSR: toolchain error: non-zero bitgen exit status"
        );
    }
}
