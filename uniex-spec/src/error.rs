use smol_str::SmolStr;
use thiserror::Error;

/// Errors materialising a [`Spec`](crate::Spec) from its on-disk declarative form.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading spec file {path}: {error}")]
    Io {
        path: String,
        error: std::io::Error,
    },

    #[error("parsing spec: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(
        "spec format version {found} is newer than supported version {supported}: upgrade required"
    )]
    NewerThanSupported { found: u32, supported: u32 },
}

/// Structural validation failures raised at build time.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ValidateError {
    #[error("spec {spec}: {field} must not be empty")]
    EmptyField { spec: SmolStr, field: &'static str },

    #[error("spec {spec}: duplicate endpoint name {name}")]
    DuplicateEndpoint { spec: SmolStr, name: SmolStr },

    #[error("spec {spec}: endpoint name {name} is not a valid identifier")]
    InvalidEndpointName { spec: SmolStr, name: SmolStr },

    #[error("spec {spec}: endpoint {name} has an empty path")]
    EmptyEndpointPath { spec: SmolStr, name: SmolStr },

    #[error("spec {spec}: custom signing pattern declared without custom_module")]
    MissingCustomModule { spec: SmolStr },

    #[error("spec {spec}: spec_format_version must be a positive integer")]
    InvalidFormatVersion { spec: SmolStr },
}
