//! hz-job: job configuration file format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_job};

pub type JobResult<T> = Result<T, JobError>;

#[derive(thiserror::Error, Debug)]
pub enum JobError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> JobResult<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let job: JobConfig = serde_yaml::from_str(&content)?;
    validate_job(&job)?;
    Ok(job)
}

pub fn save_yaml(path: &std::path::Path, job: &JobConfig) -> JobResult<()> {
    validate_job(job)?;
    let content = serde_yaml::to_string(job)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a job by file extension: `.json` as JSON, anything else as YAML.
pub fn load_job(path: &std::path::Path) -> JobResult<JobConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}

pub fn load_json(path: &std::path::Path) -> JobResult<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let job: JobConfig = serde_json::from_str(&content)?;
    validate_job(&job)?;
    Ok(job)
}
