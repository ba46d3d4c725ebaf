//! End-to-end generation
//!
//! Loads a model once and derives both artifacts. Either both are produced
//! or the run fails; nothing is written on failure.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use xmigen_core::{Config, ModelError};
use xmigen_xmi::load_model;
use crate::instance::{derive_instance_with, InstanceOptions};
use crate::metadata::{derive_metadata_with, MetadataOptions};

/// Formatting options for both artifacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Instance document formatting
    pub instance: InstanceOptions,

    /// Metadata document formatting
    pub metadata: MetadataOptions,
}

impl PipelineOptions {
    /// Take formatting options from the config
    pub fn from_config(config: &Config) -> Self {
        Self {
            instance: InstanceOptions { indent: config.instance_indent },
            metadata: MetadataOptions { indent: config.json_indent },
        }
    }
}

/// The two generated documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Sample XML instance (empty when the model has no root)
    pub instance: String,

    /// JSON metadata
    pub metadata: String,
}

impl Artifacts {
    /// Write both documents into `dir`, creating it when missing
    ///
    /// Both are staged in temporary files next to their targets and only
    /// then moved into place, so a failed write leaves neither file behind.
    /// Returns the paths written, instance first.
    pub fn write_to(
        &self,
        dir: &Path,
        instance_file: &str,
        metadata_file: &str,
    ) -> Result<(PathBuf, PathBuf), std::io::Error> {
        std::fs::create_dir_all(dir)?;

        let instance_path = dir.join(instance_file);
        let metadata_path = dir.join(metadata_file);

        let instance = stage(&instance_path, &self.instance)?;
        let metadata = stage(&metadata_path, &self.metadata)?;

        instance.persist(&instance_path).map_err(|e| e.error)?;
        if let Err(e) = metadata.persist(&metadata_path) {
            if let Err(cleanup) = std::fs::remove_file(&instance_path) {
                tracing::warn!(path = %instance_path.display(), error = %cleanup, "failed to remove partial output");
            }
            return Err(e.error);
        }

        Ok((instance_path, metadata_path))
    }
}

/// Write `contents` to a temporary file in the target's directory
fn stage(target: &Path, contents: &str) -> Result<NamedTempFile, std::io::Error> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Model-to-artifacts pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    /// Create a pipeline
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Run on document text
    pub fn run(&self, text: &str) -> Result<Artifacts, ModelError> {
        let classes = load_model(text)?;

        let instance = derive_instance_with(&classes, self.options.instance)?;
        let metadata = derive_metadata_with(&classes, self.options.metadata)?;

        tracing::info!(
            classes = classes.len(),
            instance_bytes = instance.len(),
            metadata_bytes = metadata.len(),
            "generated artifacts"
        );

        Ok(Artifacts { instance, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"<Model>
        <Class name="Project" isRoot="true"/>
        <Class name="Task"><Attribute name="title" type="string"/></Class>
        <Aggregation source="Task" target="Project" sourceMultiplicity="1" targetMultiplicity="0..*"/>
    </Model>"#;

    #[test]
    fn run_produces_both_artifacts() {
        let artifacts = Pipeline::default().run(MODEL).unwrap();

        assert_eq!(artifacts.instance, "<Project><Task><title>string</title></Task></Project>");
        assert!(artifacts.metadata.starts_with("[\n    {\n        \"class\": \"Task\""));
    }

    #[test]
    fn missing_root_fails_the_whole_run() {
        let err = Pipeline::default()
            .run(r#"<Model><Class name="Task"/></Model>"#)
            .unwrap_err();

        assert_eq!(err, ModelError::RootRequired);
    }

    #[test]
    fn options_from_config() {
        let mut config = Config::default();
        config.instance_indent = Some(2);
        config.json_indent = 2;

        let options = PipelineOptions::from_config(&config);
        assert_eq!(options.instance.indent, Some(2));
        assert_eq!(options.metadata.indent, 2);
    }

    #[test]
    fn write_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let artifacts = Pipeline::default().run(MODEL).unwrap();

        let (instance_path, metadata_path) = artifacts.write_to(&out, "config.xml", "meta.json").unwrap();

        assert_eq!(instance_path, out.join("config.xml"));
        assert_eq!(std::fs::read_to_string(instance_path).unwrap(), artifacts.instance);
        assert_eq!(std::fs::read_to_string(metadata_path).unwrap(), artifacts.metadata);
    }

    #[test]
    fn failed_write_leaves_no_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        // A directory where the metadata file should go makes the final move fail
        std::fs::create_dir_all(out.join("meta.json")).unwrap();
        let artifacts = Pipeline::default().run(MODEL).unwrap();

        assert!(artifacts.write_to(&out, "config.xml", "meta.json").is_err());

        assert!(!out.join("config.xml").exists());
        let leftovers: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("meta.json")]);
    }

    #[test]
    fn rewrite_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Pipeline::default().run(MODEL).unwrap();
        std::fs::write(dir.path().join("config.xml"), "stale").unwrap();

        artifacts.write_to(dir.path(), "config.xml", "meta.json").unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("config.xml")).unwrap(),
            artifacts.instance
        );
    }
}
