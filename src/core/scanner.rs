// src/core/scanner.rs

//! Wrapper around an embedded static-analysis engine.
//!
//! The engine is an external collaborator: this module only assembles its
//! properties, triggers a run and reports where the engine writes its report.

use crate::core::config::{ConfigSource, GeneralOption, read_properties};
use crate::core::error::ScannerError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

pub const OUTPUT_DIR: &str = ".sonar";
pub const OUTPUT_FILE: &str = "sonar-report.json";

/// Property keys understood by the analysis engine.
pub mod sonar_properties {
    pub const INCLUDE_FILES: &str = "sonar.inclusions";
    pub const SCM_ENABLED: &str = "sonar.scm.enabled";
    pub const SCM_STAT_ENABLED: &str = "sonar.scm-stats.enabled";
    pub const ISSUEASSIGN_PLUGIN: &str = "issueassignplugin.enabled";
    pub const EXPORT_PATH: &str = "sonar.report.export.path";
    pub const VERBOSE: &str = "sonar.verbose";
    pub const WORKDIR: &str = "sonar.working.directory";
    pub const PROJECT_BASEDIR: &str = "sonar.projectBaseDir";
    pub const SOURCES: &str = "sonar.sources";
}

pub type EngineResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// An embedded analysis engine driven through global properties.
pub trait AnalysisEngine {
    fn add_global_properties(&mut self, properties: &BTreeMap<String, String>);
    fn start(&mut self) -> EngineResult;
    fn execute(&mut self, task_properties: &BTreeMap<String, String>) -> EngineResult;
}

pub struct SonarScanner<'a, E, C> {
    files: Vec<String>,
    engine: E,
    configuration: &'a C,
}

impl<'a, E: AnalysisEngine, C: ConfigSource> SonarScanner<'a, E, C> {
    pub fn new(files: Vec<String>, engine: E, configuration: &'a C) -> Self {
        Self { files, engine, configuration }
    }

    /// Loads the base property files named by `sonar.configurationFiles`.
    pub fn load_base_properties(&self) -> Result<BTreeMap<String, String>, ScannerError> {
        let mut properties = BTreeMap::new();
        let files = self.configuration.option(GeneralOption::SonarProperties).unwrap_or_default();
        for entry in files.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let path = PathBuf::from(entry);
            let absolute = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
            info!(path = %absolute.display(), "Loading analysis properties.");
            properties.extend(read_properties(&path)?);
        }
        Ok(properties)
    }

    /// Adds the fixed properties every run needs.
    pub fn set_additional_properties(&self, properties: &mut BTreeMap<String, String>) {
        use sonar_properties::*;

        let verbose = self.configuration.option(GeneralOption::SonarVerbose).unwrap_or_default();
        let fixed = [
            (INCLUDE_FILES, self.files.join(", ")),
            (SCM_ENABLED, "false".to_string()),
            (SCM_STAT_ENABLED, "false".to_string()),
            (ISSUEASSIGN_PLUGIN, "false".to_string()),
            (EXPORT_PATH, OUTPUT_FILE.to_string()),
            (VERBOSE, verbose),
            (WORKDIR, OUTPUT_DIR.to_string()),
            (PROJECT_BASEDIR, ".".to_string()),
            (SOURCES, ".".to_string()),
        ];
        for (key, value) in fixed {
            properties.insert(key.to_string(), value);
        }
    }

    /// Runs the engine and returns the path of the report it writes.
    pub fn run(&mut self) -> Result<PathBuf, ScannerError> {
        let mut properties = self.load_base_properties()?;
        self.set_additional_properties(&mut properties);

        self.engine.add_global_properties(&properties);
        info!(?properties, "Analysis engine configuration.");

        self.engine.start().map_err(ScannerError::Engine)?;
        self.engine.execute(&BTreeMap::new()).map_err(ScannerError::Engine)?;

        let report = report_path();
        debug!(report = %report.display(), "Analysis finished.");
        Ok(report)
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}

pub fn report_path() -> PathBuf {
    PathBuf::from(OUTPUT_DIR).join(OUTPUT_FILE)
}
