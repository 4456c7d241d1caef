//! Core [`RuleLoader`] struct and the [`init`] entry point.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use namedev_core::{Config, ParseConfig};
use tracing::info;

use crate::registry::{Registry, RuleSet};

use super::error::{ConfigFile, LoadError, LoadReport, Result};
use super::lines::drive;
use super::naming::parse_rule_line;
use super::permissions::parse_permission_line;

/// Streams config files into a [`Registry`].
///
/// The naming-rule file and the permissions file may be loaded in any order
/// and any number of times; every pass merges into the same registry. Call
/// [`RuleLoader::finish`] to obtain the read-only [`RuleSet`].
pub struct RuleLoader {
    parse: ParseConfig,
    registry: Registry,
}

impl RuleLoader {
    pub fn new(parse: ParseConfig) -> Self {
        Self {
            parse,
            registry: Registry::new(),
        }
    }

    /// Load the naming-rule file at `path`.
    pub fn load_rules(&mut self, path: &Path) -> Result<LoadReport> {
        let reader = open(ConfigFile::Rules, path)?;
        self.load_rules_from(reader, path)
    }

    /// Load naming rules from any reader. `origin` labels the report and errors.
    pub fn load_rules_from<R: BufRead>(&mut self, reader: R, origin: &Path) -> Result<LoadReport> {
        let policy = self.parse.unnamed_rules;
        let report = drive(
            reader,
            LoadReport::new(ConfigFile::Rules, origin.to_path_buf()),
            &self.parse,
            &mut self.registry,
            |line| parse_rule_line(line, policy),
        )?;
        log_report(&report);
        Ok(report)
    }

    /// Load the permissions file at `path`.
    pub fn load_permissions(&mut self, path: &Path) -> Result<LoadReport> {
        let reader = open(ConfigFile::Permissions, path)?;
        self.load_permissions_from(reader, path)
    }

    /// Load permissions from any reader. `origin` labels the report and errors.
    pub fn load_permissions_from<R: BufRead>(
        &mut self,
        reader: R,
        origin: &Path,
    ) -> Result<LoadReport> {
        let report = drive(
            reader,
            LoadReport::new(ConfigFile::Permissions, origin.to_path_buf()),
            &self.parse,
            &mut self.registry,
            parse_permission_line,
        )?;
        log_report(&report);
        Ok(report)
    }

    /// Registry contents loaded so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn finish(self) -> RuleSet {
        self.registry.freeze()
    }
}

/// Result of a successful [`init`].
#[derive(Debug)]
pub struct Initialized {
    pub rules: RuleSet,
    pub rules_report: LoadReport,
    pub permissions_report: LoadReport,
}

/// Load the naming-rule file, then the permissions file, as configured.
///
/// The first fatal error is returned and nothing is published; lines that
/// fail to parse are only recorded in the reports.
pub fn init(config: &Config) -> Result<Initialized> {
    let mut loader = RuleLoader::new(config.parse.clone());
    let rules_report = loader.load_rules(&config.paths.rules_path())?;
    let permissions_report = loader.load_permissions(&config.paths.permissions_path())?;
    let rules = loader.finish();
    info!(records = rules.len(), "rule registry initialized");
    Ok(Initialized {
        rules,
        rules_report,
        permissions_report,
    })
}

fn open(file: ConfigFile, path: &Path) -> Result<BufReader<File>> {
    info!(path = %path.display(), "opening {} file", file);
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::ConfigUnavailable {
            file,
            path: path.to_path_buf(),
            source,
        })
}

fn log_report(report: &LoadReport) {
    info!(
        file = %report.file,
        path = %report.path.display(),
        merged = report.merged(),
        skipped = report.skipped(),
        failed = report.failed(),
        "loaded {} file",
        report.file
    );
}
