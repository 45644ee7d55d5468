//! Run configuration: match criteria, worker count and operation options.
//!
//! Configuration enters through [`RunConfigFile`], a loose serde struct read
//! from JSON (unknown keys are rejected) and overridden by command line flags.
//! [`RunConfigFile::into_run_config()`] validates it into an immutable
//! [`RunConfig`], which every operation receives explicitly. All checks
//! happen here, before any record is indexed or clustered.

use serde::Deserialize;
use std::path::Path;

use crate::{error::VarsetsError, io::InputFile, Position, MAX_POSITION};

pub const DEFAULT_MAX_NEIGHBOR_DISTANCE: Position = 10;

/// The criteria two calls must meet to be considered the same event.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCriteria {
    /// Inclusive window applied to each breakpoint independently.
    pub max_neighbor_distance: Position,
    /// Both breakpoints must individually be within the window.
    pub match_all_breakpoints: bool,
    /// Variant type classes must be identical.
    pub match_variant_types: bool,
    /// Interchromosomal translocation/breakend calls must match on both
    /// breakpoints even when `match_all_breakpoints` is off.
    pub match_both_positions: bool,
    /// Minimum size ratio of two insertions (0 disables).
    pub min_ins_size_overlap: f64,
    /// Minimum size ratio of two deletions (0 disables).
    pub min_del_size_overlap: f64,
    /// Pairs involving an SNV or MNV must sit at identical positions.
    pub exact_small_variant_positions: bool,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            max_neighbor_distance: DEFAULT_MAX_NEIGHBOR_DISTANCE,
            match_all_breakpoints: true,
            match_variant_types: true,
            match_both_positions: false,
            min_ins_size_overlap: 0.0,
            min_del_size_overlap: 0.0,
            exact_small_variant_positions: false,
        }
    }
}

impl MatchCriteria {
    /// Check value ranges and flag combinations.
    pub fn validate(&self) -> Result<(), VarsetsError> {
        if self.max_neighbor_distance > MAX_POSITION {
            return Err(VarsetsError::DistanceTooLarge(
                self.max_neighbor_distance.into(),
            ));
        }
        for (name, value) in [
            ("min_ins_size_overlap", self.min_ins_size_overlap),
            ("min_del_size_overlap", self.min_del_size_overlap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(VarsetsError::ThresholdOutOfRange(name, value));
            }
            if value > 0.0 && !self.match_variant_types {
                return Err(VarsetsError::ContradictoryCriteria(name));
            }
        }
        Ok(())
    }
}

/// Validated, immutable configuration for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub criteria: MatchCriteria,
    pub num_threads: usize,
    /// Minimum number of input collections a cluster must cover to be
    /// kept by intersect; `None` means all of them.
    pub min_collections: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            criteria: MatchCriteria::default(),
            num_threads: 1,
            min_collections: None,
        }
    }
}

impl RunConfig {
    pub fn new(criteria: MatchCriteria, num_threads: usize) -> Self {
        Self {
            criteria,
            num_threads,
            min_collections: None,
        }
    }

    pub fn validate(&self) -> Result<(), VarsetsError> {
        self.criteria.validate()?;
        if self.num_threads == 0 {
            return Err(VarsetsError::InvalidThreadCount(self.num_threads));
        }
        Ok(())
    }
}

/// The recognized configuration keys, each optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfigFile {
    pub max_neighbor_distance: Option<i64>,
    pub match_all_breakpoints: Option<bool>,
    pub match_variant_types: Option<bool>,
    pub match_both_positions: Option<bool>,
    pub min_ins_size_overlap: Option<f64>,
    pub min_del_size_overlap: Option<f64>,
    pub exact_small_variant_positions: Option<bool>,
    pub num_threads: Option<usize>,
    pub num_processes: Option<usize>,
    pub min_collections: Option<usize>,
}

impl RunConfigFile {
    pub fn from_json_str(json: &str) -> Result<Self, VarsetsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file (optionally gzip-compressed).
    pub fn from_path(filepath: impl AsRef<Path>) -> Result<Self, VarsetsError> {
        let reader = InputFile::new(filepath.as_ref()).reader()?;
        Ok(serde_json::from_reader(reader)?)
    }

    /// Apply every value set in `overrides` on top of this configuration.
    pub fn merge(self, overrides: RunConfigFile) -> RunConfigFile {
        RunConfigFile {
            max_neighbor_distance: overrides.max_neighbor_distance.or(self.max_neighbor_distance),
            match_all_breakpoints: overrides.match_all_breakpoints.or(self.match_all_breakpoints),
            match_variant_types: overrides.match_variant_types.or(self.match_variant_types),
            match_both_positions: overrides.match_both_positions.or(self.match_both_positions),
            min_ins_size_overlap: overrides.min_ins_size_overlap.or(self.min_ins_size_overlap),
            min_del_size_overlap: overrides.min_del_size_overlap.or(self.min_del_size_overlap),
            exact_small_variant_positions: overrides
                .exact_small_variant_positions
                .or(self.exact_small_variant_positions),
            num_threads: overrides.num_threads.or(self.num_threads),
            num_processes: overrides.num_processes.or(self.num_processes),
            min_collections: overrides.min_collections.or(self.min_collections),
        }
    }

    /// Validate into a [`RunConfig`], filling unset keys with defaults.
    pub fn into_run_config(self) -> Result<RunConfig, VarsetsError> {
        let defaults = MatchCriteria::default();
        let max_neighbor_distance = match self.max_neighbor_distance {
            None => defaults.max_neighbor_distance,
            Some(d) if d < 0 => return Err(VarsetsError::NegativeDistance(d)),
            Some(d) if d > MAX_POSITION as i64 => return Err(VarsetsError::DistanceTooLarge(d)),
            Some(d) => d as Position,
        };
        let num_threads = match (self.num_threads, self.num_processes) {
            (Some(t), Some(p)) if t != p => {
                return Err(VarsetsError::ConflictingThreadCounts(t, p))
            }
            (Some(t), _) | (None, Some(t)) => t,
            (None, None) => 1,
        };
        let config = RunConfig {
            criteria: MatchCriteria {
                max_neighbor_distance,
                match_all_breakpoints: self
                    .match_all_breakpoints
                    .unwrap_or(defaults.match_all_breakpoints),
                match_variant_types: self
                    .match_variant_types
                    .unwrap_or(defaults.match_variant_types),
                match_both_positions: self
                    .match_both_positions
                    .unwrap_or(defaults.match_both_positions),
                min_ins_size_overlap: self
                    .min_ins_size_overlap
                    .unwrap_or(defaults.min_ins_size_overlap),
                min_del_size_overlap: self
                    .min_del_size_overlap
                    .unwrap_or(defaults.min_del_size_overlap),
                exact_small_variant_positions: self
                    .exact_small_variant_positions
                    .unwrap_or(defaults.exact_small_variant_positions),
            },
            num_threads,
            min_collections: self.min_collections,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfigFile::default().into_run_config().unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_from_json() {
        let file = RunConfigFile::from_json_str(
            r#"{"max_neighbor_distance": 500, "match_all_breakpoints": false, "num_processes": 4}"#,
        )
        .unwrap();
        let config = file.into_run_config().unwrap();
        assert_eq!(config.criteria.max_neighbor_distance, 500);
        assert!(!config.criteria.match_all_breakpoints);
        assert!(config.criteria.match_variant_types);
        assert_eq!(config.num_threads, 4);
    }

    #[test]
    fn test_unknown_key_is_configuration_error() {
        let err = RunConfigFile::from_json_str(r#"{"max_distance": 5}"#).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_negative_distance() {
        let file = RunConfigFile {
            max_neighbor_distance: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            file.into_run_config(),
            Err(VarsetsError::NegativeDistance(-1))
        ));
    }

    #[test]
    fn test_zero_threads() {
        let file = RunConfigFile {
            num_threads: Some(0),
            ..Default::default()
        };
        assert!(file.into_run_config().unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_conflicting_thread_counts() {
        let file = RunConfigFile {
            num_threads: Some(2),
            num_processes: Some(3),
            ..Default::default()
        };
        assert!(file.into_run_config().is_err());
    }

    #[test]
    fn test_contradictory_size_overlap() {
        let file = RunConfigFile {
            match_variant_types: Some(false),
            min_del_size_overlap: Some(0.5),
            ..Default::default()
        };
        assert!(matches!(
            file.into_run_config(),
            Err(VarsetsError::ContradictoryCriteria("min_del_size_overlap"))
        ));

        let criteria = MatchCriteria {
            min_ins_size_overlap: 1.5,
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = RunConfigFile {
            max_neighbor_distance: Some(100),
            num_threads: Some(2),
            ..Default::default()
        };
        let overrides = RunConfigFile {
            max_neighbor_distance: Some(5),
            ..Default::default()
        };
        let merged = base.merge(overrides);
        assert_eq!(merged.max_neighbor_distance, Some(5));
        assert_eq!(merged.num_threads, Some(2));
    }
}
