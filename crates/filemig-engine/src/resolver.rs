//! Backend resolution.
//!
//! Maps each file-bearing attribute of a record type to a source and a
//! destination backend spec. Resolution is pure: it reads only the
//! configuration handed in at construction and performs no I/O.
//!
//! Per attribute `"recordtype.attribute"`, each side resolves to its exact
//! override when one is configured, otherwise to that side's default.
//! `Forward` copies old side to new side; `Reverse` swaps the sides
//! wholesale.

use std::collections::BTreeMap;

use filemig_core::{BackendSpec, MigrateError, MigrateResult, MigrationConfig, RecordType};

/// Migration direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Old storage to new storage (`--to-new`).
    Forward,
    /// New storage back to old storage (the default).
    Reverse,
}

/// Resolved source/destination pair for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendBinding {
    pub source: BackendSpec,
    pub destination: BackendSpec,
}

pub struct BackendResolver<'a> {
    config: &'a MigrationConfig,
    direction: Direction,
}

impl<'a> BackendResolver<'a> {
    pub fn new(config: &'a MigrationConfig, direction: Direction) -> Self {
        BackendResolver { config, direction }
    }

    /// Resolve bindings for every file-bearing attribute of `record_type`.
    ///
    /// Fails with a configuration error when the type has no file-bearing
    /// attributes or a side has neither an override nor a default; callers
    /// treat this as a per-label skip, not a hard failure.
    pub fn resolve(
        &self,
        record_type: &RecordType,
    ) -> MigrateResult<BTreeMap<String, BackendBinding>> {
        if record_type.file_attributes.is_empty() {
            return Err(MigrateError::Config(format!(
                "record type {} has no file-bearing attributes",
                record_type.name
            )));
        }

        let mut bindings = BTreeMap::new();
        for attribute in &record_type.file_attributes {
            let field_path = format!("{}.{}", record_type.name, attribute);

            let old_side = self.side(
                &field_path,
                &self.config.old_overrides,
                self.config.old_default.as_ref(),
                "old",
            )?;
            let new_side = self.side(
                &field_path,
                &self.config.new_overrides,
                self.config.new_default.as_ref(),
                "new",
            )?;

            let binding = match self.direction {
                Direction::Forward => BackendBinding {
                    source: old_side,
                    destination: new_side,
                },
                Direction::Reverse => BackendBinding {
                    source: new_side,
                    destination: old_side,
                },
            };

            tracing::debug!(
                field = %field_path,
                source = %binding.source,
                destination = %binding.destination,
                "resolved backend binding"
            );
            bindings.insert(attribute.clone(), binding);
        }

        Ok(bindings)
    }

    fn side(
        &self,
        field_path: &str,
        overrides: &std::collections::HashMap<String, BackendSpec>,
        default: Option<&BackendSpec>,
        side_name: &str,
    ) -> MigrateResult<BackendSpec> {
        if let Some(spec) = overrides.get(field_path) {
            return Ok(spec.clone());
        }
        default.cloned().ok_or_else(|| {
            MigrateError::Config(format!(
                "no {} backend configured for {} and no default set",
                side_name, field_path
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_type() -> RecordType {
        RecordType {
            name: "gallery.Photo".to_string(),
            file_attributes: vec!["image".to_string(), "thumbnails".to_string()],
        }
    }

    fn config() -> MigrationConfig {
        let mut config = MigrationConfig::with_defaults(
            BackendSpec::local("/old"),
            BackendSpec::local("/new"),
        );
        config.new_overrides.insert(
            "gallery.Photo.image".to_string(),
            "s3://assets/photos".parse().unwrap(),
        );
        config
    }

    #[test]
    fn test_forward_resolution_with_override() {
        let config = config();
        let resolver = BackendResolver::new(&config, Direction::Forward);
        let bindings = resolver.resolve(&record_type()).unwrap();

        // image: new side comes from the override, old side from the default.
        assert_eq!(bindings["image"].source, BackendSpec::local("/old"));
        assert_eq!(
            bindings["image"].destination,
            "s3://assets/photos".parse().unwrap()
        );

        // thumbnails: defaults on both sides.
        assert_eq!(bindings["thumbnails"].source, BackendSpec::local("/old"));
        assert_eq!(bindings["thumbnails"].destination, BackendSpec::local("/new"));
    }

    #[test]
    fn test_reverse_swaps_sides() {
        let config = config();
        let forward = BackendResolver::new(&config, Direction::Forward)
            .resolve(&record_type())
            .unwrap();
        let reverse = BackendResolver::new(&config, Direction::Reverse)
            .resolve(&record_type())
            .unwrap();

        for attribute in ["image", "thumbnails"] {
            assert_eq!(forward[attribute].source, reverse[attribute].destination);
            assert_eq!(forward[attribute].destination, reverse[attribute].source);
        }
    }

    #[test]
    fn test_no_file_attributes_is_config_error() {
        let config = config();
        let resolver = BackendResolver::new(&config, Direction::Forward);
        let empty = RecordType {
            name: "gallery.Tag".to_string(),
            file_attributes: vec![],
        };
        assert!(matches!(
            resolver.resolve(&empty),
            Err(MigrateError::Config(_))
        ));
    }

    #[test]
    fn test_missing_default_is_config_error() {
        let mut config = config();
        config.old_default = None;
        let resolver = BackendResolver::new(&config, Direction::Forward);
        // thumbnails has no old-side override, so the missing default is fatal.
        assert!(matches!(
            resolver.resolve(&record_type()),
            Err(MigrateError::Config(_))
        ));
    }
}
