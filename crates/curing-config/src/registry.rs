// ============================================================================
// Module: Template & Specification Registries
// Description: Loads templates and specifications from an on-disk directory
//              tree into the shared model types.
// Purpose: Turn YAML documents into `curing_core::model` values without a
//          parallel on-disk schema, since the model types already derive
//          `Deserialize` with field names close to the wire format.
// Dependencies: curing-core, serde, serde_yaml, tracing
// ============================================================================

//! Loads templates and specifications from an on-disk directory tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;

use curing_core::identifiers::SpecificationId;
use curing_core::identifiers::TemplateId;
use curing_core::model::CalculationDef;
use curing_core::model::ParamValue;
use curing_core::model::RuleDef;
use curing_core::model::Specification;
use curing_core::model::StageDef;
use curing_core::model::Template;
use curing_core::model::TemplateBody;
use curing_core::model::TemplateKind;

use crate::error::RegistryError;

const CALCULATION_TEMPLATES_FILE: &str = "calculation_templates.yaml";
const RULE_TEMPLATES_FILE: &str = "rule_templates.yaml";
const STAGE_TEMPLATES_FILE: &str = "stage_templates.yaml";
const INDEX_FILE: &str = "index.yaml";
const RULES_FILE: &str = "rules.yaml";
const STAGES_FILE: &str = "stages.yaml";
const CALCULATIONS_FILE: &str = "calculations.yaml";
const METADATA_FILE: &str = "specification.yaml";

/// One entry in a `*_templates.yaml` document.
///
/// Accepts `formula` or `condition` as aliases for the body text and
/// `sensors` as an alias for `sensor_placeholders`, matching whichever
/// vocabulary reads naturally for the template's kind; the kind itself is
/// implied by which file the entry was read from, not carried in the
/// document.
#[derive(Debug, Deserialize)]
struct TemplateEntry {
    id: TemplateId,
    #[serde(default, alias = "formula", alias = "condition")]
    body: Option<String>,
    #[serde(default, alias = "sensors")]
    sensor_placeholders: Vec<String>,
    #[serde(default)]
    parameters: BTreeMap<String, ParamValue>,
}

impl TemplateEntry {
    fn into_template(self, kind: TemplateKind) -> Template {
        Template {
            kind,
            id: self.id,
            body: self.body.map_or(TemplateBody::None, TemplateBody::Formula),
            sensor_placeholders: self.sensor_placeholders,
            parameters: self.parameters,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TemplatesDocument {
    #[serde(default)]
    templates: Vec<TemplateEntry>,
}

/// Templates loaded from a root directory and its immediate subdirectories
/// (one subdirectory per process family).
///
/// A subdirectory entry overrides a root-level entry of the same id and
/// kind; this lets a process family narrow or replace a shared default
/// without editing the shared file.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    calculations: BTreeMap<TemplateId, Template>,
    rules: BTreeMap<TemplateId, Template>,
    stages: BTreeMap<TemplateId, Template>,
}

impl TemplateRegistry {
    /// Loads every template under `templates_root`.
    ///
    /// Root-level `*_templates.yaml` files are read first; then each
    /// immediate subdirectory is read in name order, each overriding
    /// same-id entries already loaded.
    ///
    /// # Errors
    /// Returns [`RegistryError::Io`] or [`RegistryError::Parse`] if a
    /// document cannot be read or does not parse as YAML.
    pub fn load(templates_root: &Path) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        registry.load_family_dir(templates_root)?;

        if templates_root.is_dir() {
            let mut family_dirs: Vec<PathBuf> = fs::read_dir(templates_root)
                .map_err(|source| io_error(templates_root, source))?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            family_dirs.sort();
            for dir in family_dirs {
                registry.load_family_dir(&dir)?;
            }
        }

        Ok(registry)
    }

    fn load_family_dir(&mut self, dir: &Path) -> Result<(), RegistryError> {
        if let Some(document) = read_templates_document(dir, CALCULATION_TEMPLATES_FILE)? {
            for entry in document.templates {
                self.calculations.insert(entry.id.clone(), entry.into_template(TemplateKind::Calculation));
            }
        }
        if let Some(document) = read_templates_document(dir, RULE_TEMPLATES_FILE)? {
            for entry in document.templates {
                self.rules.insert(entry.id.clone(), entry.into_template(TemplateKind::Rule));
            }
        }
        if let Some(document) = read_templates_document(dir, STAGE_TEMPLATES_FILE)? {
            for entry in document.templates {
                self.stages.insert(entry.id.clone(), entry.into_template(TemplateKind::Stage));
            }
        }
        Ok(())
    }

    /// Looks up a template by kind and id.
    #[must_use]
    pub fn get_template(&self, kind: TemplateKind, id: &TemplateId) -> Option<&Template> {
        self.table(kind).get(id)
    }

    /// Lists the ids of every template of a given kind, in sorted order.
    #[must_use]
    pub fn list_templates(&self, kind: TemplateKind) -> Vec<&TemplateId> {
        self.table(kind).keys().collect()
    }

    const fn table(&self, kind: TemplateKind) -> &BTreeMap<TemplateId, Template> {
        match kind {
            TemplateKind::Calculation => &self.calculations,
            TemplateKind::Rule => &self.rules,
            TemplateKind::Stage => &self.stages,
        }
    }
}

fn read_templates_document(dir: &Path, filename: &str) -> Result<Option<TemplatesDocument>, RegistryError> {
    let path = dir.join(filename);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
    let document: TemplatesDocument = serde_yaml::from_str(&text).map_err(|source| parse_error(&path, source))?;
    tracing::debug!(path = %path.display(), count = document.templates.len(), "loaded template document");
    Ok(Some(document))
}

#[derive(Debug, Default, Deserialize)]
struct RulesDocument {
    #[serde(default)]
    rules: Vec<RuleDef>,
}

#[derive(Debug, Default, Deserialize)]
struct StagesDocument {
    #[serde(default)]
    stages: Vec<StageDef>,
}

#[derive(Debug, Default, Deserialize)]
struct CalculationsDocument {
    #[serde(default)]
    calculations: Vec<CalculationDef>,
}

#[derive(Debug, Default, Deserialize)]
struct SpecificationIndex {
    #[serde(default)]
    specifications: BTreeMap<String, SpecificationIndexEntry>,
}

#[derive(Debug, Deserialize)]
struct SpecificationIndexEntry {
    #[serde(default)]
    dir: Option<String>,
}

/// Specifications loaded on demand from a root directory, cached by id.
///
/// Mirrors the template registry's directory-of-documents shape but caches
/// lazily rather than eagerly, since a deployment may carry far more
/// specifications than a single run ever touches.
#[derive(Debug)]
pub struct SpecificationRegistry {
    specifications_root: PathBuf,
    cache: Mutex<BTreeMap<SpecificationId, Specification>>,
}

impl SpecificationRegistry {
    /// Creates a registry rooted at `specifications_root`. Loading is lazy;
    /// this never touches the filesystem.
    #[must_use]
    pub fn new(specifications_root: impl Into<PathBuf>) -> Self {
        Self { specifications_root: specifications_root.into(), cache: Mutex::new(BTreeMap::new()) }
    }

    /// Lists every specification id discoverable under the root: the keys
    /// of `index.yaml` when present, otherwise every immediate
    /// subdirectory name.
    ///
    /// # Errors
    /// Returns [`RegistryError::Io`] or [`RegistryError::Parse`] if
    /// `index.yaml` exists but cannot be read or parsed.
    pub fn list_specifications(&self) -> Result<Vec<SpecificationId>, RegistryError> {
        let index_path = self.specifications_root.join(INDEX_FILE);
        if index_path.is_file() {
            let text = fs::read_to_string(&index_path).map_err(|source| io_error(&index_path, source))?;
            let index: SpecificationIndex = serde_yaml::from_str(&text).map_err(|source| parse_error(&index_path, source))?;
            return Ok(index.specifications.into_keys().map(SpecificationId::new).collect());
        }

        if !self.specifications_root.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<SpecificationId> = fs::read_dir(&self.specifications_root)
            .map_err(|source| io_error(&self.specifications_root, source))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| path.file_name().map(|name| SpecificationId::new(name.to_string_lossy().into_owned())))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Loads (or returns the cached copy of) the specification named `id`.
    ///
    /// # Errors
    /// Returns [`RegistryError::SpecNotFound`] if no directory or index
    /// entry resolves `id`, or [`RegistryError::Io`]/[`RegistryError::Parse`]
    /// if one of its documents cannot be read or parsed.
    pub fn load_specification(&self, id: &SpecificationId) -> Result<Specification, RegistryError> {
        if let Some(cached) = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(id) {
            return Ok(cached.clone());
        }

        let dir = self.resolve_spec_dir(id)?;
        let specification = self.read_specification(id, &dir)?;

        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id.clone(), specification.clone());
        Ok(specification)
    }

    /// Drops every cached specification, forcing the next lookup to re-read
    /// from disk.
    pub fn reload(&self) {
        self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }

    fn resolve_spec_dir(&self, id: &SpecificationId) -> Result<PathBuf, RegistryError> {
        let index_path = self.specifications_root.join(INDEX_FILE);
        if index_path.is_file() {
            let text = fs::read_to_string(&index_path).map_err(|source| io_error(&index_path, source))?;
            let index: SpecificationIndex = serde_yaml::from_str(&text).map_err(|source| parse_error(&index_path, source))?;
            let entry = index
                .specifications
                .get(id.as_str())
                .ok_or_else(|| RegistryError::SpecNotFound { id: id.as_str().to_string() })?;
            let dir_name = entry.dir.clone().unwrap_or_else(|| id.as_str().to_string());
            return Ok(self.specifications_root.join(dir_name));
        }

        let dir = self.specifications_root.join(id.as_str());
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(RegistryError::SpecNotFound { id: id.as_str().to_string() })
        }
    }

    fn read_specification(&self, id: &SpecificationId, dir: &Path) -> Result<Specification, RegistryError> {
        let metadata_path = dir.join(METADATA_FILE);
        if metadata_path.is_file() {
            let text = fs::read_to_string(&metadata_path).map_err(|source| io_error(&metadata_path, source))?;
            let _: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|source| parse_error(&metadata_path, source))?;
        }

        let rules = read_document::<RulesDocument>(dir, RULES_FILE)?.map(|document| document.rules).unwrap_or_default();
        let stages = read_document::<StagesDocument>(dir, STAGES_FILE)?.map(|document| document.stages).unwrap_or_default();
        let calculations =
            read_document::<CalculationsDocument>(dir, CALCULATIONS_FILE)?.map(|document| document.calculations).unwrap_or_default();

        tracing::debug!(
            specification = %id,
            rules = rules.len(),
            stages = stages.len(),
            calculations = calculations.len(),
            "loaded specification"
        );

        Ok(Specification { id: Some(id.clone()), rules, stages, calculations })
    }
}

fn read_document<T>(dir: &Path, filename: &str) -> Result<Option<T>, RegistryError>
where
    T: for<'de> Deserialize<'de>,
{
    let path = dir.join(filename);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
    let document = serde_yaml::from_str(&text).map_err(|source| parse_error(&path, source))?;
    Ok(Some(document))
}

fn io_error(path: &Path, source: std::io::Error) -> RegistryError {
    RegistryError::Io { path: path.to_path_buf(), source }
}

fn parse_error(path: &Path, source: serde_yaml::Error) -> RegistryError {
    RegistryError::Parse { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    fn write(path: &Path, contents: &str) {
        let mut file = fs::File::create(path).expect("create fixture file");
        file.write_all(contents.as_bytes()).expect("write fixture contents");
    }

    #[test]
    fn loads_root_level_calculation_templates() {
        let dir = tempdir().expect("tempdir");
        write(
            &dir.path().join(CALCULATION_TEMPLATES_FILE),
            "templates:\n  - id: avg_temp\n    formula: \"AVG({sensor})\"\n    sensors: [sensor]\n",
        );
        let registry = TemplateRegistry::load(dir.path()).expect("load templates");
        let template = registry.get_template(TemplateKind::Calculation, &TemplateId::new("avg_temp")).expect("template present");
        assert_eq!(template.body, TemplateBody::Formula("AVG({sensor})".to_string()));
    }

    #[test]
    fn subdirectory_entry_overrides_root_entry_of_same_id() {
        let dir = tempdir().expect("tempdir");
        write(
            &dir.path().join(RULE_TEMPLATES_FILE),
            "templates:\n  - id: limit\n    condition: \"{value} < 100\"\n",
        );
        let family = dir.path().join("bagging");
        fs::create_dir(&family).expect("create family dir");
        write(&family.join(RULE_TEMPLATES_FILE), "templates:\n  - id: limit\n    condition: \"{value} < 50\"\n");

        let registry = TemplateRegistry::load(dir.path()).expect("load templates");
        let template = registry.get_template(TemplateKind::Rule, &TemplateId::new("limit")).expect("template present");
        assert_eq!(template.body, TemplateBody::Formula("{value} < 50".to_string()));
    }

    #[test]
    fn missing_specification_directory_is_reported() {
        let dir = tempdir().expect("tempdir");
        let registry = SpecificationRegistry::new(dir.path());
        let error = registry.load_specification(&SpecificationId::new("absent")).expect_err("must fail");
        assert!(matches!(error, RegistryError::SpecNotFound { .. }));
    }

    #[test]
    fn loads_specification_documents_from_its_directory() {
        let dir = tempdir().expect("tempdir");
        let spec_dir = dir.path().join("bag_b12");
        fs::create_dir(&spec_dir).expect("create spec dir");
        write(&spec_dir.join(RULES_FILE), "rules:\n  - id: r1\n    condition: \"x > 1\"\n");

        let registry = SpecificationRegistry::new(dir.path());
        let specification = registry.load_specification(&SpecificationId::new("bag_b12")).expect("load specification");
        assert_eq!(specification.rules.len(), 1);
        assert_eq!(specification.rules[0].id.as_str(), "r1");
    }

    #[test]
    fn reload_clears_the_cache() {
        let dir = tempdir().expect("tempdir");
        let spec_dir = dir.path().join("bag_b12");
        fs::create_dir(&spec_dir).expect("create spec dir");
        write(&spec_dir.join(RULES_FILE), "rules: []\n");

        let registry = SpecificationRegistry::new(dir.path());
        let id = SpecificationId::new("bag_b12");
        registry.load_specification(&id).expect("load specification");
        write(&spec_dir.join(RULES_FILE), "rules:\n  - id: r1\n    condition: \"x > 1\"\n");
        registry.reload();
        let specification = registry.load_specification(&id).expect("reload specification");
        assert_eq!(specification.rules.len(), 1);
    }
}
