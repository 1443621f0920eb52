//! Route manifests.
//!
//! A manifest is a YAML or JSON file that describes an application's resources and the
//! documentation attached to each handler. Loading one or more manifests produces a
//! [`RouteTable`] the aggregator can walk, plus the optional `app` header that seeds
//! [`AutoDocConfig`].
//!
//! ```yaml
//! app:
//!   title: Math App
//!   default_tag: Math
//! resources:
//!   - path: /math/add
//!     endpoint: AddTwo_math
//!     handlers:
//!       get:
//!         summary: Add Endpoint
//!         parameter_schema:
//!           first_number: { type: float, required: true }
//!           second_number: { type: float, required: true }
//!         returns: float
//!       post: ~
//! ```
//!
//! A handler given as `~` (or with `documented: false`) is registered without documentation.
//! One marked `hidden: true` never appears in the document.

use crate::aggregator::AutoDocConfig;
use crate::error::{Error, Result};
use crate::routes::{HttpMethod, ParameterLocation, ParameterSpec, RouteDoc, RouteTable, Tag};
use crate::scanner::FileScanner;
use crate::schema_generator::FieldMap;
use crate::type_info::TypeInfo;
use anyhow::Context;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of one manifest file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub app: Option<AppSection>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

/// Application header of a manifest
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppSection {
    pub title: Option<String>,
    #[serde(alias = "version")]
    pub app_version: Option<String>,
    pub openapi_version: Option<String>,
    #[serde(default)]
    pub info: BTreeMap<String, Value>,
    pub default_tag: Option<String>,
    pub documented_verbs: Option<Vec<HttpMethod>>,
    pub always_document: Option<bool>,
}

/// One resource mounted at a path
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceEntry {
    pub path: String,
    /// Endpoint name; defaults to the path
    pub endpoint: Option<String>,
    #[serde(default)]
    pub handlers: BTreeMap<HttpMethod, Option<HandlerEntry>>,
}

/// Documentation of one handler
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HandlerEntry {
    #[serde(default = "default_documented")]
    pub documented: bool,
    /// Keep the handler out of the document entirely, even when undocumented handlers are
    /// included
    #[serde(default)]
    pub hidden: bool,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagEntry>,
    /// Explicit parameter schema; the signature is ignored when present
    pub parameter_schema: Option<BTreeMap<String, FieldEntry>>,
    /// Handler signature, in declaration order
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    /// Return annotation
    pub returns: Option<String>,
}

fn default_documented() -> bool {
    true
}

/// A tag given either by name or as a full tag object
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    Name(String),
    Full(Tag),
}

/// One field of an explicit parameter schema
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldEntry {
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<Value>,
    #[serde(default)]
    pub location: ParameterLocation,
}

/// One signature parameter
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    pub default: Option<Value>,
}

fn parse_type(type_name: Option<&str>) -> TypeInfo {
    type_name.map(TypeInfo::parse).unwrap_or_else(TypeInfo::empty)
}

impl From<TagEntry> for Tag {
    fn from(entry: TagEntry) -> Self {
        match entry {
            TagEntry::Name(name) => Tag::new(name),
            TagEntry::Full(tag) => tag,
        }
    }
}

impl FieldEntry {
    fn to_parameter_spec(&self, name: &str) -> ParameterSpec {
        let mut spec = ParameterSpec::new(name, parse_type(self.type_name.as_deref()))
            .location(self.location);
        spec.required = self.required;
        spec.description = self.description.clone();
        spec.default = self.default.clone();
        spec
    }
}

impl HandlerEntry {
    /// Documentation for this handler, `None` when it is registered undocumented or hidden
    pub fn to_route_doc(&self) -> Option<RouteDoc> {
        if self.hidden || !self.documented {
            return None;
        }

        let mut doc = RouteDoc::new();
        doc.summary = self.summary.clone();
        doc.description = self.description.clone();
        doc.tags = self.tags.iter().cloned().map(Tag::from).collect();

        if let Some(fields) = &self.parameter_schema {
            doc = doc.parameter_schema(FieldMap::new());
            for (name, field) in fields {
                doc = doc.parameter(field.to_parameter_spec(name));
            }
        }

        for param in &self.parameters {
            let type_info = parse_type(param.type_name.as_deref());
            doc = match &param.default {
                Some(default) => doc.param_with_default(&param.name, type_info, default.clone()),
                None => doc.param(&param.name, type_info),
            };
        }

        doc.returns = parse_type(self.returns.as_deref());
        Some(doc)
    }
}

impl AppSection {
    /// Overlay `other` on this section; values set in `other` win
    pub fn merge(&mut self, other: AppSection) {
        if other.title.is_some() {
            self.title = other.title;
        }
        if other.app_version.is_some() {
            self.app_version = other.app_version;
        }
        if other.openapi_version.is_some() {
            self.openapi_version = other.openapi_version;
        }
        if other.default_tag.is_some() {
            self.default_tag = other.default_tag;
        }
        if other.documented_verbs.is_some() {
            self.documented_verbs = other.documented_verbs;
        }
        if other.always_document.is_some() {
            self.always_document = other.always_document;
        }
        self.info.extend(other.info);
    }

    /// Apply this section to a configuration
    pub fn apply(&self, mut config: AutoDocConfig) -> AutoDocConfig {
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        if let Some(version) = &self.app_version {
            config.app_version = version.clone();
        }
        if let Some(version) = &self.openapi_version {
            config.openapi_version = version.clone();
        }
        if let Some(tag) = &self.default_tag {
            config.default_tag = Some(tag.clone());
        }
        if let Some(verbs) = &self.documented_verbs {
            config.documented_verbs = verbs.clone();
        }
        if let Some(always) = self.always_document {
            config.always_document = always;
        }
        config
            .info
            .extend(self.info.iter().map(|(k, v)| (k.clone(), v.clone())));
        config
    }
}

impl RouteManifest {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Mount every resource of this manifest on `table`, returning the number mounted
    pub fn register(&self, table: &mut RouteTable) -> Result<usize> {
        for entry in &self.resources {
            let endpoint = entry.endpoint.clone().unwrap_or_else(|| entry.path.clone());
            let resource = table.add_resource(entry.path.clone(), endpoint)?;

            for (method, handler) in &entry.handlers {
                if handler.as_ref().map(|h| h.hidden).unwrap_or(false) {
                    resource.hidden(*method);
                    continue;
                }
                match handler.as_ref().and_then(HandlerEntry::to_route_doc) {
                    Some(doc) => resource.documented(*method, doc),
                    None => resource.route(*method),
                };
            }
        }
        Ok(self.resources.len())
    }
}

/// Routes loaded from one or more manifests
#[derive(Debug, Clone, Default)]
pub struct LoadedRoutes {
    /// Merged application headers, in load order
    pub app: AppSection,
    pub table: RouteTable,
    /// Manifests that were loaded
    pub files: Vec<PathBuf>,
    /// Manifests skipped while loading a directory
    pub warnings: Vec<String>,
}

/// Reads manifest files into a route table.
pub struct ManifestLoader;

impl ManifestLoader {
    /// Parse one manifest file; `.json` files are read as JSON, everything else as YAML
    pub fn load_file(path: &Path) -> Result<RouteManifest> {
        debug!("Loading route manifest: {}", path.display());
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| Error::ManifestError {
            file: path.to_path_buf(),
            message,
        })
    }

    /// Parse several files, keeping going past failures
    pub fn load_files(paths: &[PathBuf]) -> Vec<Result<RouteManifest>> {
        paths.iter().map(|path| Self::load_file(path)).collect()
    }

    /// Add one manifest file to `loaded`
    fn add_file(loaded: &mut LoadedRoutes, path: &Path) -> Result<()> {
        let manifest = Self::load_file(path)?;

        // A manifest either mounts all of its resources or none of them
        let mut table = loaded.table.clone();
        manifest.register(&mut table).map_err(|e| Error::ManifestError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        loaded.table = table;
        if let Some(app) = manifest.app {
            loaded.app.merge(app);
        }
        loaded.files.push(path.to_path_buf());
        Ok(())
    }

    /// Load a single manifest file, or every manifest below a directory.
    ///
    /// A file given directly must load. Inside a directory, manifests that fail to parse or
    /// register are skipped with a warning.
    pub fn load_path(path: &Path) -> anyhow::Result<LoadedRoutes> {
        let mut loaded = LoadedRoutes::default();

        if path.is_file() {
            Self::add_file(&mut loaded, path)
                .with_context(|| format!("Failed to load route manifest: {}", path.display()))?;
            return Ok(loaded);
        }

        if !path.is_dir() {
            anyhow::bail!("Manifest path does not exist: {}", path.display());
        }

        let scan_result = FileScanner::new(path.to_path_buf()).scan()?;
        loaded.warnings.extend(scan_result.warnings);

        for file in &scan_result.manifest_files {
            if let Err(e) = Self::add_file(&mut loaded, file) {
                let warning = format!("Skipping manifest: {}", e);
                warn!("{}", warning);
                loaded.warnings.push(warning);
            }
        }

        info!(
            "Loaded {} route manifests with {} resources",
            loaded.files.len(),
            loaded.table.len()
        );
        Ok(loaded)
    }
}
