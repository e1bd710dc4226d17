//! Datapoint configuration.
//!
//! Datapoints are declared in a TOML file, one `[[datapoint]]` table per
//! group address:
//!
//! ```toml
//! [[datapoint]]
//! address = "1/2/3"
//! name = "Living room light"
//! main_number = 1
//! dpt = "1.001"
//! ```
//!
//! Loading is build-then-swap: a whole new [`DatapointMap`] is parsed and
//! validated, and only on success replaces the previous one in the
//! [`DatapointStore`]. A failed load leaves the store untouched. Load errors
//! carry the file path, the line number and the offending item so a log entry
//! pinpoints the bad declaration.

use crate::address::GroupAddress;
use crate::dpt::Translator;
use crate::error::{LoadError, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// Datapoint
// =============================================================================

/// One configured datapoint with its resolved translator.
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    address: GroupAddress,
    name: String,
    main_number: u8,
    dpt: String,
    translator: Translator,
}

impl Datapoint {
    /// Create a datapoint, resolving its DPT against the registry.
    ///
    /// # Errors
    ///
    /// Fails when the main number or DPT id is unknown.
    pub fn new(
        address: GroupAddress,
        name: impl Into<String>,
        main_number: u8,
        dpt: impl Into<String>,
    ) -> Result<Self> {
        let dpt = dpt.into();
        let translator = Translator::resolve(main_number, &dpt)?;
        Ok(Self {
            address,
            name: name.into(),
            main_number,
            dpt,
            translator,
        })
    }

    /// Group address of this datapoint.
    pub fn address(&self) -> GroupAddress {
        self.address
    }

    /// Descriptive name, may be empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// DPT main number.
    pub fn main_number(&self) -> u8 {
        self.main_number
    }

    /// DPT id, e.g. `"9.001"`.
    pub fn dpt(&self) -> &str {
        &self.dpt
    }

    /// The resolved translator.
    pub fn translator(&self) -> Translator {
        self.translator
    }
}

// =============================================================================
// File Format
// =============================================================================

#[derive(Debug, Deserialize)]
struct DatapointFile {
    #[serde(default, rename = "datapoint")]
    datapoints: Vec<RawDatapoint>,
}

#[derive(Debug, Deserialize)]
struct RawDatapoint {
    address: toml::Spanned<String>,
    #[serde(default)]
    name: Option<String>,
    main_number: u8,
    dpt: toml::Spanned<String>,
}

/// 1-based line number of a byte offset in `text`.
fn line_of(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    text[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

// =============================================================================
// DatapointMap
// =============================================================================

/// An immutable set of datapoints keyed by group address.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DatapointMap {
    entries: HashMap<GroupAddress, Datapoint>,
}

impl DatapointMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate datapoint declarations from TOML text.
    ///
    /// `origin` names the source in error messages, typically the file path.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] with line number and offending item for syntax
    /// errors, unparseable addresses, unknown DPT codes and duplicate
    /// addresses.
    pub fn parse(text: &str, origin: &str) -> std::result::Result<Self, LoadError> {
        let file: DatapointFile = toml::from_str(text).map_err(|e| {
            let line = e.span().map(|s| line_of(text, s.start));
            LoadError::new(origin, line, None, e.message())
        })?;

        let mut entries = HashMap::with_capacity(file.datapoints.len());
        for raw in file.datapoints {
            let address_line = line_of(text, raw.address.span().start);
            let address_text = raw.address.into_inner();
            let address: GroupAddress = address_text.parse().map_err(|e| {
                LoadError::new(
                    origin,
                    Some(address_line),
                    Some(address_text.clone()),
                    format!("{e}"),
                )
            })?;

            let dpt_line = line_of(text, raw.dpt.span().start);
            let dpt_text = raw.dpt.into_inner();
            let datapoint = Datapoint::new(
                address,
                raw.name.unwrap_or_default(),
                raw.main_number,
                dpt_text.clone(),
            )
            .map_err(|e| {
                LoadError::new(origin, Some(dpt_line), Some(dpt_text.clone()), format!("{e}"))
            })?;

            if entries.insert(address, datapoint).is_some() {
                return Err(LoadError::new(
                    origin,
                    Some(address_line),
                    Some(address_text),
                    "duplicate datapoint address",
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Read and parse a datapoint file.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] for I/O failures and everything
    /// [`DatapointMap::parse`] rejects.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, LoadError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoadError::new(&origin, None, None, e.to_string()))?;
        Self::parse(&text, &origin)
    }

    /// Look up the datapoint configured for `address`.
    pub fn get(&self, address: GroupAddress) -> Option<&Datapoint> {
        self.entries.get(&address)
    }

    /// Number of configured datapoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no datapoints are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all datapoints in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Datapoint> {
        self.entries.values()
    }
}

// =============================================================================
// DatapointStore
// =============================================================================

/// Shared handle to the current datapoint map.
///
/// Readers take a cheap [`snapshot`](DatapointStore::snapshot) and keep using
/// it unaffected while a reload swaps in a new map. Clones share the same
/// underlying store.
#[derive(Debug, Clone, Default)]
pub struct DatapointStore {
    current: Arc<RwLock<Arc<DatapointMap>>>,
}

impl DatapointStore {
    /// A store starting out empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `map`.
    pub fn with_map(map: DatapointMap) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(map))),
        }
    }

    /// The current map. The snapshot stays valid across later replacements.
    pub fn snapshot(&self) -> Arc<DatapointMap> {
        self.current.read().clone()
    }

    /// Swap in a new map.
    pub fn replace(&self, map: DatapointMap) {
        *self.current.write() = Arc::new(map);
    }

    /// Load a datapoint file and swap it in on success.
    ///
    /// # Errors
    ///
    /// On any load failure the current map stays in place and the error is
    /// returned.
    pub fn load_file(&self, path: impl AsRef<Path>) -> std::result::Result<usize, LoadError> {
        let map = DatapointMap::load(path)?;
        let count = map.len();
        self.replace(map);
        Ok(count)
    }
}
