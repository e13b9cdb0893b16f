//! Post-processing of the boundary topology produced by `geo2topo`.
//!
//! Natural Earth features carry dozens of attributes. The web map only needs
//! a stable id, a display name and the sovereign country code, so every
//! geometry's properties are replaced with exactly `{id, name, sov}`.

use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while rewriting a topology file.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Failed to read topology {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse topology {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Topology {path} has no objects")]
    MissingObjects { path: PathBuf },

    #[error("Failed to write topology {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn string_property(properties: Option<&Map<String, Value>>, keys: &[&str]) -> String {
    properties
        .and_then(|props| keys.iter().find_map(|k| props.get(*k)))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

/// Builds the reduced property set for one geometry.
pub fn minimal_properties(properties: Option<&Map<String, Value>>) -> Value {
    let name = string_property(properties, &["NAME", "name"]);
    let sov = string_property(properties, &["SOV_A3", "sov"]);
    json!({
        "id": format!("{}_{}", name, sov),
        "name": name,
        "sov": sov,
    })
}

/// Rewrites every `objects.*.geometries[*].properties` in place.
///
/// Returns the number of geometries rewritten, or `None` when the document
/// has no `objects` map.
pub fn rewrite_properties(topology: &mut Value) -> Option<usize> {
    let objects = topology.get_mut("objects")?.as_object_mut()?;
    let mut rewritten = 0;

    for object in objects.values_mut() {
        let Some(geometries) = object.get_mut("geometries").and_then(Value::as_array_mut) else {
            continue;
        };
        for geometry in geometries.iter_mut() {
            let Some(geometry) = geometry.as_object_mut() else {
                continue;
            };
            let properties =
                minimal_properties(geometry.get("properties").and_then(Value::as_object));
            geometry.insert("properties".to_string(), properties);
            rewritten += 1;
        }
    }

    Some(rewritten)
}

/// Reads the topology at `path`, rewrites its properties and overwrites it.
pub async fn rewrite_topology_file(path: &Path) -> Result<usize, TopologyError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TopologyError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut topology: Value = serde_json::from_str(&raw).map_err(|e| TopologyError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let rewritten =
        rewrite_properties(&mut topology).ok_or_else(|| TopologyError::MissingObjects {
            path: path.to_path_buf(),
        })?;

    let serialized = serde_json::to_vec(&topology).map_err(|e| TopologyError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    tokio::fs::write(path, serialized)
        .await
        .map_err(|source| TopologyError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), geometries = rewritten, "Rewrote topology properties");
    Ok(rewritten)
}
