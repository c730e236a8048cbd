use crate::kernel::services::ports::{LanguageService, Marker, ResourceUri};
use rustc_hash::FxHashMap;
use std::fmt;

/// One line of a diagnostics report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub line: u32,
    pub message: String,
}

impl DiagnosticRecord {
    pub fn from_marker(marker: &Marker) -> Self {
        Self {
            line: marker.start_line.max(1),
            message: marker.message.clone(),
        }
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

/// `Line <N>: <message>` per marker, newline separated. Empty when clean.
pub fn format_report(markers: &[Marker]) -> String {
    markers
        .iter()
        .map(|m| DiagnosticRecord::from_marker(m).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads the markers already computed for `uri`; never triggers analysis.
pub fn collect(service: &dyn LanguageService, uri: &ResourceUri) -> String {
    format_report(&service.markers(uri))
}

/// Markers per resource, kept per owner so that one producer never clobbers
/// another's results.
#[derive(Debug, Default)]
pub struct MarkerTable {
    by_resource: FxHashMap<ResourceUri, FxHashMap<String, Vec<Marker>>>,
}

impl MarkerTable {
    pub fn update(&mut self, uri: &ResourceUri, owner: &str, items: Vec<Marker>) -> bool {
        let owners = self.by_resource.get(uri);
        let changed = match owners.and_then(|o| o.get(owner)) {
            Some(existing) => existing != &items,
            None => !items.is_empty(),
        };
        if !changed {
            return false;
        }

        if items.is_empty() {
            if let Some(owners) = self.by_resource.get_mut(uri) {
                owners.remove(owner);
                if owners.is_empty() {
                    self.by_resource.remove(uri);
                }
            }
        } else {
            self.by_resource
                .entry(uri.clone())
                .or_default()
                .insert(owner.to_string(), items);
        }
        true
    }

    pub fn remove_resource(&mut self, uri: &ResourceUri) {
        self.by_resource.remove(uri);
    }

    pub fn markers(&self, uri: &ResourceUri) -> Vec<Marker> {
        let Some(owners) = self.by_resource.get(uri) else {
            return Vec::new();
        };
        let mut items: Vec<Marker> = owners.values().flatten().cloned().collect();
        items.sort_by(|a, b| {
            a.start_line
                .cmp(&b.start_line)
                .then(a.start_col.cmp(&b.start_col))
        });
        items
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/problems.rs"]
mod tests;
