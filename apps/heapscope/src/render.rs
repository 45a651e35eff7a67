//! # Rendering
//!
//! Text and JSON views of a native object tree.
//!
//! Text output is one row per node, indented by depth. JSON output nests
//! children under their parent. Both honour a depth limit counted from the
//! top-level rows (a limit of 1 prints top-level rows only).

use heapscope_core::primitives::DONT_UNLOAD_UNUSED_ASSET;
use heapscope_core::{NativeObjectTree, NodeRef};
use serde::Serialize;

/// What to print and how deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub max_depth: Option<usize>,
    pub references: bool,
}

impl RenderOptions {
    fn shows(&self, node: NodeRef<'_>) -> bool {
        match self.max_depth {
            Some(limit) => usize::try_from(node.depth()).map_or(true, |depth| depth < limit),
            None => true,
        }
    }
}

// =============================================================================
// FORMATTING
// =============================================================================

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte count with one decimal, using 1024-based units.
pub fn format_bytes(bytes: u64) -> String {
    let mut unit = 0;
    let mut whole = bytes;
    let mut rem = 0;
    while whole >= 1024 && unit < UNITS.len() - 1 {
        rem = whole % 1024;
        whole /= 1024;
        unit += 1;
    }
    if unit == 0 {
        return format!("{} B", bytes);
    }
    let tenths = rem * 10 / 1024;
    format!("{}.{} {}", whole, tenths, UNITS[unit])
}

/// Addresses print as fixed-width hex.
pub fn format_address(address: u64) -> String {
    format!("0x{:016X}", address)
}

fn flags(node: NodeRef<'_>) -> String {
    let mut out = Vec::new();
    if node.is_persistent() {
        out.push("persistent");
    }
    if node.is_dont_destroy_on_load() {
        out.push("ddol");
    }
    if let Some(record) = node.record() {
        if record.is_manager {
            out.push("manager");
        }
        if record.hide_flags & DONT_UNLOAD_UNUSED_ASSET != 0 {
            out.push("dont-unload");
        }
    }
    out.join(",")
}

// =============================================================================
// TEXT
// =============================================================================

/// Column header line.
pub fn header(options: RenderOptions) -> String {
    let mut line = format!(
        "{:<48} {:<24} {:>10} {:>7} {:>18} {:>11} {}",
        "TYPE", "NAME", "SIZE", "COUNT", "ADDRESS", "INSTANCE", "FLAGS"
    );
    if options.references {
        line.push_str(&format!(" {:>6} {:>6}", "REFS", "REFBY"));
    }
    line
}

/// One printed row.
pub fn row(node: NodeRef<'_>, options: RenderOptions) -> String {
    let depth = node.depth().max(0) as usize;
    let marker = if node.is_group() {
        "+ "
    } else if node.record().is_some_and(|r| r.is_non_unloading()) {
        "* "
    } else {
        "  "
    };
    let label = format!("{}{}{}", "  ".repeat(depth), marker, node.display_label());

    let (count, address, instance) = if node.is_group() {
        (node.count().to_string(), "-".to_string(), "-".to_string())
    } else {
        (
            "-".to_string(),
            format_address(node.address()),
            node.instance_id().to_string(),
        )
    };

    let mut line = format!(
        "{:<48} {:<24} {:>10} {:>7} {:>18} {:>11} {}",
        label,
        node.name(),
        format_bytes(node.size()),
        count,
        address,
        instance,
        flags(node)
    );
    if options.references {
        line.push_str(&format!(
            " {:>6} {:>6}",
            node.references(),
            node.referenced_by()
        ));
    }
    line.trim_end().to_string()
}

/// Every visible row, in display order, without the header.
pub fn tree_lines(tree: &NativeObjectTree, options: RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    for child in tree.root().children() {
        push_rows(child, options, &mut lines);
    }
    lines
}

fn push_rows(node: NodeRef<'_>, options: RenderOptions, lines: &mut Vec<String>) {
    if !options.shows(node) {
        return;
    }
    lines.push(row(node, options));
    for child in node.children() {
        push_rows(child, options, lines);
    }
}

// =============================================================================
// JSON
// =============================================================================

/// Serializable view of one node and its visible children.
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: u64,
    pub kind: &'static str,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub size: u64,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<i32>,
    pub persistent: bool,
    pub dont_destroy_on_load: bool,
    pub non_unloading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_by: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}

impl NodeView {
    /// View of `node` alone, without children.
    pub fn single(node: NodeRef<'_>, options: RenderOptions) -> Self {
        let leaf = node.is_leaf();
        Self {
            id: node.id().0,
            kind: if leaf { "leaf" } else { "group" },
            label: node.display_label().to_string(),
            name: node.name().to_string(),
            size: node.size(),
            count: node.count(),
            address: leaf.then(|| format_address(node.address())),
            instance_id: leaf.then(|| node.instance_id()),
            persistent: node.is_persistent(),
            dont_destroy_on_load: node.is_dont_destroy_on_load(),
            non_unloading: node.record().is_some_and(|r| r.is_non_unloading()),
            references: options.references.then(|| node.references()),
            referenced_by: options.references.then(|| node.referenced_by()),
            children: Vec::new(),
        }
    }

    /// View of `node` with every visible descendant.
    pub fn nested(node: NodeRef<'_>, options: RenderOptions) -> Self {
        let mut view = Self::single(node, options);
        view.children = node
            .children()
            .filter(|c| options.shows(*c))
            .map(|c| Self::nested(c, options))
            .collect();
        view
    }
}

/// Visible top-level nodes, nested.
pub fn tree_views(tree: &NativeObjectTree, options: RenderOptions) -> Vec<NodeView> {
    tree.root()
        .children()
        .filter(|c| options.shows(*c))
        .map(|c| NodeView::nested(c, options))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn address_is_padded_hex() {
        assert_eq!(format_address(0xBEEF), "0x000000000000BEEF");
    }

    #[test]
    fn header_grows_with_references() {
        let plain = header(RenderOptions::default());
        let refs = header(RenderOptions {
            max_depth: None,
            references: true,
        });
        assert!(!plain.contains("REFBY"));
        assert!(refs.ends_with("REFBY"));
    }
}
