//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::Config;
use crate::render::{self, NodeView, RenderOptions};
use heapscope_core::{
    BuildOptions, GroupingEngine, HeapscopeError, NativeObjectTree, NodeRef, Snapshot,
    SnapshotData, SortColumn, SortDirection, SortSpec, find_path, has_snapshot_magic,
    snapshot_from_bytes, snapshot_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HeapscopeError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HeapscopeError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HeapscopeError::InvalidSnapshot(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HeapscopeError> {
    let canonical = path.canonicalize().map_err(|e| {
        HeapscopeError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HeapscopeError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, HeapscopeError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        HeapscopeError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(HeapscopeError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| HeapscopeError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SNAPSHOT LOADING
// =============================================================================

/// Decode a snapshot, binary if it carries the header magic, JSON otherwise.
pub fn read_snapshot_bytes(bytes: &[u8]) -> Result<Snapshot, HeapscopeError> {
    if has_snapshot_magic(bytes) {
        return snapshot_from_bytes(bytes);
    }

    let data: SnapshotData = serde_json::from_slice(bytes).map_err(|e| {
        HeapscopeError::DeserializationError(format!("Snapshot is neither binary nor JSON: {}", e))
    })?;
    Snapshot::new(data)
}

/// Read and validate a snapshot file.
pub fn load_snapshot(path: &Path, max_bytes: u64) -> Result<Snapshot, HeapscopeError> {
    let validated_path = validate_file_path(path)?;
    validate_file_size(&validated_path, max_bytes)?;

    let bytes = std::fs::read(&validated_path)
        .map_err(|e| HeapscopeError::IoError(format!("Read file: {}", e)))?;
    let snapshot = read_snapshot_bytes(&bytes)?;

    tracing::info!(
        path = %validated_path.display(),
        objects = snapshot.object_count(),
        types = snapshot.type_count(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Parse an address given as `0x`-prefixed hex or decimal.
pub fn parse_address(text: &str) -> Result<u64, HeapscopeError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => trimmed.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|e| HeapscopeError::InvalidArgument(format!("Invalid address '{}': {}", text, e)))
}

// =============================================================================
// VIEW OPTIONS
// =============================================================================

/// View flags as given on the command line; `None` defers to the config.
#[derive(Debug, Clone, Default)]
pub struct ViewArgs {
    pub sort: Option<String>,
    pub ascending: Option<bool>,
    pub depth: Option<usize>,
    pub references: bool,
}

/// Effective view after merging flags over the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    pub spec: SortSpec,
    pub render: RenderOptions,
}

impl ViewArgs {
    pub fn resolve(self, config: &Config) -> Result<View, HeapscopeError> {
        let mut spec = config.sort_spec();
        if let Some(name) = self.sort {
            spec.column = name.parse::<SortColumn>()?;
        }
        if let Some(ascending) = self.ascending {
            spec.direction = SortDirection::from_ascending(ascending);
        }
        let references = self.references || config.view.references;

        if !references && matches!(spec.column, SortColumn::References | SortColumn::ReferencedBy) {
            tracing::warn!(column = %spec.column, "reference counting is off, every row sorts as 0");
        }

        Ok(View {
            spec,
            render: RenderOptions {
                max_depth: self.depth.or(config.view.max_depth),
                references,
            },
        })
    }
}

/// Build and sort the tree for a view.
pub fn build_tree(snapshot: &Snapshot, view: View) -> NativeObjectTree {
    GroupingEngine::build(
        snapshot,
        BuildOptions::sorted(view.spec).with_references(view.render.references),
    )
}

// =============================================================================
// TREE COMMAND
// =============================================================================

/// Print the grouped tree.
pub fn cmd_tree(
    config: &Config,
    path: &Path,
    view: View,
    json_mode: bool,
) -> Result<(), HeapscopeError> {
    let snapshot = load_snapshot(path, config.limits.max_snapshot_bytes)?;
    let tree = build_tree(&snapshot, view);

    if json_mode {
        let output = serde_json::json!({
            "snapshot": path.to_string_lossy(),
            "sort": {
                "column": view.spec.column.as_str(),
                "ascending": view.spec.direction.is_ascending()
            },
            "total_size": tree.root().size(),
            "total_count": tree.root().count(),
            "nodes": render::tree_views(&tree, view.render)
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if tree.is_empty() {
        println!("Snapshot contains no native objects");
        return Ok(());
    }

    println!("{}", render::header(view.render));
    for line in render::tree_lines(&tree, view.render) {
        println!("{}", line);
    }
    println!();
    println!(
        "{} objects, {} total, sorted by {} ({})",
        snapshot.object_count(),
        render::format_bytes(tree.root().size()),
        view.spec.column,
        if view.spec.direction.is_ascending() {
            "ascending"
        } else {
            "descending"
        }
    );

    Ok(())
}

// =============================================================================
// SUMMARY COMMAND
// =============================================================================

/// The `n` heaviest top-level rows of a size-descending tree.
pub fn top_rows(tree: &NativeObjectTree, n: usize) -> Vec<NodeRef<'_>> {
    tree.root().children().take(n).collect()
}

/// Show totals and the heaviest top-level rows.
pub fn cmd_summary(
    config: &Config,
    path: &Path,
    top: usize,
    json_mode: bool,
) -> Result<(), HeapscopeError> {
    let snapshot = load_snapshot(path, config.limits.max_snapshot_bytes)?;
    let view = View {
        spec: SortSpec::descending(SortColumn::Size),
        render: RenderOptions {
            max_depth: Some(1),
            references: config.view.references,
        },
    };
    let tree = build_tree(&snapshot, view);
    let rows = top_rows(&tree, top);
    let non_unloading = snapshot
        .data()
        .objects
        .iter()
        .filter(|r| r.is_non_unloading())
        .count();

    if json_mode {
        let output = serde_json::json!({
            "snapshot": path.to_string_lossy(),
            "objects": snapshot.object_count(),
            "types": snapshot.type_count(),
            "total_size": snapshot.total_size(),
            "non_unloading": non_unloading,
            "top_level_rows": tree.root().child_count(),
            "top": rows
                .iter()
                .map(|n| NodeView::single(*n, view.render))
                .collect::<Vec<_>>()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Heapscope Snapshot Summary");
    println!("==========================");
    println!("Snapshot:       {}", path.display());
    println!();
    println!("Objects:        {}", snapshot.object_count());
    println!("Types:          {}", snapshot.type_count());
    println!("Total Size:     {}", render::format_bytes(snapshot.total_size()));
    println!("Non-unloading:  {}", non_unloading);
    println!("Top-level Rows: {}", tree.root().child_count());

    if !rows.is_empty() {
        println!();
        println!("Top {} by size:", rows.len());
        for node in rows {
            println!(
                "  {:>10}  {:>7}  {}",
                render::format_bytes(node.size()),
                if node.is_group() {
                    node.count().to_string()
                } else {
                    "-".to_string()
                },
                node.display_label()
            );
        }
    }

    Ok(())
}

// =============================================================================
// FIND COMMAND
// =============================================================================

/// Locate the object at an address.
pub fn cmd_find(
    config: &Config,
    path: &Path,
    address: &str,
    json_mode: bool,
) -> Result<(), HeapscopeError> {
    let address = parse_address(address)?;
    let snapshot = load_snapshot(path, config.limits.max_snapshot_bytes)?;
    let view = ViewArgs::default().resolve(config)?;
    let tree = build_tree(&snapshot, view);
    let found = find_path(&tree, address);

    if json_mode {
        let output = match &found {
            Some(nodes) => serde_json::json!({
                "address": render::format_address(address),
                "found": true,
                "path": nodes.iter().map(|n| n.display_label()).collect::<Vec<_>>(),
                "node": nodes.last().map(|n| NodeView::single(*n, view.render))
            }),
            None => serde_json::json!({
                "address": render::format_address(address),
                "found": false
            }),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    let Some(nodes) = found else {
        println!("Address {} not found", render::format_address(address));
        return Ok(());
    };

    let trail: Vec<_> = nodes.iter().map(|n| n.display_label()).collect();
    println!("Path: {}", trail.join(" > "));
    if let Some(leaf) = nodes.last() {
        println!();
        println!("{}", render::header(view.render));
        println!("{}", render::row(*leaf, view.render));
    }

    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Convert a snapshot to the binary format.
pub fn cmd_convert(
    config: &Config,
    input: &Path,
    output: &Path,
    json_mode: bool,
) -> Result<(), HeapscopeError> {
    let snapshot = load_snapshot(input, config.limits.max_snapshot_bytes)?;
    let output_path = validate_output_path(output)?;

    let bytes = snapshot_to_bytes(snapshot.data())?;
    std::fs::write(&output_path, &bytes)
        .map_err(|e| HeapscopeError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(path = %output_path.display(), bytes = bytes.len(), "wrote binary snapshot");

    if json_mode {
        let output = serde_json::json!({
            "output": output_path.to_string_lossy(),
            "objects": snapshot.object_count(),
            "bytes": bytes.len()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Converted {} objects to {} ({} bytes)",
        snapshot.object_count(),
        output_path.display(),
        bytes.len()
    );

    Ok(())
}
