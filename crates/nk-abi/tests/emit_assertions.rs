// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use nk_abi::{
    write_atomically, Emitter, LayoutError, LayoutReport, LayoutTable, NativeType, Registry,
    SizeOracle, TypeBinding,
};
use std::fs;

fn geometry_registry() -> Registry {
    Registry::new(vec![
        TypeBinding::new(NativeType::struct_named("GeometryRect"), "Rect"),
        TypeBinding::new(NativeType::struct_named("ColorHandle"), "Handle"),
    ])
}

fn geometry_sizes() -> LayoutTable {
    LayoutTable::new()
        .with(NativeType::struct_named("GeometryRect"), 16)
        .with(NativeType::struct_named("ColorHandle"), 4)
}

/// Distinct, made-up sizes for every built-in entry.
fn nuklear_sizes(registry: &Registry) -> LayoutTable {
    let mut sizes = LayoutTable::new();
    for (i, binding) in registry.iter().enumerate() {
        sizes.insert(&binding.native, 4 + 4 * i as u64);
    }
    sizes
}

#[test]
fn test_emit_geometry_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("assertions.odin");
    let registry = geometry_registry();

    let report = Emitter::new(&registry, "nuklear")
        .expect("emitter")
        .emit_to_path(&geometry_sizes(), &path)
        .expect("emit");

    assert_eq!(report.assertions, 2);
    assert!(!report.unchanged);
    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "package nuklear\n\n#assert(size_of(Rect) == 16)\n#assert(size_of(Handle) == 4)\n"
    );
}

#[test]
fn test_consecutive_runs_are_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("assertions.odin");
    let registry = Registry::nuklear();
    let sizes = nuklear_sizes(&registry);
    let emitter = Emitter::new(&registry, "nuklear").expect("emitter");

    emitter.emit_to_path(&sizes, &path).expect("first run");
    let first = fs::read(&path).expect("read first");
    let second_report = emitter.emit_to_path(&sizes, &path).expect("second run");
    let second = fs::read(&path).expect("read second");

    assert_eq!(first, second);
    assert!(second_report.unchanged);
}

#[test]
fn test_one_line_per_entry_in_registry_order() {
    let registry = Registry::nuklear();
    let sizes = nuklear_sizes(&registry);
    let document = Emitter::new(&registry, "nuklear")
        .and_then(|e| e.render(&sizes))
        .expect("render");

    let mut lines = document.lines();
    assert_eq!(lines.next(), Some("package nuklear"));
    assert_eq!(lines.next(), Some(""));

    let asserted: Vec<(String, u64)> = lines
        .map(|line| {
            let inner = line
                .strip_prefix("#assert(size_of(")
                .and_then(|l| l.strip_suffix(')'))
                .expect("assertion syntax");
            let (name, size) = inner.split_once(") == ").expect("comparison");
            (name.to_string(), size.parse().expect("size literal"))
        })
        .collect();

    let expected: Vec<&str> = registry.iter().map(|b| b.foreign).collect();
    let names: Vec<&str> = asserted.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, expected);

    // every literal is what the oracle reports for that entry
    for (binding, (_, size)) in registry.iter().zip(&asserted) {
        assert_eq!(sizes.size_of(&binding.native), Some(*size));
    }
}

#[test]
fn test_unresolvable_type_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("assertions.odin");
    let registry = Registry::new(vec![
        TypeBinding::new(NativeType::struct_named("GeometryRect"), "Rect"),
        TypeBinding::new(NativeType::struct_named("nk_context"), "Context"),
    ]);
    let sizes = geometry_sizes().with(NativeType::struct_named("nk_context"), 0);

    let err = Emitter::new(&registry, "nuklear")
        .expect("emitter")
        .emit_to_path(&sizes, &path)
        .expect_err("opaque type must abort");

    match err {
        LayoutError::UnresolvableType {
            native, foreign, ..
        } => {
            assert_eq!(native, "struct nk_context");
            assert_eq!(foreign, "Context");
        }
        other => panic!("expected UnresolvableType, got {other:?}"),
    }
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 0);
}

#[test]
fn test_failed_run_keeps_previous_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("assertions.odin");
    fs::write(&path, "package nuklear\n\n#assert(size_of(Rect) == 16)\n").expect("seed");

    let registry = geometry_registry();
    let partial = LayoutTable::new().with(NativeType::struct_named("GeometryRect"), 20);
    let result = Emitter::new(&registry, "nuklear")
        .expect("emitter")
        .emit_to_path(&partial, &path);

    assert!(matches!(result, Err(LayoutError::UnresolvableType { .. })));
    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "package nuklear\n\n#assert(size_of(Rect) == 16)\n"
    );
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("assertions.odin");
    let registry = geometry_registry();

    let err = Emitter::new(&registry, "nuklear")
        .expect("emitter")
        .emit_to_path(&geometry_sizes(), &path)
        .expect_err("parent directory does not exist");

    assert!(matches!(err, LayoutError::OutputWriteFailure { .. }));
    assert!(err.to_string().contains("assertions.odin"));
    assert!(!path.exists());
}

#[test]
fn test_destination_is_a_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("assertions.odin");
    fs::create_dir(&path).expect("mkdir");
    fs::write(path.join("keep.txt"), "keep").expect("seed");

    let registry = geometry_registry();
    let err = Emitter::new(&registry, "nuklear")
        .expect("emitter")
        .emit_to_path(&geometry_sizes(), &path)
        .expect_err("cannot replace a directory");

    assert!(matches!(err, LayoutError::OutputWriteFailure { .. }));
    assert!(path.join("keep.txt").is_file());
    // the staged temporary file is cleaned up
    let leftovers = fs::read_dir(dir.path()).expect("list").count();
    assert_eq!(leftovers, 1);
}

#[test]
fn test_layout_report_written_whole_or_not_at_all() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("layouts.json");
    let registry = geometry_registry();
    let report =
        LayoutReport::measure(&registry, &geometry_sizes(), "nuklear", None).expect("report");
    let json = report.to_json().expect("json");

    write_atomically(&path, json.as_bytes()).expect("write report");
    let loaded = LayoutReport::load(&path).expect("load");
    assert_eq!(loaded, report);

    let blocked = dir.path().join("missing").join("layouts.json");
    let err = write_atomically(&blocked, json.as_bytes()).expect_err("no parent directory");
    assert!(matches!(err, LayoutError::OutputWriteFailure { .. }));
    assert!(!blocked.exists());
    // only the first report exists; no staged leftovers
    assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 1);
}

#[cfg(unix)]
mod permissions {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn mode(path: &std::path::Path) -> u32 {
        fs::metadata(path).expect("metadata").permissions().mode() & 0o777
    }

    #[test]
    fn test_rewrite_keeps_existing_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("assertions.odin");
        fs::write(&path, "package nuklear\n").expect("seed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

        Emitter::new(&geometry_registry(), "nuklear")
            .expect("emitter")
            .emit_to_path(&geometry_sizes(), &path)
            .expect("emit");

        assert_eq!(mode(&path), 0o644);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).expect("chmod");
        Emitter::new(&geometry_registry(), "nuklear")
            .expect("emitter")
            .emit_to_path(&geometry_sizes(), &path)
            .expect("emit again");
        assert_eq!(mode(&path), 0o640);
    }

    #[test]
    fn test_new_file_is_readable_by_others() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("assertions.odin");

        Emitter::new(&geometry_registry(), "nuklear")
            .expect("emitter")
            .emit_to_path(&geometry_sizes(), &path)
            .expect("emit");

        // 0644 minus the umask, never wider
        let mode = mode(&path);
        assert_eq!(mode & !0o644, 0);
        assert_eq!(mode & 0o600, 0o600);
    }
}
