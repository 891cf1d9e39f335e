// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Probe tests against the host C compiler.
//!
//! Skipped (with a note on stderr) when `cc` cannot be run.

use nk_abi::{
    CProbe, Emitter, LayoutError, LayoutReport, NativeType, ProbeConfig, Registry, SizeOracle,
    TypeBinding,
};
use std::fs;
use std::path::Path;
use std::process::Command;

const HEADER: &str = r#"
#ifndef NK_TEST_HEADER
#define NK_TEST_HEADER
struct nk_vec2 { float x, y; };
struct nk_rect { float x, y, w, h; };
typedef union { void *ptr; int id; } nk_handle;
struct nk_color { unsigned char r, g, b, a; };
#ifdef NK_INCLUDE_COMMAND_USERDATA
struct nk_command { unsigned short type; nk_handle userdata; };
#else
struct nk_command { unsigned short type; };
#endif
struct nk_context;
#endif
"#;

// Rust mirrors of the header types.
#[allow(dead_code)]
#[repr(C)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

#[allow(dead_code)]
#[repr(C)]
union Handle {
    ptr: *mut std::ffi::c_void,
    id: i32,
}

#[allow(dead_code)]
#[repr(C)]
struct CommandMirror {
    kind: u16,
    userdata: Handle,
}

fn compiler_available() -> bool {
    let ok = Command::new("cc")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success());
    if !ok {
        eprintln!("skipping: no host C compiler (`cc`)");
    }
    ok
}

fn probe_config(dir: &Path) -> ProbeConfig {
    fs::write(dir.join("nuklear.h"), HEADER).expect("write header");
    ProbeConfig {
        compiler: Some("cc".to_string()),
        include_dirs: vec![dir.to_path_buf()],
        ..ProbeConfig::default()
    }
}

fn test_registry() -> Registry {
    Registry::new(vec![
        TypeBinding::new(NativeType::struct_named("nk_rect"), "Rect"),
        TypeBinding::new(NativeType::struct_named("nk_vec2"), "Vec2"),
        TypeBinding::new(NativeType::typedef_named("nk_handle"), "Handle"),
        TypeBinding::new(NativeType::struct_named("nk_color"), "Color"),
        TypeBinding::new(NativeType::struct_named("nk_command"), "Command"),
    ])
}

#[test]
fn test_measured_sizes_match_host_layout() {
    if !compiler_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let probe = CProbe::new(probe_config(dir.path())).expect("probe");
    let registry = test_registry();

    let sizes = probe.measure(&registry).expect("measure");

    let size = |ty: NativeType| sizes.size_of(&ty).expect("measured");
    assert_eq!(size(NativeType::struct_named("nk_rect")), std::mem::size_of::<Rect>() as u64);
    assert_eq!(size(NativeType::struct_named("nk_vec2")), 8);
    assert_eq!(
        size(NativeType::typedef_named("nk_handle")),
        std::mem::size_of::<Handle>() as u64
    );
    assert_eq!(size(NativeType::struct_named("nk_color")), 4);
    // NK_INCLUDE_COMMAND_USERDATA is among the default defines
    assert_eq!(
        size(NativeType::struct_named("nk_command")),
        std::mem::size_of::<CommandMirror>() as u64
    );
}

#[test]
fn test_defines_change_layout() {
    if !compiler_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ProbeConfig {
        defines: Vec::new(),
        ..probe_config(dir.path())
    };
    let registry = Registry::new(vec![TypeBinding::new(
        NativeType::struct_named("nk_command"),
        "Command",
    )]);

    let sizes = CProbe::new(config)
        .and_then(|p| p.measure(&registry))
        .expect("measure");

    assert_eq!(sizes.size_of(&NativeType::struct_named("nk_command")), Some(2));
}

#[test]
fn test_incomplete_type_is_unresolvable() {
    if !compiler_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let probe = CProbe::new(probe_config(dir.path())).expect("probe");
    let registry = Registry::new(vec![
        TypeBinding::new(NativeType::struct_named("nk_rect"), "Rect"),
        TypeBinding::new(NativeType::struct_named("nk_context"), "Context"),
    ]);

    match probe.measure(&registry) {
        Err(LayoutError::UnresolvableType {
            native, foreign, ..
        }) => {
            assert_eq!(native, "struct nk_context");
            assert_eq!(foreign, "Context");
        }
        other => panic!("expected UnresolvableType, got {other:?}"),
    }
}

#[test]
fn test_missing_compiler() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ProbeConfig {
        compiler: Some("nk-abi-no-such-compiler".to_string()),
        ..probe_config(dir.path())
    };

    let err = CProbe::new(config)
        .and_then(|p| p.measure(&test_registry()))
        .expect_err("compiler cannot be spawned");

    assert!(matches!(err, LayoutError::CompilerUnavailable { .. }));
}

#[test]
fn test_measure_report_and_emit() {
    if !compiler_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let probe = CProbe::new(probe_config(dir.path())).expect("probe");
    let registry = test_registry();
    let sizes = probe.measure(&registry).expect("measure");

    // a report replayed later yields the same document as the live probe
    let report = LayoutReport::measure(&registry, &sizes, "nuklear", Some(probe.compiler()))
        .expect("report");
    let replayed = LayoutReport::from_json(&report.to_json().expect("json")).expect("parse");
    assert_eq!(replayed, report);

    let emitter = Emitter::new(&registry, "nuklear").expect("emitter");
    let live = emitter.render(&sizes).expect("live");
    let from_report = emitter.render(&replayed.table()).expect("replay");
    assert_eq!(live, from_report);
    assert!(live.contains("#assert(size_of(Vec2) == 8)\n"));
    assert!(live.contains("#assert(size_of(Color) == 4)\n"));
}
