//! Executor integration tests
//!
//! Full runs over real processes: timeline-driven iteration, template
//! resolution into commands, failure ordering, and cleanup.

#![cfg(unix)]

use assert_matches::assert_matches;
use imfconv::context::ContextStore;
use imfconv::conversion::{ConversionExecutor, PipelineDescription};
use imfconv::process::ProcessRunner;
use imfconv::timeline::Timeline;
use imfconv_common::Error;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parse(json: &str) -> PipelineDescription {
    serde_json::from_str(json).unwrap()
}

fn runner(dir: &Path) -> ProcessRunner {
    ProcessRunner::new(dir, dir.join("logs"), false)
}

/// Store with `out` pointing at the scratch directory.
fn store_with_out(dir: &Path) -> ContextStore {
    let mut store = ContextStore::new();
    store
        .dynamic_mut()
        .add("out", dir.display().to_string(), false);
    store
}

#[test]
fn test_segment_iteration_from_timeline() {
    let dir = tempdir().unwrap();
    let timeline: Timeline = serde_json::from_str(
        r#"{
            "segments": [
                {"parameters": {"label": "reel-1"}},
                {"parameters": {"label": "reel-2"}}
            ]
        }"#,
    )
    .unwrap();
    let mut store = store_with_out(dir.path());
    timeline.populate(&mut store);

    let desc = parse(
        r#"{
        "name": "per-segment",
        "operations": [
            {
                "kind": "exec_each_segment",
                "operations": [
                    {
                        "kind": "exec_once",
                        "name": "announce",
                        "value": "echo %{segment.label}",
                        "output": "%{dynamic.out}/segment_%{segment.num}.txt"
                    }
                ]
            }
        ]
    }"#,
    );

    let mut executor = ConversionExecutor::new(&mut store, runner(dir.path()));
    executor.run(&desc).unwrap();

    let first = fs::read_to_string(dir.path().join("segment_0.txt")).unwrap();
    let second = fs::read_to_string(dir.path().join("segment_1.txt")).unwrap();
    assert_eq!(first.trim(), "reel-1");
    assert_eq!(second.trim(), "reel-2");
}

#[test]
fn test_resource_paths_accumulate_across_hierarchy() {
    let dir = tempdir().unwrap();
    let timeline: Timeline = serde_json::from_str(
        r#"{
            "segments": [
                {"sequences": [
                    {"type": "video", "resources": [
                        {"parameters": {"essence": "/in/a.mxf"}},
                        {"parameters": {"essence": "/in/b.mxf"}}
                    ]}
                ]},
                {"sequences": [
                    {"type": "video", "resources": [
                        {"parameters": {"essence": "/in/c.mxf"}}
                    ]}
                ]}
            ]
        }"#,
    )
    .unwrap();
    let mut store = store_with_out(dir.path());
    timeline.populate(&mut store);

    let desc = parse(
        r#"{
        "operations": [
            {
                "kind": "exec_each_segment",
                "operations": [
                    {
                        "kind": "exec_each_sequence",
                        "type": "video",
                        "operations": [
                            {
                                "kind": "exec_each_resource",
                                "operations": [
                                    {
                                        "kind": "dynamic_parameter",
                                        "name": "inputs",
                                        "value": "%{resource.essence} ",
                                        "concat": true
                                    }
                                ]
                            }
                        ]
                    }
                ]
            },
            {
                "kind": "exec_once",
                "name": "concat",
                "value": "echo %{dynamic.inputs}",
                "output": "%{dynamic.out}/inputs.txt"
            }
        ]
    }"#,
    );

    let mut executor = ConversionExecutor::new(&mut store, runner(dir.path()));
    executor.run(&desc).unwrap();

    let inputs = fs::read_to_string(dir.path().join("inputs.txt")).unwrap();
    assert_eq!(inputs.trim(), "/in/a.mxf /in/b.mxf /in/c.mxf");
}

#[test]
fn test_first_failure_aborts_document_order() {
    let dir = tempdir().unwrap();
    let mut store = store_with_out(dir.path());
    let desc = parse(
        r#"{
        "operations": [
            { "kind": "exec_once", "name": "first", "value": "true" },
            { "kind": "exec_once", "name": "boom", "value": "sh -c \"exit 7\"" },
            { "kind": "exec_once", "name": "never", "value": "touch %{dynamic.out}/marker" }
        ]
    }"#,
    );

    let mut executor = ConversionExecutor::new(&mut store, runner(dir.path()));
    let err = executor.run(&desc).unwrap_err();
    assert_matches!(
        err,
        Error::ProcessFailed { sequence: 2, code: 7, ref name, .. } if name == "boom"
    );
    assert!(!dir.path().join("marker").exists());
    assert!(dir.path().join("logs/2_boom_once_sh.log").exists());
}

#[test]
fn test_tool_scope_resolves_program() {
    let dir = tempdir().unwrap();
    let mut store = store_with_out(dir.path());
    store.tool_mut().add("shell", "sh");
    let desc = parse(
        r#"{
        "operations": [
            {
                "kind": "exec_once",
                "name": "emit",
                "value": "%{tool.shell} -c \"printf done > %{dynamic.out}/done.txt\""
            }
        ]
    }"#,
    );

    let mut executor = ConversionExecutor::new(&mut store, runner(dir.path()));
    executor.run(&desc).unwrap();

    let done = fs::read_to_string(dir.path().join("done.txt")).unwrap();
    assert_eq!(done, "done");
    assert!(dir.path().join("logs/1_emit_once_sh.log").exists());
}

#[test]
fn test_log_files_follow_naming_scheme() {
    let dir = tempdir().unwrap();
    let mut store = store_with_out(dir.path());
    let desc = parse(
        r#"{
        "operations": [
            { "kind": "exec_once", "name": "plan", "value": "echo planned" },
            { "kind": "exec_once", "name": "apply", "value": "sh -c \"echo applied 1>&2\"" }
        ]
    }"#,
    );

    let mut executor = ConversionExecutor::new(&mut store, runner(dir.path()));
    executor.run(&desc).unwrap();

    let plan_log = dir.path().join("logs/1_plan_once_echo.log");
    let apply_log = dir.path().join("logs/2_apply_once_sh.log");
    assert_eq!(fs::read_to_string(plan_log).unwrap().trim(), "planned");
    // Stderr lands in the same per-process log.
    assert_eq!(fs::read_to_string(apply_log).unwrap().trim(), "applied");
}

#[test]
fn test_delete_on_exit_scratch_removed_after_success() {
    let dir = tempdir().unwrap();
    let mut store = store_with_out(dir.path());
    let desc = parse(
        r#"{
        "operations": [
            {
                "kind": "dynamic_parameter",
                "name": "scratch",
                "value": "%{dynamic.out}/scratch",
                "delete_on_exit": true
            },
            {
                "kind": "exec_once",
                "name": "work",
                "value": "sh -c \"mkdir -p %{dynamic.scratch} && printf x > %{dynamic.scratch}/part && printf y > %{dynamic.out}/kept.txt\""
            }
        ]
    }"#,
    );

    let mut executor = ConversionExecutor::new(&mut store, runner(dir.path()));
    executor.run(&desc).unwrap();

    assert!(dir.path().join("kept.txt").exists());
    assert!(!dir.path().join("scratch").exists());
}
