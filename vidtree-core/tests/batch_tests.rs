// vidtree-core/tests/batch_tests.rs
//
// Batch orchestration against in-memory trees and scripted transformers.

use vidtree_core::config::{CoreConfig, TransformPolicy, TrimSettings};
use vidtree_core::error::CoreError;
use vidtree_core::external::mocks::{MockFfprobeExecutor, ScriptedTransformer, VirtualFs};
use vidtree_core::processing::{BatchOrchestrator, TransformMode};

use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn trim_config(output_dir: &Path, max_duration_secs: f64) -> CoreConfig {
    let mut config = CoreConfig::new(PathBuf::from("/videos"), output_dir.to_path_buf());
    config.policy = TransformPolicy::Trim(TrimSettings { max_duration_secs });
    config
}

fn scenario_tree() -> VirtualFs {
    let mut vfs = VirtualFs::new("/videos");
    vfs.add_file("/videos/A/1.mp4", 500)
        .add_file("/videos/A/2.mp4", 1200)
        .add_file("/videos/B/3.mov", 300);
    vfs
}

fn scenario_probe() -> MockFfprobeExecutor {
    let probe = MockFfprobeExecutor::new();
    probe.expect_duration("/videos/A/1.mp4", 5.0);
    probe.expect_duration("/videos/A/2.mp4", 12.0);
    probe.expect_duration("/videos/B/3.mov", 3.0);
    probe
}

#[test]
fn test_trim_scenario_decides_per_file() {
    let out = tempdir().unwrap();
    let output_dir = out.path().join("videos_cropped");
    let transformer = ScriptedTransformer::new();
    let probe = scenario_probe();

    let orchestrator =
        BatchOrchestrator::new(trim_config(&output_dir, 7.0), transformer.clone(), probe.clone());
    let summary = orchestrator.run_with_reader(&scenario_tree()).unwrap();

    assert_eq!(summary.total_seen, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.transformed, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.input_bytes, 1200);
    assert_eq!(summary.output_bytes, 600);
    assert!((summary.percent_saved - 50.0).abs() < 1e-9);

    let jobs = transformer.jobs();
    assert_eq!(jobs.len(), 3);
    let job_of = |path: &str| {
        jobs.iter()
            .find(|(file, _)| file.path == Path::new(path))
            .cloned()
            .unwrap()
    };
    let (short, short_mode) = job_of("/videos/A/1.mp4");
    assert_eq!(short_mode, TransformMode::Trim { max_duration_secs: 7.0 });
    assert_eq!(short.duration_secs, Some(5.0));
    let (long, long_mode) = job_of("/videos/A/2.mp4");
    assert_eq!(long_mode, TransformMode::Trim { max_duration_secs: 7.0 });
    assert_eq!(long.duration_secs, Some(12.0));

    // Probed exactly once per file
    for path in ["/videos/A/1.mp4", "/videos/A/2.mp4", "/videos/B/3.mov"] {
        assert_eq!(probe.probe_count(path), 1, "{path}");
    }

    assert!(output_dir.join("A").is_dir());
    assert!(output_dir.join("B").is_dir());
}

#[test]
fn test_probe_failure_is_isolated() {
    let out = tempdir().unwrap();
    let transformer = ScriptedTransformer::new();
    let probe = MockFfprobeExecutor::new();
    probe.expect_duration("/videos/A/1.mp4", 5.0);
    probe.expect_failure("/videos/A/2.mp4", "moov atom not found");
    probe.expect_duration("/videos/B/3.mov", 3.0);

    let summary = BatchOrchestrator::new(trim_config(out.path(), 7.0), transformer.clone(), probe)
        .run_with_reader(&scenario_tree())
        .unwrap();

    assert_eq!(summary.total_seen, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.transformed, 0);

    // No transform attempted for the file that failed to probe
    let jobs = transformer.jobs();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|(file, _)| file.path != Path::new("/videos/A/2.mp4")));
}

#[test]
fn test_transform_failure_does_not_abort_batch() {
    let out = tempdir().unwrap();
    let mut config = CoreConfig::new(PathBuf::from("/videos"), out.path().to_path_buf());
    config.policy = TransformPolicy::Compress(Default::default());
    let transformer = ScriptedTransformer::new();
    transformer.fail_on("1.mp4", "ffmpeg exited with 1");

    let summary = BatchOrchestrator::new(config, transformer.clone(), MockFfprobeExecutor::new())
        .run_with_reader(&scenario_tree())
        .unwrap();

    assert_eq!(summary.total_seen, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.transformed, 2);
    assert_eq!(summary.succeeded + summary.failed, summary.total_seen);
    assert_eq!(transformer.jobs().len(), 3);
    assert!(summary.has_failures());
}

#[test]
fn test_compress_percent_saved_over_transformed_files() {
    let out = tempdir().unwrap();
    let mut config = CoreConfig::new(PathBuf::from("/videos"), out.path().to_path_buf());
    config.policy = TransformPolicy::Compress(Default::default());

    let probe = MockFfprobeExecutor::new();
    let summary = BatchOrchestrator::new(config, ScriptedTransformer::new(), probe.clone())
        .run_with_reader(&scenario_tree())
        .unwrap();

    // Scripted transforms halve every file
    assert_eq!(summary.input_bytes, 2000);
    assert_eq!(summary.output_bytes, 1000);
    assert_eq!(summary.bytes_saved, 1000);
    assert!((summary.percent_saved - 50.0).abs() < 1e-9);

    // Compression never probes
    assert_eq!(probe.total_probes(), 0);
}

#[test]
fn test_empty_source_directory() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    let output_dir = out.path().join("nested/output");
    let config = CoreConfig::new(input.path().to_path_buf(), output_dir.clone());

    let summary = BatchOrchestrator::new(config, ScriptedTransformer::new(), MockFfprobeExecutor::new())
        .run()
        .unwrap();

    assert!(output_dir.is_dir());
    assert_eq!(summary.total_seen, 0);
    assert_eq!(summary.percent_saved, 0.0);
    assert_eq!(summary.bytes_saved, 0);
}

#[test]
fn test_unreadable_root_aborts_before_output() {
    let out = tempdir().unwrap();
    let output_dir = out.path().join("never");
    let mut vfs = scenario_tree();
    vfs.deny("/videos");

    let transformer = ScriptedTransformer::new();
    let result = BatchOrchestrator::new(
        trim_config(&output_dir, 7.0),
        transformer.clone(),
        scenario_probe(),
    )
    .run_with_reader(&vfs);

    assert!(matches!(result, Err(CoreError::InvalidBatchRoot(_))));
    assert!(!output_dir.exists());
    assert!(transformer.jobs().is_empty());
}

#[test]
fn test_output_root_failure_is_fatal() {
    let out = tempdir().unwrap();
    let blocker = out.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let transformer = ScriptedTransformer::new();
    let result = BatchOrchestrator::new(
        trim_config(&blocker.join("out"), 7.0),
        transformer.clone(),
        scenario_probe(),
    )
    .run_with_reader(&scenario_tree());

    assert!(matches!(result, Err(CoreError::OutputRoot { .. })));
    assert!(transformer.jobs().is_empty());
}

#[test]
fn test_concurrent_jobs_account_for_every_file() {
    let out = tempdir().unwrap();
    let mut vfs = VirtualFs::new("/videos");
    let probe = MockFfprobeExecutor::new();
    let transformer = ScriptedTransformer::new();
    for dir in 0..6 {
        for file in 0..7 {
            let path = format!("/videos/d{dir}/f{file}.mp4");
            vfs.add_file(&path, 1000);
            probe.expect_duration(&path, f64::from(file * 2));
        }
    }
    transformer.fail_on("d3/f1.mp4", "simulated");

    let mut config = trim_config(out.path(), 7.0);
    config.jobs = 4;
    let summary = BatchOrchestrator::new(config, transformer.clone(), probe.clone())
        .run_with_reader(&vfs)
        .unwrap();

    // Durations 0,2,4,6 copy; 8,10,12 trim
    assert_eq!(summary.total_seen, 42);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 41);
    assert_eq!(summary.transformed, 18);
    assert_eq!(summary.skipped, 23);
    assert_eq!(probe.total_probes(), 42);
    assert_eq!(transformer.jobs().len(), 42);
    for dir in 0..6 {
        assert!(out.path().join(format!("d{dir}")).is_dir());
    }
}

#[test]
fn test_colliding_destinations_fail_the_later_input() {
    let out = tempdir().unwrap();
    let mut vfs = VirtualFs::new("/videos");
    vfs.add_file("/videos/A/x.mov", 400)
        .add_file("/videos/A/x.mp4", 300)
        .add_file("/videos/A/y.mov", 200);
    let mut config = CoreConfig::new(PathBuf::from("/videos"), out.path().to_path_buf());
    config.policy = TransformPolicy::Compress(Default::default());
    config.output_extension = Some("mp4".to_string());
    config.jobs = 4;
    let transformer = ScriptedTransformer::new();

    let summary = BatchOrchestrator::new(config, transformer.clone(), MockFfprobeExecutor::new())
        .run_with_reader(&vfs)
        .unwrap();

    assert_eq!(summary.total_seen, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    // Walk order is by name, so x.mov claims A/x.mp4 first
    let mut received: Vec<PathBuf> = transformer.jobs().into_iter().map(|(f, _)| f.path).collect();
    received.sort();
    assert_eq!(
        received,
        vec![PathBuf::from("/videos/A/x.mov"), PathBuf::from("/videos/A/y.mov")]
    );
}
