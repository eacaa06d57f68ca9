//! Integration tests for Rewind

mod recorder_tests {
    use rewind::record::Normalizer;
    use rewind::{
        CallInput, Output, OutputField, RecordMode, Recorder, RewindError, StoreHandle,
        UsageCounter,
    };
    use serde_json::json;
    use std::path::Path;
    use std::process::{Command, Stdio};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    /// Set only in child processes spawned by the multi-process test
    const CHILD_LOCATION_ENV: &str = "REWIND_IT_CHILD_LOCATION";
    const CHILD_PROMPT_ENV: &str = "REWIND_IT_CHILD_PROMPT";

    fn recorder(mode: RecordMode, dir: &Path) -> Recorder {
        let recorder = Recorder::new(mode);
        recorder.bind(Some(dir)).unwrap();
        recorder
    }

    fn prompt(text: &str) -> CallInput {
        CallInput::new().arg("prompt", text)
    }

    #[test]
    fn scalar_output_replays() {
        let dir = TempDir::new().unwrap();
        let rec = recorder(RecordMode::Record, dir.path());
        rec.set(&prompt("hi"), Output::scalar("hello")).unwrap();

        let out = rec.get(&prompt("hi")).unwrap().unwrap();
        assert_eq!(out.into_value(), json!("hello"));
    }

    #[test]
    fn stream_output_replays_as_fresh_stream_each_time() {
        let dir = TempDir::new().unwrap();
        let rec = recorder(RecordMode::Record, dir.path());

        let returned = rec
            .set(
                &prompt("hi"),
                Output::stream(vec![json!("a"), json!("b"), json!("c")]),
            )
            .unwrap();
        assert_eq!(returned.into_value(), json!(["a", "b", "c"]));

        let replay = recorder(RecordMode::Replay, dir.path());
        for _ in 0..2 {
            match replay.get(&prompt("hi")).unwrap().unwrap() {
                Output::Stream(items) => {
                    let items: Vec<_> = items.collect();
                    assert_eq!(items, vec![json!("a"), json!("b"), json!("c")]);
                }
                other => panic!("expected stream, got {other:?}"),
            }
        }
    }

    #[test]
    fn mapping_of_streams_replays() {
        let dir = TempDir::new().unwrap();
        let rec = recorder(RecordMode::Record, dir.path());

        let mut fields = std::collections::BTreeMap::new();
        fields.insert(
            "tokens".to_string(),
            OutputField::stream(vec![json!("x"), json!("y")]),
        );
        fields.insert("model".to_string(), OutputField::Scalar(json!("m1")));
        rec.set(&prompt("dict"), Output::Map(fields)).unwrap();

        let replay = recorder(RecordMode::Replay, dir.path());
        let out = replay.get(&prompt("dict")).unwrap().unwrap();
        assert_eq!(
            out.into_value(),
            json!({"model": "m1", "tokens": ["x", "y"]})
        );
    }

    #[test]
    fn unseen_input_reports_hash_and_dump() {
        let dir = TempDir::new().unwrap();
        let rec = recorder(RecordMode::Replay, dir.path());

        let err = rec.get(&prompt("unseen")).unwrap_err();
        let expected_hash = Normalizer::default()
            .normalize(&prompt("unseen"))
            .hash()
            .unwrap();
        match err {
            RewindError::RecordItemMissing { hash, input, .. } => {
                assert_eq!(hash, expected_hash);
                assert!(input.contains("unseen"));
            }
            other => panic!("expected RecordItemMissing, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_writers_on_shared_location_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let path = Arc::new(dir.path().to_path_buf());
        let barrier = Arc::new(Barrier::new(4));

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let path = Arc::clone(&path);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let rec = Recorder::new(RecordMode::Record);
                    rec.bind(Some(path.as_path())).unwrap();
                    barrier.wait();
                    rec.set(&prompt(&format!("writer-{i}")), Output::scalar(i))
                        .unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let replay = recorder(RecordMode::Replay, dir.path());
        for i in 0..4 {
            let out = replay
                .get(&prompt(&format!("writer-{i}")))
                .unwrap()
                .unwrap();
            assert_eq!(out.into_value(), json!(i));
        }
    }

    /// Records one call when run as a child process; a no-op otherwise
    #[test]
    fn record_in_child_process() {
        let (Ok(location), Ok(text)) = (
            std::env::var(CHILD_LOCATION_ENV),
            std::env::var(CHILD_PROMPT_ENV),
        ) else {
            return;
        };
        let rec = recorder(RecordMode::Record, Path::new(&location));
        rec.set(&prompt(&text), Output::scalar(text.as_str()))
            .unwrap();
    }

    #[test]
    fn concurrent_processes_on_shared_location_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let exe = std::env::current_exe().unwrap();
        let texts = ["first", "second"];

        let children: Vec<_> = texts
            .iter()
            .map(|text| {
                Command::new(&exe)
                    .args([
                        "recorder_tests::record_in_child_process",
                        "--exact",
                        "--test-threads=1",
                    ])
                    .env(CHILD_LOCATION_ENV, dir.path())
                    .env(CHILD_PROMPT_ENV, text)
                    .stdout(Stdio::null())
                    .spawn()
                    .unwrap()
            })
            .collect();
        for mut child in children {
            assert!(child.wait().unwrap().success());
        }

        let replay = recorder(RecordMode::Replay, dir.path());
        for text in texts {
            let out = replay.get(&prompt(text)).unwrap().unwrap();
            assert_eq!(out.into_value(), json!(text));
        }
    }

    #[test]
    fn sensitive_keys_never_reach_the_record_file() {
        let dir = TempDir::new().unwrap();
        let rec = recorder(RecordMode::Record, dir.path());
        let input = prompt("hi").arg("extra_headers", json!({"Authorization": "secret"}));
        rec.set(&input, Output::scalar("ok")).unwrap();

        // Headers do not change the hash either
        assert!(rec.get(&prompt("hi")).unwrap().is_some());

        let location = rec.location().unwrap();
        let records = StoreHandle::new().read_location(&location).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].input.to_string().contains("secret"));
    }

    #[test]
    fn opaque_arguments_hash_alike() {
        let dir = TempDir::new().unwrap();
        let rec = recorder(RecordMode::Record, dir.path());

        let first = prompt("hi").opaque("client", "<Client at 0x1>");
        let second = prompt("hi").opaque("client", "<Client at 0x2>");
        rec.set(&first, Output::scalar("cached")).unwrap();

        let out = rec.get(&second).unwrap().unwrap();
        assert_eq!(out.into_value(), json!("cached"));
    }

    #[test]
    fn record_mode_call_then_replay_mode_call() {
        let dir = TempDir::new().unwrap();

        let rec = recorder(RecordMode::Record, dir.path());
        let out = rec
            .call(&prompt("hi"), || {
                Ok::<_, RewindError>(Output::stream(vec![json!("live")]))
            })
            .unwrap();
        assert_eq!(out.into_value(), json!(["live"]));
        rec.delete_lock_file().unwrap();

        let replay = recorder(RecordMode::Replay, dir.path());
        let out = replay
            .call(&prompt("hi"), || -> Result<Output, RewindError> {
                panic!("replay must not reach the service")
            })
            .unwrap();
        assert_eq!(out.into_value(), json!(["live"]));
    }

    #[test]
    fn counter_tracks_recorded_streams() {
        let dir = TempDir::new().unwrap();
        let counter_file = dir.path().join("usage").join("count.json");
        let rec = recorder(RecordMode::Record, dir.path());
        let counter = UsageCounter::new();

        let out = rec
            .set(
                &prompt("hi"),
                Output::stream(vec![json!("a"), json!("b"), json!("c")]),
            )
            .unwrap();
        let out = counter.increment(&counter_file, out).unwrap();
        assert_eq!(out.into_value(), json!(["a", "b", "c"]));
        assert_eq!(UsageCounter::read(&counter_file).unwrap().count, 3);
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use rewind::record::Normalizer;
    use rewind::{CallInput, Output, RecordMode, Recorder};
    use tempfile::TempDir;

    /// Isolated from user and project configuration
    fn rewind(config_dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("rewind");
        cmd.env_remove("REWIND_TEST_MODE")
            .env_remove("RUST_LOG")
            .arg("--no-local")
            .arg("--config")
            .arg(config_dir.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("record/replay"));
    }

    #[test]
    fn version_displays() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rewind"));
    }

    #[test]
    fn mode_defaults_to_live() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .arg("mode")
            .assert()
            .success()
            .stdout(predicate::str::contains("live"));
    }

    #[test]
    fn mode_reads_env() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .env("REWIND_TEST_MODE", "replay")
            .arg("mode")
            .assert()
            .success()
            .stdout(predicate::str::contains("replay"));
    }

    #[test]
    fn invalid_env_mode_fails_with_hint() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .env("REWIND_TEST_MODE", "sometimes")
            .arg("mode")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn records_list_empty() {
        let config = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        rewind(&config)
            .args(["records", "list", "--format", "json"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn records_list_and_show() {
        let config = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let input = CallInput::new().arg("prompt", "hi");

        let recorder = Recorder::new(RecordMode::Record);
        recorder.bind(Some(dir.path())).unwrap();
        recorder.set(&input, Output::scalar("hello")).unwrap();
        let hash = Normalizer::default().normalize(&input).hash().unwrap();

        rewind(&config)
            .args(["records", "list", "--format", "plain"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains(hash.as_str()));

        rewind(&config)
            .args(["records", "show", &hash[..8], "--location"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("\"hello\""));
    }

    #[test]
    fn records_show_missing_hash() {
        let config = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        rewind(&config)
            .args(["records", "show", "deadbeef", "--location"])
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Record item not found"));
    }

    #[test]
    fn records_unlock_without_lock_file() {
        let config = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        rewind(&config)
            .args(["records", "unlock"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No lock file"));
    }

    #[test]
    fn count_show_and_reset() {
        let config = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("count.json");
        std::fs::write(&path, r#"{"count":7}"#).unwrap();

        rewind(&config)
            .args(["count", "show"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("7"));

        rewind(&config)
            .args(["count", "reset"])
            .arg(&path)
            .assert()
            .success();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"count":0}"#);
    }

    #[test]
    fn count_without_path_fails() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .args(["count", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("counter.path"));
    }

    #[test]
    fn config_path() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let config = TempDir::new().unwrap();
        rewind(&config)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("initialized"));
        assert!(config.path().join("config.toml").exists());

        rewind(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[recording]"));

        rewind(&config)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }
}
