//! Tests for the `taskslot schedule` command

use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn taskslot_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("target/debug/taskslot")
}

fn write_small_instance(path: &std::path::Path) {
    let instance = serde_json::json!({
        "tasks": [
            { "id": 1, "name": "t1", "user_id": 1, "remaining_hours": 3.0, "priority_score": 10.0, "hierarchy_level": null, "is_leaf_task": null, "parent_id": null }
        ],
        "calendar_slots": [
            { "task_id": 1, "dayofweek": 0, "hour_from": 9, "hour_to": 17 },
            { "task_id": 1, "dayofweek": 1, "hour_from": 9, "hour_to": 17 }
        ],
        "leaves": []
    });
    std::fs::write(path, serde_json::to_string_pretty(&instance).unwrap()).unwrap();
}

#[test]
fn schedule_prints_solution_json_to_stdout() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    write_small_instance(&instance_path);

    let output = Command::new(taskslot_binary())
        .arg("schedule")
        .arg(&instance_path)
        .output()
        .expect("failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let solution: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(solution["tasks_total"], 1);
    assert_eq!(solution["tasks_scheduled"], 1);
}

#[test]
fn schedule_writes_solution_to_output_file() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("instance.json");
    let output_path = dir.path().join("solution.json");
    write_small_instance(&instance_path);

    let output = Command::new(taskslot_binary())
        .arg("schedule")
        .arg(&instance_path)
        .args(["-o"])
        .arg(&output_path)
        .output()
        .expect("failed to execute command");

    assert!(output.status.success());
    assert!(output_path.exists());
    let content = std::fs::read_to_string(&output_path).unwrap();
    let solution: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(solution["tasks_scheduled"], 1);
}

#[test]
fn schedule_rejects_malformed_instance() {
    let dir = tempdir().unwrap();
    let instance_path = dir.path().join("bad.json");
    std::fs::write(&instance_path, "not json").unwrap();

    let output = Command::new(taskslot_binary())
        .arg("schedule")
        .arg(&instance_path)
        .output()
        .expect("failed to execute command");

    assert!(!output.status.success());
}
