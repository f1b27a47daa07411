mod common;

use common::voxlog_bin;

#[test]
fn version_prints_package_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = voxlog_bin(dir.path()).arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("voxlog {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn help_lists_commands_and_env_keys() {
    let dir = tempfile::tempdir().unwrap();
    let output = voxlog_bin(dir.path()).arg("-h").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: voxlog"));
    assert!(stdout.contains("check-config"));
    assert!(stdout.contains("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn check_config_fails_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let output = voxlog_bin(dir.path()).arg("check-config").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr: {}", stderr);
}

#[test]
fn check_config_accepts_environment_only_setup() {
    let dir = tempfile::tempdir().unwrap();
    let output = voxlog_bin(dir.path())
        .arg("check-config")
        .env("OPENAI_API_KEY", "sk-test")
        .env("TELEGRAM_BOT_TOKEN", "123:abc")
        .env("ELEVENLABS_API_KEY", "el-test")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Config OK"));
    assert!(stdout.contains("bot_history.db"));
    assert!(stdout.contains("daily limit: 2"));
}

#[test]
fn check_config_rejects_zero_daily_limit() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[access]\ndaily_limit = 0\n",
    )
    .unwrap();
    let output = voxlog_bin(dir.path())
        .arg("check-config")
        .env("OPENAI_API_KEY", "sk-test")
        .env("TELEGRAM_BOT_TOKEN", "123:abc")
        .env("ELEVENLABS_API_KEY", "el-test")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("daily_limit"), "stderr: {}", stderr);
}

#[test]
fn unknown_argument_exits_with_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = voxlog_bin(dir.path()).arg("serve-forever").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
