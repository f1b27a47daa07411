use assert_cmd::Command;

pub const ENV_KEYS: [&str; 5] = [
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
    "TELEGRAM_BOT_TOKEN",
    "ELEVENLABS_API_KEY",
];

/// The binary with every config-related variable cleared, run from `dir`.
pub fn voxlog_bin(dir: &std::path::Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("voxlog").expect("voxlog test binary should build");
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd.current_dir(dir);
    cmd
}
