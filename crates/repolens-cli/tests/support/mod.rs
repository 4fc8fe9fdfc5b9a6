use assert_cmd::Command;
use std::fs;
use std::path::Path;

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("repolens");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    command.env_remove("GITHUB_TOKEN");
    (command, temp_home)
}

pub fn write_config(home: &Path, contents: &str) {
    let config_dir = home.join(".config").join("repolens");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(config_dir.join("config.toml"), contents).expect("write config");
}
