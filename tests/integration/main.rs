//! Integration tests for yarn-install

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn yarn_install() -> Command {
        let mut cmd = cargo_bin_cmd!("yarn-install");
        cmd.env_remove("BP_NODE_PROJECT_PATH")
            .env_remove("CNB_APP_DIR")
            .env_remove("CNB_LAYERS_DIR")
            .env_remove("NODE_ENV");
        cmd
    }

    fn yarn_app() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "engines": {"node": "18.x"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("yarn.lock"), "leftpad@1.3.0:\n").unwrap();
        dir
    }

    #[test]
    fn help_displays() {
        yarn_install()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("detect"))
            .stdout(predicate::str::contains("Install dependencies"));
    }

    #[test]
    fn version_displays() {
        yarn_install()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("yarn-install"));
    }

    #[test]
    fn detect_passes_for_yarn_project() {
        let app = yarn_app();
        yarn_install()
            .args(["detect", "--app-dir"])
            .arg(app.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("name = \"node_modules\""))
            .stdout(predicate::str::contains("version = \"18.x\""));
    }

    #[test]
    fn detect_fails_without_lockfile() {
        let app = TempDir::new().unwrap();
        fs::write(app.path().join("package.json"), "{}").unwrap();

        yarn_install()
            .args(["detect", "--app-dir"])
            .arg(app.path())
            .assert()
            .code(100)
            .stdout(predicate::str::contains("yarn.lock"));
    }

    #[test]
    fn detect_missing_project_path() {
        let app = yarn_app();
        yarn_install()
            .env("BP_NODE_PROJECT_PATH", "does-not-exist")
            .args(["detect", "--app-dir"])
            .arg(app.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("could not find project path"));
    }

    #[cfg(unix)]
    mod build {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        const FAKE_YARN: &str = r#"#!/bin/sh
echo "$@" >> "$FAKE_YARN_LOG"
case "$1 $2" in
  "config list") echo "{ 'version-tag-prefix': 'v' }" ;;
  "config get") echo "undefined" ;;
  install*)
    while [ $# -gt 0 ]; do
      if [ "$1" = "--modules-folder" ]; then mkdir -p "$2/leftpad"; fi
      shift
    done
    ;;
esac
"#;

        fn fake_yarn(dir: &Path) -> std::path::PathBuf {
            let path = dir.join("yarn");
            fs::write(&path, FAKE_YARN).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn build_installs_then_reuses() {
            let app = yarn_app();
            let scratch = TempDir::new().unwrap();
            let layers = scratch.path().join("layers");
            fs::create_dir_all(&layers).unwrap();
            let yarn = fake_yarn(scratch.path());
            let log = scratch.path().join("yarn.log");

            let build = |temp: &str| {
                let mut cmd = yarn_install();
                cmd.env("FAKE_YARN_LOG", &log)
                    .args(["build", "--build", "--app-dir"])
                    .arg(app.path())
                    .arg("--layers-dir")
                    .arg(&layers)
                    .arg("--temp-dir")
                    .arg(scratch.path().join(temp))
                    .arg("--yarn")
                    .arg(&yarn);
                cmd
            };

            build("tmp1")
                .assert()
                .success()
                .stdout(predicate::str::contains("Installed build modules"));

            assert!(layers.join("build-modules/node_modules/leftpad").is_dir());
            assert!(app.path().join("node_modules/leftpad").is_dir());
            let metadata = fs::read_to_string(layers.join("build-modules.toml")).unwrap();
            assert!(metadata.contains("cache_sha"));

            build("tmp2")
                .assert()
                .success()
                .stdout(predicate::str::contains("Reused build modules"));

            let calls = fs::read_to_string(&log).unwrap();
            assert_eq!(calls.lines().filter(|l| l.starts_with("install")).count(), 1);
        }

        #[test]
        fn build_and_launch() {
            let app = yarn_app();
            let scratch = TempDir::new().unwrap();
            let layers = scratch.path().join("layers");
            fs::create_dir_all(&layers).unwrap();
            let yarn = fake_yarn(scratch.path());

            yarn_install()
                .env("FAKE_YARN_LOG", scratch.path().join("yarn.log"))
                .args(["build", "--app-dir"])
                .arg(app.path())
                .arg("--layers-dir")
                .arg(&layers)
                .arg("--temp-dir")
                .arg(scratch.path().join("tmp"))
                .arg("--yarn")
                .arg(&yarn)
                .assert()
                .success()
                .stdout(predicate::str::contains("Installed launch modules"));

            assert!(layers.join("launch-modules/node_modules/leftpad").is_dir());
            assert!(layers.join("launch-modules/env.launch/PATH.append").is_file());
            assert!(layers.join("build-modules/env.build/PATH.append").is_file());
        }

        #[test]
        fn failing_install_reports_output() {
            let app = yarn_app();
            let scratch = TempDir::new().unwrap();
            let yarn = scratch.path().join("yarn");
            fs::write(
                &yarn,
                "#!/bin/sh\nif [ \"$1\" = install ]; then echo 'lockfile out of date' >&2; exit 1; fi\n",
            )
            .unwrap();
            fs::set_permissions(&yarn, fs::Permissions::from_mode(0o755)).unwrap();

            yarn_install()
                .args(["build", "--build", "--app-dir"])
                .arg(app.path())
                .arg("--layers-dir")
                .arg(scratch.path().join("layers"))
                .arg("--temp-dir")
                .arg(scratch.path().join("tmp"))
                .arg("--yarn")
                .arg(&yarn)
                .assert()
                .failure()
                .stderr(predicate::str::contains("failed to execute install"))
                .stderr(predicate::str::contains("lockfile out of date"));
        }
    }
}
