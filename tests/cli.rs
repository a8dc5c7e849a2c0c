use assert_cmd::Command;

#[test]
fn help_lists_timer_and_account_flags() {
    let output = Command::cargo_bin("tomato")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--work-mins",
        "--break-mins",
        "--no-bell",
        "--data-dir",
        "--provider-cmd",
        "--log-level",
    ] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn refuses_to_run_without_a_tty() {
    let tmp = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("tomato")
        .unwrap()
        .arg("--data-dir")
        .arg(tmp.path())
        .write_stdin("")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin must be a tty"));
}
