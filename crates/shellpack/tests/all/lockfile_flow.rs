use predicates::prelude::*;

use crate::helpers::{TestContext, head_commit};

#[test]
fn freeze_wipe_restore_returns_to_the_pinned_commits() {
    let context = TestContext::new();
    let origin = context.origin("plug");
    context.write_config(&format!("pack '{origin}' as=plug\n"));

    context.shellpack().arg("install").assert().success();
    context.shellpack().arg("freeze").assert().success();
    let pinned = head_commit(&context.installed_repo("plug"));
    assert!(context.lockfile_path().exists());

    // The origin gains a commit after the freeze.
    let origin_repo = context.origin_repo("plug");
    fs_err::write(
        origin_repo.directory().join("extra.txt").as_std_path(),
        "extra",
    )
    .unwrap();
    origin_repo.add_all_and_commit("extra").unwrap();

    fs_err::remove_dir_all(context.data_dir().join("packages").as_std_path()).unwrap();
    context.shellpack().arg("restore").assert().success();

    assert_eq!(head_commit(&context.installed_repo("plug")), pinned);
    context
        .shellpack()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("in sync"));
}

#[test]
fn diff_reports_drift_after_an_update() {
    let context = TestContext::new();
    let origin = context.origin("plug");
    context.write_config(&format!("pack '{origin}' as=plug\n"));

    context.shellpack().arg("install").assert().success();
    context.shellpack().arg("freeze").assert().success();

    let origin_repo = context.origin_repo("plug");
    fs_err::write(
        origin_repo.directory().join("newer.txt").as_std_path(),
        "newer",
    )
    .unwrap();
    origin_repo.add_all_and_commit("newer").unwrap();

    context
        .shellpack()
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("updated plug"));

    context
        .shellpack()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("plug: drifted"));

    // Freezing again re-pins the new head.
    context.shellpack().arg("freeze").assert().success();
    context
        .shellpack()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("in sync"));
}

#[test]
fn diff_without_a_lockfile_is_a_user_error() {
    let context = TestContext::new();
    context
        .shellpack()
        .arg("diff")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("freeze"));
}

#[test]
fn local_packages_stay_out_of_the_lockfile() {
    let context = TestContext::new();
    let local_dir = context.data_dir().join("local-plug");
    fs_err::create_dir_all(local_dir.as_std_path()).unwrap();
    let remote = context.origin("remote-plug");
    context.write_config(&format!(
        "pack '{local_dir}'\npack '{remote}' as=remote-plug\n"
    ));

    context.shellpack().arg("install").assert().success();
    context.shellpack().arg("freeze").assert().success();

    let lockfile = fs_err::read_to_string(context.lockfile_path().as_std_path()).unwrap();
    assert!(lockfile.contains("remote-plug|"));
    assert!(!lockfile.contains("local-plug"));
}
