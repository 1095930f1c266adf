use predicates::prelude::*;

use crate::helpers::TestContext;

#[test]
fn help_and_version_always_exit_zero() {
    let context = TestContext::new();
    context
        .shellpack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("freeze"));
    context
        .shellpack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shellpack"));
}

#[test]
fn list_exits_zero_even_with_nothing_declared() {
    let context = TestContext::new();
    context.shellpack().arg("list").assert().success();
}

#[test]
fn list_shows_declared_packages_with_their_state() {
    let context = TestContext::new();
    context.write_config(
        "pack user/never-installed as=never tag=v9\npack user/off disabled=true\n",
    );

    context
        .shellpack()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("never"))
        .stdout(predicate::str::contains("missing"))
        .stdout(predicate::str::contains("disabled"));

    context
        .shellpack()
        .args(["list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"missing\""));
}

#[test]
fn info_shows_the_declaration_and_fails_on_unknown_names() {
    let context = TestContext::new();
    context.write_config("pack user/repo tag=v1 depends=(other)\n");

    context
        .shellpack()
        .args(["info", "repo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://github.com/user/repo.git"))
        .stdout(predicate::str::contains("tag=v1"));

    context
        .shellpack()
        .args(["info", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown package"));
}

#[test]
fn path_prints_the_working_tree_location() {
    let context = TestContext::new();
    context.write_config("pack user/repo\n");

    context
        .shellpack()
        .args(["path", "repo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("packages/repo"));
}

#[test]
fn remove_deletes_the_managed_tree() {
    let context = TestContext::new();
    let origin = context.origin("plug");
    context.write_config(&format!("pack '{origin}' as=plug\n"));
    context.shellpack().arg("install").assert().success();
    assert!(context.package_dir("plug").exists());

    context.shellpack().args(["remove", "plug"]).assert().success();
    assert!(!context.package_dir("plug").exists());

    context
        .shellpack()
        .args(["remove", "never-declared"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown package"));
}

#[test]
fn run_executes_inside_the_package_directory() {
    let context = TestContext::new();
    let origin = context.origin("plug");
    context.write_config(&format!("pack '{origin}' as=plug\n"));
    context.shellpack().arg("install").assert().success();

    context
        .shellpack()
        .args(["run", "--pkg", "plug", "ls", "init.zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init.zsh"));
}

#[test]
fn doctor_reports_missing_installs() {
    let context = TestContext::new();
    context.write_config("pack user/not-here as=not-here\n");

    context
        .shellpack()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("not-here"))
        .stdout(predicate::str::contains("not installed"));
}

#[test]
fn completions_cover_the_subcommands() {
    let context = TestContext::new();
    context
        .shellpack()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("freeze"));
}
