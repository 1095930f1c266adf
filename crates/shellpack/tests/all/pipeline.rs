use predicates::prelude::*;

use crate::helpers::TestContext;

#[test]
fn install_clones_in_dependency_order_and_emits_shell_code() {
    let context = TestContext::new();
    let origin_a = context.origin("a");
    let origin_b = context.origin("b");
    context.write_config(&format!(
        "pack '{origin_b}' as=b depends=(a) env=(B_READY=1)\npack '{origin_a}' as=a\n"
    ));

    let assert = context.shellpack().arg("install").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert!(context.package_dir("a").join(".git").exists());
    assert!(context.package_dir("b").join(".git").exists());
    // The dependency's entry point is sourced before the dependent's.
    let source_a = stdout.find("a/init.zsh").expect("a sourced");
    let source_b = stdout.find("b/init.zsh").expect("b sourced");
    assert!(source_a < source_b);
    assert!(stdout.contains("export B_READY='1'"));
}

#[test]
fn a_dependency_cycle_is_a_fatal_logic_error() {
    let context = TestContext::new();
    context.write_config("pack user/a depends=(b)\npack user/b depends=(a)\n");

    context
        .shellpack()
        .arg("install")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("dependency cycle"))
        .stderr(predicate::str::contains("a"))
        .stderr(predicate::str::contains("b"));
}

#[test]
fn version_constraint_mismatches_warn_but_do_not_fail() {
    let context = TestContext::new();
    let origin_x = context.origin("x");
    let origin_y = context.origin("y");
    context.write_config(&format!(
        "pack '{origin_x}' as=x tag=v1\npack '{origin_y}' as=y depends=(x@v2)\n"
    ));

    // tag=v1 doesn't exist in the origin, so the clone falls back to the
    // default branch; the constraint warning must still show up.
    context
        .shellpack()
        .arg("install")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "y depends on x@v2 but x is declared with tag=v1",
        ));
}

#[test]
fn failed_clones_exit_2_and_do_not_stop_siblings() {
    let context = TestContext::new();
    let good = context.origin("good");
    context.write_config(&format!(
        "pack 'file:///nonexistent/one' as=bad1\n\
         pack 'file:///nonexistent/two' as=bad2\n\
         pack '{good}' as=good\n"
    ));

    context
        .shellpack()
        .arg("install")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("bad1"))
        .stderr(predicate::str::contains("bad2"))
        .stderr(predicate::str::contains("2 package(s) failed"));

    assert!(context.package_dir("good").join(".git").exists());
    assert!(!context.package_dir("bad1").exists());
}

#[test]
fn installing_a_single_package_leaves_the_rest_alone() {
    let context = TestContext::new();
    let origin_one = context.origin("one");
    let origin_two = context.origin("two");
    context.write_config(&format!(
        "pack '{origin_one}' as=one\npack '{origin_two}' as=two\n"
    ));

    context
        .shellpack()
        .args(["install", "one"])
        .assert()
        .success();
    assert!(context.package_dir("one").join(".git").exists());
    assert!(!context.package_dir("two").exists());

    context
        .shellpack()
        .args(["install", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown package"));
}

#[test]
fn rejected_declarations_fail_the_install_but_not_the_rest() {
    let context = TestContext::new();
    let good = context.origin("good");
    context.write_config(&format!(
        "pack user/bad as='has space'\npack '{good}' as=good\n"
    ));

    context.shellpack().arg("install").assert().code(1);
    assert!(context.package_dir("good").join(".git").exists());
}
