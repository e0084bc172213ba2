use predicates::prelude::*;
use std::fs;

fn doty() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("doty").into()
}

fn fixture_path(name: &str) -> String {
    format!(
        "{}/tests/fixtures/{}.doty",
        env!("CARGO_MANIFEST_DIR"),
        name
    )
}

fn write_source(dir: &tempfile::TempDir, name: &str, source: &str) -> String {
    let file = dir.path().join(name);
    fs::write(&file, source).unwrap();
    file.to_str().unwrap().to_string()
}

// ── checking ────────────────────────────────────────────────

#[test]
fn check_generic_instantiation() {
    doty()
        .arg(fixture_path("generic"))
        .assert()
        .success()
        .stdout("module id\nmodule top\n- final p = u32 @A\n- final q = u32 @B\n")
        .stderr("");
}

#[test]
fn check_clock_domains_flow_through_calls() {
    doty()
        .arg(fixture_path("clocks"))
        .assert()
        .success()
        .stdout(predicate::str::contains("- final first = u32 @F"))
        .stdout(predicate::str::contains("- final late = u32 @F"));
}

#[test]
fn check_mixed_domains_fails() {
    let path = fixture_path("mixed_domains");
    doty()
        .arg(&path)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains(
            "error: incompatible domains: `A` and `B`",
        ))
        .stderr(predicate::str::contains(format!("{}:6:7:", path)))
        .stderr(predicate::str::contains("  |     p = q;\n  |       ^"));
}

#[test]
fn check_redefinition_points_at_both_names() {
    let path = fixture_path("redefined");
    doty()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: name `x` already defined"))
        .stderr(predicate::str::contains(format!("{}:3:9:", path)))
        .stderr(predicate::str::contains(
            "info: previous definition of `x` was here",
        ))
        .stderr(predicate::str::contains(format!("{}:2:9:", path)));
}

#[test]
fn check_unknown_domain_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "unknown.doty", "mod m() {\n  let y: u32@Foo;\n}\n");
    doty()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: unknown name `Foo`"))
        .stderr(predicate::str::contains(format!("{}:2:14:", path)))
        .stderr(predicate::str::contains("  |   let y: u32@Foo;\n  |              ^^^"));
}

#[test]
fn check_parse_error_reports_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "bad.doty", "mod m() {");
    doty()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "error: expected RCURLY, found EOF",
        ))
        .stderr(predicate::str::contains(format!("{}:1:10:", path)));
}

#[test]
fn check_lex_error_reports_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "lex.doty", "mod m() { $ }");
    doty()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: unknown character `$`"))
        .stderr(predicate::str::contains(format!("{}:1:11:", path)));
}

#[test]
fn check_type_error_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "arity.doty",
        "mod id<D>(x: u32@D) -> (y: u32@D) {}\nmod top(a: u32) { id(a, a); }\n",
    );
    doty()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "invalid number of call arguments; `id` expects 1, but call provides 2",
        ));
}

#[test]
fn missing_file_reports_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.doty");
    doty()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error: unable to open file: "));
}

// ── dumps ───────────────────────────────────────────────────

#[test]
fn dump_tokens_lists_each_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "t.doty", "mod m() {} // done\n");
    doty()
        .args(["--dump-tokens", &path])
        .assert()
        .success()
        .stdout(
            "- KW_MOD: `mod`\n- IDENT: `m`\n- LPAREN: `(`\n- RPAREN: `)`\n- LCURLY: `{`\n- RCURLY: `}`\n",
        );
}

#[test]
fn dump_tokens_skips_later_stages() {
    // Lexes fine but would not parse.
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "t.doty", "let 42");
    doty()
        .args(["--dump-tokens", &path])
        .assert()
        .success()
        .stdout("- KW_LET: `let`\n- LIT_NUM: `42`\n");
}

#[test]
fn dump_ast_prints_tree() {
    doty()
        .args(["--dump-ast", &fixture_path("generic")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Root\n|-items[0]: ModItem"))
        .stdout(predicate::str::contains("binding=").not());
}

#[test]
fn dump_ast_skips_name_resolution() {
    doty()
        .args(["--dump-ast", &fixture_path("redefined")])
        .assert()
        .success();
}

#[test]
fn dump_resolved_shows_bindings() {
    doty()
        .args(["--dump-resolved", &fixture_path("generic")])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "DomainIdent @1 \"D\" binding=ModTypeParam(@0)",
        ));
}

#[test]
fn dump_flags_are_exclusive() {
    doty()
        .args(["--dump-ast", "--dump-tokens", &fixture_path("generic")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
