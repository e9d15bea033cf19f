use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SMALL_POLICY: &str = r#"
permissions: [CRUD_STUDENT, VIEW_REPORTS]
roles:
  teacher: [CRUD_STUDENT]
routes:
  - route: /login
    public: true
  - route: /dashboard
  - route: /students
    permission: CRUD_STUDENT
  - route: /reports
    permission: VIEW_REPORTS
"#;

/// `campus` with the environment cleared of settings that would leak into
/// the tests.
fn campus() -> Command {
    let mut cmd = Command::cargo_bin("campus").unwrap();
    cmd.env_remove("POLICY_PATH")
        .env_remove("ACCOUNTS_PATH")
        .env_remove("LOGIN_ROUTE")
        .env_remove("FORBIDDEN_ROUTE")
        .env_remove("RUST_LOG")
        .env_remove("SESSION_TTL_MINUTES")
        .env("NO_COLOR", "1");
    cmd
}

fn write_policy(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("policy.yaml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_cli_help() {
    campus()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Campus CLI"))
        .stdout(predicate::str::contains("routes"));
}

#[test]
fn test_cli_version() {
    campus()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("campus"));
}

#[test]
fn test_routes_for_student() {
    campus()
        .args(["routes", "--role", "student"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/my/grades"))
        .stdout(predicate::str::contains("/students").not());
}

#[test]
fn test_routes_anonymous_json() {
    campus()
        .args(["routes", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"anonymous\""))
        .stdout(predicate::str::contains("/login"))
        .stdout(predicate::str::contains("/dashboard").not());
}

#[test]
fn test_unknown_role_rejected() {
    campus()
        .args(["routes", "--role", "janitor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("janitor"));
}

#[test]
fn test_check_allowed_and_denied() {
    campus()
        .args(["check", "--role", "teacher", "CRUD_GRADE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOWED"));

    campus()
        .args(["check", "--role", "teacher", "CRUD_PAYMENT"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("DENIED"));
}

#[test]
fn test_check_explicit_grant() {
    campus()
        .args([
            "check",
            "--role",
            "teacher",
            "--grant",
            "VIEW_REPORTS",
            "VIEW_REPORTS",
        ])
        .assert()
        .success();
}

#[test]
fn test_check_superuser_unknown_code() {
    campus()
        .args(["check", "--role", "superuser", "NOT_IN_ANY_TABLE", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"allowed\": true"));
}

#[test]
fn test_check_all_versus_any() {
    campus()
        .args(["check", "--role", "student", "CRUD_PAYMENT", "VIEW_OWN_GRADES"])
        .assert()
        .success();

    campus()
        .args([
            "check",
            "--role",
            "student",
            "--all",
            "CRUD_PAYMENT",
            "VIEW_OWN_GRADES",
        ])
        .assert()
        .code(2);
}

#[test]
fn test_navigate_redirects() {
    campus()
        .args(["navigate", "/reports"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("/login"));

    campus()
        .args(["navigate", "--role", "student", "/reports", "--format", "json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"redirect\""))
        .stdout(predicate::str::contains("/unauthorized"));

    campus()
        .args(["navigate", "--role", "teacher", "/students"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"));
}

#[test]
fn test_registry_show_yaml() {
    campus()
        .args(["registry", "show", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MANAGE_PERMISSIONS"))
        .stdout(predicate::str::contains("unregistered_routes: deny"));
}

#[test]
fn test_registry_show_text() {
    campus()
        .args(["registry", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Permission Registry"))
        .stdout(predicate::str::contains("/my/payments"));
}

#[test]
fn test_custom_policy() {
    let (_dir, path) = write_policy(SMALL_POLICY);

    campus()
        .arg("--policy")
        .arg(&path)
        .args(["routes", "--role", "teacher"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/students"))
        .stdout(predicate::str::contains("/reports").not())
        .stdout(predicate::str::contains("Total: 3"));
}

#[test]
fn test_policy_from_env() {
    let (_dir, path) = write_policy(SMALL_POLICY);

    campus()
        .env("POLICY_PATH", &path)
        .args(["check", "--role", "teacher", "CRUD_GRADE"])
        .assert()
        .code(2);
}

#[test]
fn test_registry_validate() {
    let (_dir, path) = write_policy(SMALL_POLICY);

    campus()
        .args(["registry", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 permissions, 4 routes"));
}

#[test]
fn test_registry_validate_rejects_undeclared_code() {
    let (_dir, path) = write_policy(
        r#"
permissions: [CRUD_STUDENT]
routes:
  - route: /reports
    permission: VIEW_REPORTS
"#,
    );

    campus()
        .args(["registry", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("VIEW_REPORTS"));
}

#[test]
fn test_hash_password() {
    campus()
        .args(["hash-password", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("$argon2"));
}

#[test]
fn test_hash_password_from_stdin() {
    campus()
        .arg("hash-password")
        .write_stdin("secret\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("$argon2"));
}

#[test]
fn test_serve_rejects_session_ttl_out_of_range() {
    for ttl in ["0", "-5", "525601"] {
        campus()
            .args(["serve", "--port", "0"])
            .arg(format!("--session-ttl={}", ttl))
            .assert()
            .failure()
            .stderr(predicate::str::contains("--session-ttl"));
    }
}
