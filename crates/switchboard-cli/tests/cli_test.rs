use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use rstest::rstest;

fn write_catalog(dir: &std::path::Path) {
    std::fs::create_dir_all(dir.join("providers")).unwrap();
    std::fs::write(
        dir.join("switchboard.yaml"),
        "name: cli-catalog\nvars:\n  region: eu\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("providers/acme.yaml"),
        r#"
name: acme
displayName: Acme
authType: none
baseURL: "https://{{.workspace}}.{{.region}}.acme.io"
defaultModule: core
modules:
  core:
    baseURL: "https://{{.workspace}}.{{.region}}.acme.io/core"
    displayName: Acme Core
"#,
    )
    .unwrap();
}

#[test]
fn test_list_embedded_catalog() {
    cargo_bin_cmd!("switchboard")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("salesforce"))
        .stdout(predicate::str::contains("zendeskSupport"));
}

#[test]
fn test_show_resolves_workspace() {
    let output = cargo_bin_cmd!("switchboard")
        .args(["show", "salesforce", "--workspace", "test"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["baseURL"], "https://test.my.salesforce.com");
    assert_eq!(json["name"], "salesforce");
}

#[test]
fn test_show_missing_variable_fails() {
    cargo_bin_cmd!("switchboard")
        .args(["show", "salesforce"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing substitution"));
}

#[rstest]
#[case("jira", "jira", false)]
#[case("bitbucket", "jira", true)]
fn test_show_module_selection(
    #[case] requested: &str,
    #[case] expected: &str,
    #[case] fallback: bool,
) {
    let output = cargo_bin_cmd!("switchboard")
        .args(["show", "atlassian", "--var", "cloudId=c-1", "--module", requested])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["module"], expected);
    assert_eq!(json["fallback"], fallback);
}

#[test]
fn test_show_raw_keeps_placeholders() {
    cargo_bin_cmd!("switchboard")
        .args(["show", "salesforce", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{{.workspace}}"));
}

#[test]
fn test_show_unknown_provider() {
    cargo_bin_cmd!("switchboard")
        .args(["show", "nope", "--workspace", "w"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider not found: nope"));
}

#[test]
fn test_project_catalog_uses_configured_vars() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    let catalog = dir.path().to_str().unwrap();

    cargo_bin_cmd!("switchboard")
        .args(["--catalog", catalog, "list"])
        .assert()
        .success()
        .stdout("acme\n");

    let output = cargo_bin_cmd!("switchboard")
        .args(["--catalog", catalog, "show", "acme", "-w", "t1"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["baseURL"], "https://t1.eu.acme.io");
    assert_eq!(json["modules"]["core"]["baseURL"], "https://t1.eu.acme.io/core");
}

#[test]
fn test_export_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("catalog.json");

    cargo_bin_cmd!("switchboard")
        .args(["export", "--output", out.to_str().unwrap()])
        .assert()
        .success();

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(
        exported["salesforce"]["baseURL"],
        "https://{{.workspace}}.my.salesforce.com"
    );
    assert_eq!(exported["hubspot"]["defaultModule"], "crm");
}

#[test]
fn test_validate_embedded_catalog() {
    cargo_bin_cmd!("switchboard")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ stripe"));
}

#[test]
fn test_validate_reports_invalid_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    std::fs::write(
        dir.path().join("providers/broken.yaml"),
        "name: broken\nauthType: none\nbaseURL: \"https://{{.workspace\"\n",
    )
    .unwrap();

    cargo_bin_cmd!("switchboard")
        .args(["--catalog", dir.path().to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken"));
}

#[test]
fn test_missing_catalog_config() {
    let dir = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("switchboard")
        .args(["--catalog", dir.path().to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
