//! CLI integration tests for cda-graph binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cda-graph"))
}

// Helper to create a temp input file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const CATS: &str = r#"{
    "sys": { "type": "Array" },
    "skip": 0,
    "limit": 100,
    "total": 1,
    "items": [{
        "sys": { "type": "Entry", "id": "happycat", "contentType": { "sys": { "id": "cat" } } },
        "fields": {
            "lives": "9",
            "bestFriend": { "sys": { "type": "Link", "linkType": "Entry", "id": "nyancat" } },
            "image": { "sys": { "type": "Link", "linkType": "Asset", "id": "happycat" } }
        }
    }],
    "includes": {
        "Entry": [{
            "sys": { "type": "Entry", "id": "nyancat", "contentType": { "sys": { "id": "cat" } } },
            "fields": {
                "bestFriend": { "sys": { "type": "Link", "linkType": "Entry", "id": "happycat" } }
            }
        }]
    }
}"#;

const CAT_SCHEMA: &str = r#"[{
    "content_type": "cat",
    "fields": [
        { "name": "lives", "type": "Number" },
        { "name": "best_friend", "type": "Link", "id": "bestFriend" }
    ]
}]"#;

mod decode_command {
    use super::*;

    #[test]
    fn resolves_links_by_default() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "cats.json", CATS);

        cmd()
            .args(["decode", page.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""resolved":true"#));
    }

    #[test]
    fn no_resolve_keeps_placeholders() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "cats.json", CATS);

        cmd()
            .args(["decode", page.to_str().unwrap(), "--no-resolve"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""resolved""#).not());
    }

    #[test]
    fn schema_adds_typed_view() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "cats.json", CATS);
        let schema = write_temp_file(&dir, "cat.schema.json", CAT_SCHEMA);

        let output = cmd()
            .args([
                "decode",
                page.to_str().unwrap(),
                "--schema",
                schema.to_str().unwrap(),
            ])
            .output()
            .unwrap();
        assert!(output.status.success());

        let rendered: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let happy = &rendered["items"][0];
        assert_eq!(happy["typed"]["lives"], 9);
        assert_eq!(happy["fields"]["lives"], "9");
        assert_eq!(happy["typed"]["best_friend"]["sys"]["id"], "nyancat");
    }

    #[test]
    fn summary_lists_unresolved() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "cats.json", CATS);

        let output = cmd()
            .args(["decode", page.to_str().unwrap(), "--summary"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(summary["items"], 1);
        assert_eq!(summary["entries"], 2);
        assert_eq!(summary["unresolved"][0]["link"], "Asset:happycat");
    }

    #[test]
    fn pretty_output() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "cats.json", CATS);

        cmd()
            .args(["decode", page.to_str().unwrap(), "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\n  \"items\""));
    }

    #[test]
    fn output_to_file() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "cats.json", CATS);
        let out = dir.path().join("out.json");

        cmd()
            .args([
                "decode",
                page.to_str().unwrap(),
                "--output",
                out.to_str().unwrap(),
            ])
            .assert()
            .success();

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("happycat"));
    }

    #[test]
    fn missing_file_exits_3() {
        cmd()
            .args(["decode", "/nonexistent/page.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_exits_2() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "broken.json", "{ not json");

        cmd()
            .args(["decode", page.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn unsupported_resource_exits_2() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(
            &dir,
            "link.json",
            r#"{"sys": {"type": "Link", "linkType": "Entry", "id": "x"}}"#,
        );

        cmd()
            .args(["decode", page.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unsupported resource type"));
    }

    #[test]
    fn coercion_error_exits_2() {
        let dir = TempDir::new().unwrap();
        let page = write_temp_file(&dir, "cats.json", &CATS.replace(r#""9""#, r#""nine""#));
        let schema = write_temp_file(&dir, "cat.schema.json", CAT_SCHEMA);

        cmd()
            .args([
                "decode",
                page.to_str().unwrap(),
                "--schema",
                schema.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("field 'lives'"));
    }
}

#[cfg(feature = "remote")]
mod decode_remote {
    use super::*;

    #[test]
    fn decodes_from_url() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/spaces/cfexample/entries")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CATS)
            .create();

        let url = format!("{}/spaces/cfexample/entries", server.url());
        cmd()
            .args(["decode", url.as_str(), "--summary"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""entries":2"#));
    }

    #[test]
    fn http_error_exits_3() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/gone").with_status(404).create();

        let url = format!("{}/gone", server.url());
        cmd()
            .args(["decode", url.as_str()])
            .assert()
            .code(3);
    }
}

mod check_schema_command {
    use super::*;

    #[test]
    fn lists_content_types() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "cat.schema.json", CAT_SCHEMA);

        cmd()
            .args(["check-schema", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 content type(s)"))
            .stdout(predicate::str::contains("cat (2 fields)"));
    }

    #[test]
    fn rejects_duplicate_fields() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "dup.schema.json",
            r#"{"content_type": "cat", "fields": [
                {"name": "lives", "type": "Number"},
                {"name": "lives", "type": "Text"}
            ]}"#,
        );

        cmd()
            .args(["check-schema", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("more than once"));
    }

    #[test]
    fn rejects_unknown_field_type() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "bad.schema.json",
            r#"{"content_type": "cat", "fields": [{"name": "lives", "type": "Integer"}]}"#,
        );

        cmd()
            .args(["check-schema", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid schema descriptor"));
    }

    #[test]
    fn missing_file_exits_3() {
        cmd()
            .args(["check-schema", "/nonexistent/schema.json"])
            .assert()
            .code(3);
    }
}
