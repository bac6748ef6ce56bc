//! Tests for the `srcmark` binary: files written, JSON printed, exit codes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const FUNC: &str = "int f(int x) {\n    if (x)\n        return 1;\n    return 0;\n}\n";

fn srcmark(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_srcmark"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run srcmark")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

mod annotate {
    use super::*;

    #[test]
    fn writes_suffixed_file_next_to_input() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), FUNC).unwrap();

        let output = srcmark(dir.path(), &["annotate", "f.c"]);
        assert!(output.status.success());

        let json = stdout_json(&output);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["files"][0]["written"], true);
        assert_eq!(json["files"][0]["edits"].as_array().unwrap().len(), 4);

        let annotated = fs::read_to_string(dir.path().join("fM.c")).unwrap();
        assert!(annotated.starts_with("// Begin function f returning int\n"));
        assert!(annotated.contains(
            "\n        // the 'if' part\n        return 1;\n        // end of the 'if' part\n"
        ));
        assert!(annotated.ends_with("}\n// End function f\n"));
        // Input untouched
        assert_eq!(fs::read_to_string(dir.path().join("f.c")).unwrap(), FUNC);
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), FUNC).unwrap();

        let output = srcmark(dir.path(), &["annotate", "--dry-run", "f.c"]);
        assert!(output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["files"][0]["written"], false);
        assert_eq!(json["files"][0]["edits"][0]["line"], 1);
        assert_eq!(json["files"][0]["edits"][0]["placement"], "before");
        assert!(!dir.path().join("fM.c").exists());
    }

    #[test]
    fn stdout_prints_annotated_text() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), "int g();\n").unwrap();

        let output = srcmark(dir.path(), &["annotate", "--stdout", "g.c"]);
        assert_eq!(output.status.code(), Some(3));

        let output = srcmark(dir.path(), &["annotate", "--stdout", "f.c"]);
        assert!(output.status.success());
        assert_eq!(String::from_utf8(output.stdout).unwrap(), "int g();\n");
        assert!(!dir.path().join("fM.c").exists());
    }

    #[test]
    fn no_indent_flag_leaves_markers_at_column_zero() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), FUNC).unwrap();

        let output = srcmark(dir.path(), &["annotate", "--stdout", "--no-indent", "f.c"]);
        assert!(output.status.success());
        let text = String::from_utf8(output.stdout).unwrap();
        assert!(text.contains("\n// the 'if' part\nreturn 1;\n// end of the 'if' part\n"));
    }

    #[test]
    fn rule_and_suffix_flags() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), FUNC).unwrap();

        let output = srcmark(
            dir.path(),
            &["annotate", "--rule", "conditional", "--suffix", ".ann", "f.c"],
        );
        assert!(output.status.success());
        let annotated = fs::read_to_string(dir.path().join("f.ann.c")).unwrap();
        assert!(annotated.contains("// the 'if' part"));
        assert!(!annotated.contains("Begin function"));
    }

    #[test]
    fn config_file_in_working_directory_is_used() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), FUNC).unwrap();
        fs::write(
            dir.path().join("srcmark.json"),
            r#"{"rules": [], "output": {"directory": "out"}}"#,
        )
        .unwrap();

        let output = srcmark(dir.path(), &["annotate", "f.c"]);
        assert!(output.status.success());
        let annotated = fs::read_to_string(dir.path().join("out").join("fM.c")).unwrap();
        assert_eq!(annotated, FUNC);
    }

    #[test]
    fn first_failure_stops_the_run() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.c"), FUNC).unwrap();
        fs::write(dir.path().join("b.c"), "int broken( {\n").unwrap();
        fs::write(dir.path().join("c.c"), FUNC).unwrap();

        let output = srcmark(dir.path(), &["annotate", "a.c", "b.c", "c.c"]);
        assert_eq!(output.status.code(), Some(3));

        let json = stdout_json(&output);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], 3);
        assert!(json["error"]["location"]["file"]
            .as_str()
            .unwrap()
            .ends_with("b.c"));

        assert!(dir.path().join("aM.c").exists());
        assert!(!dir.path().join("bM.c").exists());
        assert!(!dir.path().join("cM.c").exists());
    }

    #[test]
    fn invalid_config_is_exit_code_two() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), FUNC).unwrap();
        fs::write(
            dir.path().join("bad.json"),
            r#"{"markers": {"function_open": "{nope}"}}"#,
        )
        .unwrap();

        let output = srcmark(dir.path(), &["--config", "bad.json", "annotate", "f.c"]);
        assert_eq!(output.status.code(), Some(2));
        assert_eq!(stdout_json(&output)["error"]["code"], 2);
        assert!(!dir.path().join("fM.c").exists());
    }

    #[test]
    fn missing_input_is_exit_code_three() {
        let dir = TempDir::new().unwrap();
        let output = srcmark(dir.path(), &["annotate", "missing.c"]);
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(stdout_json(&output)["error"]["details"]["path"], "missing.c");
    }
}

mod dump {
    use super::*;

    #[test]
    fn prints_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.c"), FUNC).unwrap();

        let output = srcmark(dir.path(), &["dump", "f.c"]);
        assert!(output.status.success());
        let text = String::from_utf8(output.stdout).unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("translation_unit [0, "));
        assert!(text.contains("  function_decl [0, "));
        assert!(text.contains("f -> int"));
        assert!(text.contains("consequence: return_statement"));
    }
}
