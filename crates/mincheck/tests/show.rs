use anyhow::Result;
use assert_fs::prelude::*;
use indoc::indoc;

use crate::common::{TestContext, mincheck_snapshot};

mod common;

const REQUIREMENTS: &str = indoc! {"
    --index-url https://pypi.org/simple
    -c minimum-constraints.txt
    PyYAML>=5.3.1
    pywin32>=303; sys_platform == 'win32'
    -e ./local-package
"};

const CONSTRAINTS: &str = indoc! {"
    PyYAML==5.3.1
    pywin32==303; sys_platform == 'win32'
"};

#[test]
fn show_environment() -> Result<()> {
    let context = TestContext::new();
    context
        .temp_dir
        .child("requirements.txt")
        .write_str(REQUIREMENTS)?;
    context
        .temp_dir
        .child("minimum-constraints.txt")
        .write_str(CONSTRAINTS)?;

    mincheck_snapshot!(context.show()
        .arg("requirements.txt")
        .arg("--python-version")
        .arg("3.11")
        .arg("--platform")
        .arg("windows"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    Requirements for py3.11-windows (2 entries):
      pyyaml>=5.3.1 (requirements.txt:3)
      pywin32>=303 ; sys_platform == 'win32' (requirements.txt:4)
    Constraints for py3.11-windows (2 entries):
      pyyaml==5.3.1 (minimum-constraints.txt:1)
      pywin32==303 ; sys_platform == 'win32' (minimum-constraints.txt:2)
    Editables (not checked):
      ./local-package (requirements.txt:5)
    Index URL: https://pypi.org/simple

    ----- stderr -----
    "###
    );

    // Entries for other platforms are left out.
    mincheck_snapshot!(context.show()
        .arg("requirements.txt")
        .arg("--platform")
        .arg("linux"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    Requirements for py3.12-linux (1 entry):
      pyyaml>=5.3.1 (requirements.txt:3)
    Constraints for py3.12-linux (1 entry):
      pyyaml==5.3.1 (minimum-constraints.txt:1)
    Editables (not checked):
      ./local-package (requirements.txt:5)
    Index URL: https://pypi.org/simple

    ----- stderr -----
    "###
    );

    Ok(())
}

#[test]
fn show_json() -> Result<()> {
    let context = TestContext::new();
    context
        .temp_dir
        .child("requirements.txt")
        .write_str(REQUIREMENTS)?;
    context
        .temp_dir
        .child("minimum-constraints.txt")
        .write_str(CONSTRAINTS)?;

    mincheck_snapshot!(context.show()
        .arg("requirements.txt")
        .arg("--platform")
        .arg("linux")
        .arg("--output-format")
        .arg("json"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    {
      "environment": "py3.12-linux",
      "requirements": [
        {
          "name": "pyyaml",
          "specification": "pyyaml>=5.3.1",
          "marker": null,
          "origin": {
            "path": "requirements.txt",
            "line": 3
          }
        }
      ],
      "constraints": [
        {
          "name": "pyyaml",
          "specification": "pyyaml==5.3.1",
          "marker": null,
          "origin": {
            "path": "minimum-constraints.txt",
            "line": 1
          }
        }
      ],
      "editables": [
        {
          "target": "./local-package",
          "origin": {
            "path": "requirements.txt",
            "line": 5
          }
        }
      ],
      "unnamed": [],
      "options": {
        "index-url": "https://pypi.org/simple",
        "extra-index-urls": [],
        "no-index": false,
        "find-links": [],
        "trusted-hosts": [],
        "pre": false,
        "prefer-binary": false,
        "only-binary": [],
        "no-binary": [],
        "require-hashes": false
      }
    }

    ----- stderr -----
    "###
    );

    Ok(())
}

#[test]
fn show_requires_files() {
    let context = TestContext::new();

    mincheck_snapshot!(context.show(), @r###"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    error: the following required arguments were not provided:
      <FILE>...

    Usage: mincheck show <FILE>...

    For more information, try '--help'.
    "###
    );
}
