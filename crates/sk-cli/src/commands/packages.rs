//! Packages command for listing configured package windows.

use std::io::Write;

use anyhow::Result;
use sk_core::{PackageWindow, format_duration};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    if config.packages.is_empty() {
        writeln!(writer, "No packages configured.")?;
        return Ok(());
    }

    writeln!(writer, "Packages:")?;
    for (name, package) in &config.packages {
        match PackageWindow::parse(&package.start, &package.end) {
            Ok(window) => writeln!(
                writer,
                "- {name}: {}-{} ({})",
                window.start,
                window.end,
                format_duration(u64::from(window.allowed_seconds()))
            )?,
            Err(err) => writeln!(writer, "- {name}: {err}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;

    use insta::assert_snapshot;
    use sk_core::PackageInput;

    #[test]
    fn packages_lists_windows_with_allowance() {
        let config = Config {
            database_path: PathBuf::from("unused.db"),
            packages: BTreeMap::from([
                ("standard".to_string(), PackageInput::new("8:00", "20:00")),
                ("night".to_string(), PackageInput::new("22:00", "06:00")),
                ("broken".to_string(), PackageInput::new("noon", "13:00")),
            ]),
        };
        let mut output = Vec::new();

        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r#"
        Packages:
        - broken: invalid time of day: "noon"
        - night: 22:00:00-06:00:00 (8h 0m)
        - standard: 08:00:00-20:00:00 (12h 0m)
        "#);
    }

    #[test]
    fn packages_empty() {
        let config = Config {
            database_path: PathBuf::from("unused.db"),
            packages: BTreeMap::new(),
        };
        let mut output = Vec::new();

        run(&mut output, &config).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "No packages configured.\n");
    }
}
