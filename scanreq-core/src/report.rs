//! Console and file output.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::json;

use crate::builder::{AnalysisResult, ScanEvent, UnusedFinding};
use crate::error::{IoResultExt, ScanreqResult};

/// Printed before any work starts.
pub const WAIT_NOTICE: &str = "\n[i] Please wait! It may take few minutes to complete...";

/// Printed once requirements and distributions are loaded.
pub const SCANNING_HEADER: &str = "[i] Scanning unused packages:";

/// Printed when nothing is unused.
pub const NO_UNUSED_MESSAGE: &str = "[i] Great! No unused packages found.";

/// Formats one report line: ` 1.  Module: yaml                          -> Package: pyyaml`.
pub fn format_finding(finding: &UnusedFinding) -> String {
    let number = format!("{}.", finding.index);
    format!(
        " {:<4}Module: {:<30}-> Package: {}",
        number, finding.module, finding.package
    )
}

/// Writes scan progress: the header when scanning starts, then one line per finding.
pub fn write_event(out: &mut dyn Write, event: ScanEvent<'_>) -> io::Result<()> {
    match event {
        ScanEvent::Started { .. } => writeln!(out, "{}", SCANNING_HEADER),
        ScanEvent::Unused(finding) => writeln!(out, "{}", format_finding(finding)),
    }
}

/// Writes the closing line of the plain report.
pub fn write_plain(out: &mut dyn Write, result: &AnalysisResult) -> io::Result<()> {
    if !result.has_unused() {
        writeln!(out, "{}", NO_UNUSED_MESSAGE)?;
    }
    Ok(())
}

/// Prints the whole result as JSON.
pub fn print_json(result: &AnalysisResult) {
    let value = json!({
        "project": result.project.display().to_string(),
        "unused": result.unused,
        "unresolved": result.unresolved,
        "scanned_modules": result.scanned_modules,
        "findings": result.findings,
    });
    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"unused\": {:?}}}", result.unused);
        }
    }
}

/// Renders unused names one per line with a trailing newline.
pub fn render_output(unused: &BTreeSet<String>) -> String {
    let mut out = String::new();
    for name in unused {
        out.push_str(name);
        out.push('\n');
    }
    out
}

/// Writes unused names to `path`, replacing any existing file.
///
/// Nothing is written when `unused` is empty. Returns whether the file was written.
pub fn write_output(path: &Path, unused: &BTreeSet<String>) -> ScanreqResult<bool> {
    if unused.is_empty() {
        return Ok(false);
    }
    fs::write(path, render_output(unused)).with_path(path)?;
    tracing::info!(path = %path.display(), count = unused.len(), "wrote unused packages");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(index: usize, module: &str, package: &str) -> UnusedFinding {
        UnusedFinding {
            index,
            module: module.into(),
            package: package.into(),
        }
    }

    #[test]
    fn test_format_finding_layout() {
        let line = format_finding(&finding(1, "yaml", "pyyaml"));
        assert_eq!(line, format!(" 1.  Module: yaml{}-> Package: pyyaml", " ".repeat(26)));
    }

    #[test]
    fn test_format_finding_wide_index() {
        let line = format_finding(&finding(1234, "google", "protobuf"));
        assert!(line.starts_with(" 1234.Module: google "));
    }

    #[test]
    fn test_format_finding_long_module() {
        let module = "m".repeat(35);
        let line = format_finding(&finding(2, &module, "pkg"));
        assert_eq!(line, format!(" 2.  Module: {}-> Package: pkg", module));
    }

    #[test]
    fn test_write_event_lines() {
        let found = finding(3, "redis", "redis");
        let mut out = Vec::new();
        write_event(&mut out, ScanEvent::Started { requirements: 1, modules: 1 }).unwrap();
        write_event(&mut out, ScanEvent::Unused(&found)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            format!("{}\n{}\n", SCANNING_HEADER, format_finding(&found))
        );
    }

    #[test]
    fn test_render_output() {
        let unused: BTreeSet<String> = ["redis".to_string(), "celery".to_string()].into();
        assert_eq!(render_output(&unused), "celery\nredis\n");
    }

    #[test]
    fn test_write_output_skips_empty() {
        let path = std::env::temp_dir()
            .join(format!("scanreq_report_empty_{}.txt", std::process::id()));
        fs::remove_file(&path).ok();
        assert!(!write_output(&path, &BTreeSet::new()).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_output_truncates() {
        let path = std::env::temp_dir()
            .join(format!("scanreq_report_out_{}.txt", std::process::id()));
        fs::write(&path, "stale\nstale\nstale\n").unwrap();
        let unused: BTreeSet<String> = ["pyyaml".to_string()].into();
        assert!(write_output(&path, &unused).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "pyyaml\n");
        fs::remove_file(&path).ok();
    }
}
