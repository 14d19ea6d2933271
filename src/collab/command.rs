//! Running external tools.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::CollabError;

/// Lines of stderr kept in a failure report.
const STDERR_TAIL_LINES: usize = 20;

/// A program plus an argument template.
///
/// Arguments may contain `{name}` placeholders that are filled in when the
/// command runs. An argument that renders to an empty string is dropped, so
/// optional switches can be expressed as a single placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Substitutes `vars` into the argument template.
    pub fn render(&self, vars: &[(&str, String)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (key, value)| {
                    acc.replace(&format!("{{{}}}", key), value)
                })
            })
            .filter(|arg| !arg.is_empty())
            .collect()
    }
}

/// Removes a declared output left by an earlier run, so that only a file
/// written by the next tool invocation can satisfy the output check.
pub(super) fn clear_output(path: &Path) -> Result<(), CollabError> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// Runs `command` in `work_dir` and waits for it to finish.
///
/// Standard output is forwarded to the log at debug level under the tool's
/// name. A non-zero exit status is an error carrying the tail of stderr.
pub fn run_tool(
    name: &str,
    command: &ToolCommand,
    work_dir: &Path,
    vars: &[(&str, String)],
) -> Result<(), CollabError> {
    let args = command.render(vars);
    info!("Running {}: {} {}", name, command.program, args.join(" "));

    let output = Command::new(&command.program)
        .args(&args)
        .current_dir(work_dir)
        .output()
        .map_err(|source| CollabError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        debug!(target: "tool", "[{}] {}", name, line);
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CollabError::CommandFailed {
            program: command.program.clone(),
            status: output.status.to_string(),
            stderr: tail(stderr.trim(), STDERR_TAIL_LINES),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn render_substitutes_and_drops_empty() {
        let cmd = ToolCommand::new("convert", &["-m", "{input}", "-o", "{output}", "{spherical_flag}"]);
        let args = cmd.render(&[
            ("input", "mesh-MESH.msh".to_string()),
            ("output", "out.nc".to_string()),
            ("spherical_flag", String::new()),
        ]);
        assert_eq!(args, vec!["-m", "mesh-MESH.msh", "-o", "out.nc"]);
    }

    #[test]
    fn render_handles_embedded_placeholders() {
        let cmd = ToolCommand::new("tool", &["--elevation={elevation}", "{mesh}"]);
        let args = cmd.render(&[("elevation", "20".to_string()), ("mesh", "base_mesh.nc".to_string())]);
        assert_eq!(args, vec!["--elevation=20", "base_mesh.nc"]);
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempdir().unwrap();
        let cmd = ToolCommand::new("definitely-not-a-real-tool-4f1e", &[]);
        let err = run_tool("fake", &cmd, dir.path(), &[]).unwrap_err();
        assert!(matches!(err, CollabError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_stderr() {
        let dir = tempdir().unwrap();
        let cmd = ToolCommand::new("sh", &["-c", "echo first >&2; echo {msg} >&2; exit 3"]);
        let err = run_tool("sh", &cmd, dir.path(), &[("msg", "boom".to_string())]).unwrap_err();
        match err {
            CollabError::CommandFailed { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "first\nboom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_work_dir() {
        let dir = tempdir().unwrap();
        let cmd = ToolCommand::new("sh", &["-c", "touch {name}"]);
        run_tool("sh", &cmd, dir.path(), &[("name", "marker".to_string())]).unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn clear_output_removes_files_and_dirs() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("base_mesh.nc");
        let vtk = dir.path().join("base_mesh_vtk");
        std::fs::write(&file, b"stale").unwrap();
        std::fs::create_dir_all(vtk.join("nested")).unwrap();

        clear_output(&file).unwrap();
        clear_output(&vtk).unwrap();
        clear_output(&dir.path().join("absent.nc")).unwrap();
        assert!(!file.exists());
        assert!(!vtk.exists());
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
    }
}
