use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::errors::{MinicodeError, Result};

const EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_LINES: usize = 10;

/// Output of running a script. Consumed by the orchestrator as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Execution result:\n\nStdout:\n{}\n\nStderr:\n{}\n\nExit code: {}",
            self.stdout, self.stderr, self.exit_code
        )
    }
}

/// Map a file extension to a language name, `unknown` if unsupported
pub fn detect_language(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js") => "javascript",
        Some("ts") => "typescript",
        Some("py") => "python",
        Some("rb") => "ruby",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("java") => "java",
        Some("cpp") => "cpp",
        Some("c") => "c",
        Some("sh") => "shell",
        _ => "unknown",
    }
}

fn execution_command(path: &Path, language: &str) -> Option<String> {
    let file = path.display();
    let stem = path.file_stem()?.to_string_lossy();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .display();

    let command = match language {
        "javascript" => format!("node \"{}\"", file),
        "typescript" => format!("tsx \"{}\"", file),
        "python" => format!("python3 \"{}\"", file),
        "ruby" => format!("ruby \"{}\"", file),
        "go" => format!("go run \"{}\"", file),
        "rust" => format!("rustc \"{file}\" -o \"{dir}/{stem}\" && \"{dir}/{stem}\""),
        "java" => format!("javac \"{file}\" && java -cp \"{dir}\" \"{stem}\""),
        "c" => format!("cc \"{file}\" -o \"{dir}/{stem}\" && \"{dir}/{stem}\""),
        "cpp" => format!("c++ \"{file}\" -o \"{dir}/{stem}\" && \"{dir}/{stem}\""),
        "shell" => format!("sh \"{}\"", file),
        _ => return None,
    };
    Some(command)
}

/// Run a source file with the toolchain for its language.
///
/// Script failures come back as a non-zero [`ExecutionResult`]; only failing to
/// spawn the shell at all is an error.
pub async fn execute_file(path: &Path, language: Option<&str>) -> Result<ExecutionResult> {
    let language = language.unwrap_or_else(|| detect_language(path));
    let Some(command) = execution_command(path, language) else {
        return Ok(ExecutionResult {
            stdout: String::new(),
            stderr: format!("Unsupported language: {}", language),
            exit_code: 1,
        });
    };

    tracing::debug!(%command, "executing script");
    let child = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| MinicodeError::Execution(format!("Failed to spawn shell: {}", e)))?;

    match tokio::time::timeout(EXECUTION_TIMEOUT, child.wait_with_output()).await {
        Ok(output) => {
            let output = output.map_err(|e| MinicodeError::Execution(e.to_string()))?;
            Ok(ExecutionResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code().unwrap_or(1),
            })
        }
        Err(_) => Ok(ExecutionResult {
            stdout: String::new(),
            stderr: format!(
                "Execution timed out after {} seconds",
                EXECUTION_TIMEOUT.as_secs()
            ),
            exit_code: 124,
        }),
    }
}

/// Keep the first few meaningful lines of an error report
pub fn analyze_error(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(MAX_ERROR_LINES)
        .collect();

    if lines.is_empty() {
        return "No error details available".to_string();
    }
    format!("Error analysis:\n{}", lines.join("\n"))
}
