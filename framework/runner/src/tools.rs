use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::definition::BenchmarkDefinition;

/// A failed invocation of an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to launch {tool} '{program}'")]
    Launch {
        tool: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}{}", stderr_suffix(.stderr))]
    ExitStatus {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let last_line = stderr.lines().rev().find(|line| !line.trim().is_empty());
    match last_line {
        Some(line) => format!(": {}", line.trim()),
        None => String::new(),
    }
}

/// The external programs a benchmark drives.
///
/// Each method resolves once the collaborator has finished. Dropping the returned future abandons
/// the invocation.
pub trait BenchTools: Send + Sync {
    /// Run the solver once against `instance`, writing its result artifact to `artifact`.
    fn run_solver<'a>(
        &'a self,
        instance: &'a Path,
        artifact: &'a Path,
    ) -> BoxFuture<'a, Result<(), ToolError>>;

    /// Run the solver under the memory profiler, storing the profiler's log at `log_path`.
    fn profile<'a>(
        &'a self,
        instance: &'a Path,
        log_path: &'a Path,
    ) -> BoxFuture<'a, Result<(), ToolError>>;

    /// Run the solver in plot mode and pipe its output into the renderer, which writes `image`.
    fn render<'a>(
        &'a self,
        instance: &'a Path,
        image: &'a Path,
    ) -> BoxFuture<'a, Result<(), ToolError>>;
}

/// A command given as a single string: a program followed by leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Split `command` on whitespace. Returns `None` for a blank command.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        command
    }

    fn warn_if_missing(&self, tool: &str) {
        if let Err(e) = which::which(&self.program) {
            log::warn!(
                "The {tool} '{}' could not be found ({e}); that stage will fail for every instance",
                self.program
            );
        }
    }
}

/// Repetitions flag understood by the solver.
const REPETITIONS_FLAG: &str = "-r";
/// Output path flag understood by the solver.
const OUTPUT_FLAG: &str = "-o";
/// Makes the solver print the best tour as `ID,X,Y` tuples on stdout.
const PLOT_FLAG: &str = "-p";

/// [BenchTools] backed by real subprocesses.
#[derive(Debug, Clone)]
pub struct ProcessTools {
    solver: CommandLine,
    repetitions: String,
    profiler: Option<CommandLine>,
    renderer: Option<CommandLine>,
}

impl ProcessTools {
    pub fn from_definition(definition: &BenchmarkDefinition) -> anyhow::Result<Self> {
        let parse = |what: &str, command: &str| {
            CommandLine::parse(command)
                .ok_or_else(|| anyhow::anyhow!("The {what} command is empty"))
        };

        let tools = Self {
            solver: parse("solver", &definition.solver_command)?,
            repetitions: definition.repetitions.to_string(),
            profiler: definition
                .profiler
                .as_deref()
                .map(|c| parse("profiler", c))
                .transpose()?,
            renderer: definition
                .renderer
                .as_deref()
                .map(|c| parse("renderer", c))
                .transpose()?,
        };

        tools.solver.warn_if_missing("solver");
        if let Some(profiler) = &tools.profiler {
            profiler.warn_if_missing("profiler");
        }
        if let Some(renderer) = &tools.renderer {
            renderer.warn_if_missing("renderer");
        }

        Ok(tools)
    }

    /// `<solver> <instance> -r <repetitions>`
    fn solver_command(&self, instance: &Path) -> Command {
        let mut command = self.solver.command();
        command
            .arg(instance)
            .arg(REPETITIONS_FLAG)
            .arg(&self.repetitions);
        command
    }

    async fn run_solver_inner(&self, instance: &Path, artifact: &Path) -> Result<(), ToolError> {
        let mut command = self.solver_command(instance);
        command.arg(OUTPUT_FLAG).arg(artifact);
        log::debug!("Running solver: {command:?}");

        let output = capture("solver", self.solver.program(), command).await?;
        check_status("solver", &output)
    }

    async fn profile_inner(
        &self,
        profiler: &CommandLine,
        instance: &Path,
        log_path: &Path,
    ) -> Result<(), ToolError> {
        let mut command = profiler.command();
        command
            .arg(format!("--log-file={}", log_path.display()))
            .arg(self.solver.program())
            .args(self.solver.args())
            .arg(instance)
            .arg(REPETITIONS_FLAG)
            .arg(&self.repetitions);
        log::debug!("Running profiler: {command:?}");

        // A log left by an earlier run must not stand in for this run's output.
        match tokio::fs::remove_file(log_path).await {
            Ok(()) => log::debug!("Removed stale profiler log {}", log_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ToolError::Io {
                    path: log_path.to_path_buf(),
                    source,
                })
            }
        }

        let output = capture("profiler", profiler.program(), command).await?;

        // Profilers that ignore `--log-file` report on stderr instead; keep that verbatim.
        if !tokio::fs::try_exists(log_path).await.unwrap_or(false) {
            tokio::fs::write(log_path, &output.stderr)
                .await
                .map_err(|source| ToolError::Io {
                    path: log_path.to_path_buf(),
                    source,
                })?;
        }

        check_status("profiler", &output)
    }

    async fn render_inner(
        &self,
        renderer: &CommandLine,
        instance: &Path,
        image: &Path,
    ) -> Result<(), ToolError> {
        let mut command = self.solver_command(instance);
        command.arg(PLOT_FLAG);
        log::debug!("Running solver for plotting: {command:?}");
        let plot = capture("solver", self.solver.program(), command).await?;
        check_status("solver", &plot)?;

        let mut command = renderer.command();
        command
            .arg(image)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        log::debug!("Running renderer: {command:?}");

        let mut child = command.spawn().map_err(|source| ToolError::Launch {
            tool: "renderer",
            program: renderer.program().to_string(),
            source,
        })?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&plot.stdout).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|source| ToolError::Launch {
            tool: "renderer",
            program: renderer.program().to_string(),
            source,
        })?;
        check_status("renderer", &output)?;

        // A renderer that exits successfully without reading all of its input is not an error.
        if let Err(e) = fed {
            log::debug!("Renderer closed its input early: {e}");
        }
        Ok(())
    }
}

impl BenchTools for ProcessTools {
    fn run_solver<'a>(
        &'a self,
        instance: &'a Path,
        artifact: &'a Path,
    ) -> BoxFuture<'a, Result<(), ToolError>> {
        self.run_solver_inner(instance, artifact).boxed()
    }

    fn profile<'a>(
        &'a self,
        instance: &'a Path,
        log_path: &'a Path,
    ) -> BoxFuture<'a, Result<(), ToolError>> {
        match &self.profiler {
            Some(profiler) => self.profile_inner(profiler, instance, log_path).boxed(),
            None => futures::future::ready(Ok(())).boxed(),
        }
    }

    fn render<'a>(
        &'a self,
        instance: &'a Path,
        image: &'a Path,
    ) -> BoxFuture<'a, Result<(), ToolError>> {
        match &self.renderer {
            Some(renderer) => self.render_inner(renderer, instance, image).boxed(),
            None => futures::future::ready(Ok(())).boxed(),
        }
    }
}

async fn capture(
    tool: &'static str,
    program: &str,
    mut command: Command,
) -> Result<std::process::Output, ToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| ToolError::Launch {
            tool,
            program: program.to_string(),
            source,
        })
}

fn check_status(tool: &'static str, output: &std::process::Output) -> Result<(), ToolError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(ToolError::ExitStatus {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
