use std::process::Command;

/// One external tool invocation: program plus a flat argument list. Every
/// path baked into `args` is absolute, so no working directory is carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the processing service and the external tool. Production
/// uses `StdMediaCommandRunner`; endpoint tests inject scripted fakes.
pub trait MediaCommandRunner: Send + Sync + 'static {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput>;
}

/// Blocking child-process runner. No timeout: a hung tool blocks the
/// request that spawned it.
#[derive(Debug, Default, Clone)]
pub struct StdMediaCommandRunner;

impl MediaCommandRunner for StdMediaCommandRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        let output = Command::new(spec.program.as_str())
            .args(spec.args.iter().map(String::as_str))
            .output()?;

        Ok(CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).to_string(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).to_string(),
        })
    }
}
