//! The external disassembler collaborator.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ReflectError, Result};

/// Turns a captured binary into a raw text listing.
pub trait Disassembler: Send + Sync {
    /// Disassemble the binary at `binary`; `verbose` requests source-line
    /// annotations where the tool supports them.
    fn disassemble(&self, binary: &Path, verbose: bool) -> Result<Vec<String>>;
}

/// Shells out to a vendor disassembler executable.
pub struct ExternalDisassembler {
    program: PathBuf,
    extra_flags: Vec<String>,
}

impl ExternalDisassembler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_flags: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = String>) -> Self {
        self.extra_flags.extend(flags);
        self
    }
}

impl Disassembler for ExternalDisassembler {
    fn disassemble(&self, binary: &Path, verbose: bool) -> Result<Vec<String>> {
        let mut command = Command::new(&self.program);
        command.arg("-c");
        if verbose {
            command.args(["-g", "-sf"]);
        }
        command.args(&self.extra_flags);
        command.arg(binary);

        let output = command.output()?;
        if !output.status.success() {
            return Err(ReflectError::Disassembler {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(|l| l.to_string()).collect())
    }
}

/// Reads the simulated driver's binary image, which is already a raw text
/// listing.
pub struct SimDisassembler;

impl Disassembler for SimDisassembler {
    fn disassemble(&self, binary: &Path, _verbose: bool) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(binary)?;
        Ok(text.lines().map(|l| l.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sim_disassembler_reads_listing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\t\tFunction : k").unwrap();
        writeln!(file, "        /*0000*/ EXIT ;").unwrap();
        let lines = SimDisassembler.disassemble(file.path(), false).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Function : k"));
    }

    #[test]
    fn missing_external_tool_is_an_error() {
        let disasm = ExternalDisassembler::new("/nonexistent/scry-disasm");
        let err = disasm
            .disassemble(Path::new("/tmp/whatever.bin"), false)
            .unwrap_err();
        assert!(matches!(err, ReflectError::Io(_)));
    }
}
