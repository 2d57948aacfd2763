use crate::error::ShellError;
use crate::redirection::RedirectionSpec;
use os_pipe::{PipeReader, PipeWriter};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::process::Stdio;

/// Where a command reads its standard input from.
#[derive(Debug)]
pub enum InputStream {
    /// The shell's own standard input.
    Inherit,
    /// Read end of a pipe from the previous stage.
    Pipe(PipeReader),
}

impl InputStream {
    /// Handle for a spawned process.
    pub fn into_stdio(self) -> Stdio {
        match self {
            InputStream::Inherit => Stdio::inherit(),
            InputStream::Pipe(r) => Stdio::from(r),
        }
    }

    /// Reader for a built-in running in-process.
    pub fn into_reader(self) -> Box<dyn Read> {
        match self {
            InputStream::Inherit => Box::new(io::stdin()),
            InputStream::Pipe(r) => Box::new(r),
        }
    }
}

/// Where a command writes one of its output streams.
#[derive(Debug)]
pub enum OutputStream {
    /// The shell's own standard output.
    Stdout,
    /// The shell's own standard error.
    Stderr,
    /// Write end of a pipe to the next stage.
    Pipe(PipeWriter),
    /// A redirection target.
    File(File),
}

impl OutputStream {
    pub fn try_clone(&self) -> io::Result<OutputStream> {
        Ok(match self {
            OutputStream::Stdout => OutputStream::Stdout,
            OutputStream::Stderr => OutputStream::Stderr,
            OutputStream::Pipe(w) => OutputStream::Pipe(w.try_clone()?),
            OutputStream::File(f) => OutputStream::File(f.try_clone()?),
        })
    }

    /// Handle for a spawned process.
    pub fn into_stdio(self) -> Stdio {
        match self {
            OutputStream::Stdout => Stdio::from(io::stdout()),
            OutputStream::Stderr => Stdio::from(io::stderr()),
            OutputStream::Pipe(w) => Stdio::from(w),
            OutputStream::File(f) => Stdio::from(f),
        }
    }

    /// Writer for a built-in running in-process.
    pub fn into_writer(self) -> Box<dyn Write> {
        match self {
            OutputStream::Stdout => Box::new(io::stdout()),
            OutputStream::Stderr => Box::new(io::stderr()),
            OutputStream::Pipe(w) => Box::new(w),
            OutputStream::File(f) => Box::new(f),
        }
    }
}

/// The three standard streams of a command line.
///
/// Owned handles: dropping an `IoStreams` closes any pipe ends and files it
/// holds, which is how end-of-stream reaches the other side of a pipe.
#[derive(Debug)]
pub struct IoStreams {
    pub stdin: InputStream,
    pub stdout: OutputStream,
    pub stderr: OutputStream,
}

impl IoStreams {
    /// Streams bound to the shell's own standard streams.
    pub fn inherit() -> Self {
        Self {
            stdin: InputStream::Inherit,
            stdout: OutputStream::Stdout,
            stderr: OutputStream::Stderr,
        }
    }

    /// A writer onto the current error stream, for diagnostics.
    pub fn diagnostics(&self) -> Box<dyn Write> {
        match self.stderr.try_clone() {
            Ok(stream) => stream.into_writer(),
            Err(_) => Box::new(io::stderr()),
        }
    }

    /// Open the target of `spec` and rebind the stream it names.
    ///
    /// On failure the streams are left unchanged.
    pub fn redirect(&mut self, spec: &RedirectionSpec) -> Result<(), ShellError> {
        let file = open_target(spec)?;
        if spec.kind.is_stderr() {
            self.stderr = OutputStream::File(file);
        } else {
            self.stdout = OutputStream::File(file);
        }
        Ok(())
    }
}

fn open_target(spec: &RedirectionSpec) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.create(true);
    if spec.kind.appends() {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options
        .open(&spec.target)
        .map_err(|source| ShellError::Redirection {
            path: spec.target.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirection::RedirectionKind;
    use crate::test_support::make_unique_temp_dir;
    use std::fs;

    fn spec(kind: RedirectionKind, target: &std::path::Path) -> RedirectionSpec {
        RedirectionSpec {
            kind,
            target: target.to_string_lossy().to_string(),
        }
    }

    #[test]
    fn test_truncate_then_append() {
        let dir = make_unique_temp_dir("io_redirect").unwrap();
        let target = dir.join("out.txt");
        fs::write(&target, "old contents\n").unwrap();

        let mut io = IoStreams::inherit();
        io.redirect(&spec(RedirectionKind::StdoutTruncate, &target)).unwrap();
        io.stdout.into_writer().write_all(b"one\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "one\n");

        let mut io = IoStreams::inherit();
        io.redirect(&spec(RedirectionKind::StdoutAppend, &target)).unwrap();
        io.stdout.into_writer().write_all(b"two\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "one\ntwo\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_stderr_redirect_leaves_stdout() {
        let dir = make_unique_temp_dir("io_stderr").unwrap();
        let mut io = IoStreams::inherit();
        io.redirect(&spec(RedirectionKind::StderrTruncate, &dir.join("err.log")))
            .unwrap();
        assert!(matches!(io.stdout, OutputStream::Stdout));
        assert!(matches!(io.stderr, OutputStream::File(_)));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_failed_open_keeps_streams() {
        let dir = make_unique_temp_dir("io_fail").unwrap();
        let target = dir.join("missing-dir").join("out.txt");
        let mut io = IoStreams::inherit();
        let err = io
            .redirect(&spec(RedirectionKind::StdoutTruncate, &target))
            .unwrap_err();
        assert!(err.to_string().starts_with("redirection error: "));
        assert!(matches!(io.stdout, OutputStream::Stdout));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_pipe_stream_round_trip() {
        let (reader, writer) = os_pipe::pipe().unwrap();
        let mut out = OutputStream::Pipe(writer).into_writer();
        out.write_all(b"through the pipe").unwrap();
        drop(out);

        let mut text = String::new();
        InputStream::Pipe(reader)
            .into_reader()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "through the pipe");
    }
}
