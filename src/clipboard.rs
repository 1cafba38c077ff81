use std::io::Write;
use std::process::{Command, Stdio};
use anyhow::{Result, anyhow, bail};

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Put `text` on the system clipboard using the first helper that works.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut last_err = anyhow!("no clipboard command configured");
    for (program, args) in CLIPBOARD_COMMANDS {
        match pipe_to(program, args, text) {
            Ok(()) => return Ok(()),
            Err(err) => last_err = err,
        }
    }
    Err(last_err)
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("{}: {}", program, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(text.as_bytes()) {
            // Reap the helper before reporting; it may still be running.
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            bail!("{}: {}", program, err);
        }
    }

    let status = child.wait()?;
    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_to_succeeds_with_reader() {
        assert!(pipe_to("cat", &[], "copied text").is_ok());
    }

    #[test]
    fn test_pipe_to_missing_program() {
        let err = pipe_to("local-chat-no-such-clipboard", &[], "x").unwrap_err();
        assert!(err.to_string().contains("local-chat-no-such-clipboard"));
    }

    #[test]
    fn test_pipe_to_failing_program() {
        assert!(pipe_to("false", &[], "x").is_err());
    }

    #[test]
    fn test_pipe_to_reports_program_when_input_is_refused() {
        // Large enough to outlast the pipe buffer once the helper has exited.
        let text = "x".repeat(1 << 20);
        let err = pipe_to("false", &[], &text).unwrap_err();
        assert!(err.to_string().contains("false"));
    }
}
