//! Subprocess construction shared by the rasterizer and the OCR engine.

use std::path::Path;
use std::process::Command;

/// Build a command for an external tool. On Windows the child is created
/// without a console window so GUI-less invocations stay silent.
pub(crate) fn tool_command(program: &Path) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    cmd
}
