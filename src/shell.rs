use log::{error, /*warn,*/ info, debug/*, trace, log, Level*/};
use run_script::ScriptOptions;

/**
Run a shell command with extensive logging.

# Logs
- A description of the general result to main
- All output of the command, stdout and stderr to their separate logs. Set `log_stdout` to false when stdout is bulk data
  the caller keeps, and only its size is logged.
- The command itself to cmdlog

# Returns
The command's exit code and stdout, or None if the command couldn't be run at all.

# Examples
```
use run_script::ScriptOptions;
use dbexport::shell::shell_and_log;

let (code, stdout) = shell_and_log("echo hello", &ScriptOptions::new(), "say hello", true, true).unwrap();
assert_eq!(code, 0);
assert_eq!(stdout.trim(), "hello");
```
*/
pub fn shell_and_log(cmd: &str, options: &ScriptOptions, purpose: &str, cmd_error_is_app_error: bool, log_stdout: bool) -> Option<(i32, String)>
{
    info!(target: "cmdlog", "Command: {} -- RunOptions: {:?}", cmd, &options);
    match run_script::run(cmd, &Vec::new(), options)
    {
        Ok(v) => {
            let (code, stdout, stderr) = v;
            if code != 0 && cmd_error_is_app_error
            {
                error!(
                    "{} returned nonzero exit code! Full Command: {} -- Exit Code: {} -- see log folder for stdout and stderr output",
                    purpose,
                    cmd,
                    code,
                );
            }else{
                debug!("Done: {} -- Exit Code: {}", purpose, code);
            }

            if log_stdout
            {
                info!(target: "stdoutlog", "Full Command: {} -- Exit Code: {} -- stdout: {}", cmd, code, stdout);
            }else{
                info!(target: "stdoutlog", "Full Command: {} -- Exit Code: {} -- stdout: {} bytes kept by caller", cmd, code, stdout.len());
            }
            info!(target: "stderrlog", "Full Command: {} -- Exit Code: {} -- stderr: {}", cmd, code, stderr);
            Some((code, stdout))
        },
        Err(e) => {
            error!("Failed: {} -- Error: {}", purpose, e);
            None
        }
    }
}

/**
Whether a command can be found in the PATH, according to `which`.
Before relying on a negative answer, check `which` itself is available.
*/
pub fn is_command_available(command: &str) -> bool
{
    if command.is_empty() {return false;}
    let cmd = format!("which {}", enquote::enquote('"', command));
    matches!(shell_and_log(&cmd, &ScriptOptions::new(), "command lookup", false, true), Some((0, _)))
}
