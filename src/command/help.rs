use super::Cmd;
use std::io::{self, Write};

/// Writes the usage of a command that dispatches to `commands`
pub fn write_commands<E>(
    mut w: impl Write,
    path: &str,
    help: &str,
    commands: &[Cmd<E>],
) -> io::Result<()> {
    writeln!(&mut w, "Usage: {path} <command> [<arguments>]")?;

    if !help.is_empty() {
        write!(&mut w, "\n{}\n", help.trim_end())?;
    }

    if !commands.is_empty() {
        write!(&mut w, "\nCommands:\n")?;

        let labels = commands.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        let col_width = calculate_col_width(&labels);

        for (cmd, label) in commands.iter().zip(labels) {
            let line = format!("  {label:col_width$}{}", cmd.description);
            writeln!(&mut w, "{}", line.trim_end())?;
        }
    }
    w.flush()
}

fn calculate_col_width(list: &[&str]) -> usize {
    list.iter().map(|s| s.len()).max().unwrap_or(0) + 5
}
