use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use clap_complete::{generate, Shell};
use tracing::info;

use gridbench_cli::cli::build_cli_command;

/// Command name the generated scripts complete.
const COMPLETION_NAME: &str = "gridbench";

pub fn handle(shell: Shell, out: Option<&Path>) -> Result<()> {
    let mut cmd = build_cli_command();
    let Some(path) = out else {
        generate(shell, &mut cmd, COMPLETION_NAME, &mut io::stdout());
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating completion directory '{}'", parent.display()))?;
    }
    let mut file = fs::File::create(path)
        .with_context(|| format!("creating completion file '{}'", path.display()))?;
    generate(shell, &mut cmd, COMPLETION_NAME, &mut file);
    info!(shell = %shell, path = %path.display(), "wrote completion script");

    println!("Wrote {shell} completion for `{COMPLETION_NAME}` to {}", path.display());
    if let Some(hint) = activation_hint(shell, path) {
        println!("{hint}");
    }
    Ok(())
}

/// How to enable a completion script written to `path`.
fn activation_hint(shell: Shell, path: &Path) -> Option<String> {
    match shell {
        Shell::Bash => Some(format!("Add `source {}` to ~/.bashrc", path.display())),
        Shell::Zsh => Some(format!(
            "Move {} into a directory on $fpath as _{COMPLETION_NAME}, then run `compinit`",
            path.display()
        )),
        Shell::Fish => Some("Copy the file to ~/.config/fish/completions/".to_string()),
        Shell::PowerShell => Some(format!("Dot-source {} from your $PROFILE", path.display())),
        _ => None,
    }
}
