use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use podfile_patcher::{PatchResult, Patcher, DEFAULT_PODFILE_PATH};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "podfile-patcher")]
#[command(
    about = "Replace the post_install section of an iOS Podfile",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to the Podfile (default: $PODFILE_PATH, then ios/Podfile)
    #[arg(short, long)]
    podfile: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying the file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show a diff of the change
    #[arg(short, long)]
    diff: bool,

    /// Exit non-zero unless the post_install section is already patched
    #[arg(long, conflicts_with_all = ["dry_run", "diff"])]
    check: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let podfile = resolve_podfile(cli.podfile)?;
    let patcher = Patcher::new(podfile)?;

    if cli.check {
        cmd_check(&patcher)
    } else {
        cmd_apply(&patcher, cli.dry_run, cli.diff)
    }
}

/// Resolve the Podfile path
///
/// Priority order:
/// 1. Explicit --podfile flag
/// 2. PODFILE_PATH environment variable
/// 3. ios/Podfile relative to the current directory
///
/// A PODFILE_PATH naming a missing file is an error, never a fallback.
fn resolve_podfile(cli_podfile: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_podfile {
        return Ok(path);
    }

    if let Ok(env_path) = env::var("PODFILE_PATH") {
        let path = PathBuf::from(&env_path);
        if !path.exists() {
            anyhow::bail!("PODFILE_PATH is set but path doesn't exist: {}", env_path);
        }
        return Ok(path);
    }

    Ok(PathBuf::from(DEFAULT_PODFILE_PATH))
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", line);
        if change.missing_newline() {
            println!();
        }
    }
}

fn cmd_apply(patcher: &Patcher, dry_run: bool, show_diff: bool) -> Result<()> {
    if dry_run || show_diff {
        let preview = patcher.preview()?;

        if show_diff && !preview.is_unchanged() {
            display_diff(patcher.path(), &preview.before, &preview.after);
            println!();
        }

        if dry_run {
            if preview.is_unchanged() {
                println!(
                    "{} {}: post_install section already up to date",
                    "⊙".yellow(),
                    patcher.path().display()
                );
            } else {
                println!(
                    "{} {}: Would replace post_install section",
                    "✓".green(),
                    patcher.path().display()
                );
            }
            return Ok(());
        }
    }

    let _ = patcher.apply()?;
    println!("{}", "Podfile updated successfully!".green());

    Ok(())
}

fn cmd_check(patcher: &Patcher) -> Result<()> {
    match patcher.check()? {
        PatchResult::AlreadyApplied { file } => {
            println!("{} {}: Verified (already applied)", "✓".green(), file.display());
            Ok(())
        }
        PatchResult::Applied { file } => {
            eprintln!("{} {}: MISMATCH", "✗".red(), file.display());
            eprintln!("  Expected: post_install section already patched");
            eprintln!("  Found: section not yet patched");
            std::process::exit(1);
        }
    }
}
