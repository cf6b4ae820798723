use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use novidades_patcher::{load_from_path, PatchError, Patcher};
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "novidades-patcher")]
#[command(about = "Rewrite the Novidades modal list and title markup", long_about = None)]
#[command(version)]
struct Cli {
    /// Front-end project root containing src/components/NovidadesModal.tsx
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Patch rules TOML to use instead of the built-in rules
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let patcher = match &cli.rules {
        Some(path) => Patcher::with_config(&cli.root, &load_from_path(path)?)?,
        None => Patcher::new(&cli.root)?,
    };
    println!(
        "{}",
        format!("Target: {}", patcher.root().join(patcher.target()).display()).dimmed()
    );

    let result = if cli.dry_run {
        println!("{}", "[DRY RUN - nothing will be written]".cyan());
        patcher.run_dry()
    } else {
        patcher.run()
    };

    match result {
        Ok(outcome) => {
            for rule in &outcome.rules_applied {
                println!("{} {}", "✓".green(), rule);
            }
            println!("{}", outcome.to_string().bold());

            if cli.diff {
                display_diff(&outcome.file, &outcome.original, &outcome.patched);
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            if e.is_content_mismatch() {
                report_conflict(&e);
            }
            eprintln!("{}", "No changes written.".dimmed());
            std::process::exit(1);
        }
    }
}

/// Hints for an error where the target no longer has the shape a rule expects.
fn report_conflict(error: &PatchError) {
    match error {
        PatchError::PatternNotUniquelyMatched {
            rule,
            count,
            expected,
            ..
        } => {
            eprintln!(
                "  {}",
                format!(
                    "CONFLICT: '{}' pattern matched {} times (expected {})",
                    rule, count, expected
                )
                .red()
            );
            eprintln!("  Possible causes:");
            eprintln!("    - The declaration was renamed or removed");
            eprintln!("    - The declaration appears more than once");
        }
        PatchError::ExactBlockNotFound { rule, .. } => {
            eprintln!(
                "  {}",
                format!("CONFLICT: '{}' block not found", rule).red()
            );
            eprintln!("  Possible causes:");
            eprintln!("    - The patch was already applied");
            eprintln!("    - Indentation or line endings changed (blocks are matched byte for byte)");
        }
        PatchError::AmbiguousBlock {
            rule,
            count,
            expected,
            ..
        } => {
            eprintln!(
                "  {}",
                format!(
                    "CONFLICT: '{}' block found {} times (expected {})",
                    rule, count, expected
                )
                .red()
            );
        }
        _ => {}
    }
}

/// Show unified diff between original and patched content
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
            ChangeTag::Equal => continue,
        };
        print!("{}", line);
    }
}
