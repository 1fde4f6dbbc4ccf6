use anyhow::Result;
use clap::{Parser, Subcommand};
use console::{Term, style};
use natdist_core::{BuildOptions, ConanBuilder, WheelTags, build_sdist, build_wheel};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// natdist - package native projects into sdists and wheels
#[derive(Parser)]
#[command(name = "natdist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a source archive (sdist)
    Sdist {
        /// Project root containing pyproject.toml (default: current directory)
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Directory to place the archive in
        #[arg(short, long, default_value = "dist")]
        out_dir: PathBuf,
    },

    /// Build a binary archive (wheel) via the native build tool
    Wheel {
        /// Project root containing pyproject.toml (default: current directory)
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Directory to place the archive in
        #[arg(short, long, default_value = "dist")]
        out_dir: PathBuf,

        /// Conan profile for the host context
        #[arg(long, default_value = "default")]
        host_profile: String,

        /// Conan profile for the build context
        #[arg(long, default_value = "default")]
        build_profile: String,

        /// Persistent directory for build artifacts (default: temporary,
        /// removed after the build)
        #[arg(long)]
        build_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sdist { project, out_dir } => cmd_sdist(&project, &out_dir),
        Commands::Wheel {
            project,
            out_dir,
            host_profile,
            build_profile,
            build_dir,
        } => cmd_wheel(&project, &out_dir, host_profile, build_profile, build_dir),
    }
}

fn check_project(term: &Term, project: &Path) -> Result<()> {
    if !project.join("pyproject.toml").is_file() {
        term.write_line(&format!(
            "{} pyproject.toml not found in {}",
            style("error:").red().bold(),
            project.display()
        ))?;
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_sdist(project: &Path, out_dir: &Path) -> Result<()> {
    let term = Term::stderr();
    check_project(&term, project)?;

    term.write_line(&format!(
        "{} Building sdist for {}",
        style("::").cyan().bold(),
        project.display()
    ))?;

    match build_sdist(project, out_dir) {
        Ok(path) => {
            term.write_line(&format!(
                "{} Built {}",
                style("::").green().bold(),
                path.display()
            ))?;
            Ok(())
        }
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))?;
            std::process::exit(1);
        }
    }
}

fn cmd_wheel(
    project: &Path,
    out_dir: &Path,
    host_profile: String,
    build_profile: String,
    build_dir: Option<PathBuf>,
) -> Result<()> {
    let term = Term::stderr();
    check_project(&term, project)?;

    term.write_line(&format!(
        "{} Building wheel for {}",
        style("::").cyan().bold(),
        project.display()
    ))?;

    let builder = ConanBuilder {
        host_profile,
        build_profile,
    };
    let options = BuildOptions {
        build_dir,
        tags: tags_from_env(),
    };

    match build_wheel(project, out_dir, &options, &builder) {
        Ok(path) => {
            term.write_line(&format!(
                "{} Built {}",
                style("::").green().bold(),
                path.display()
            ))?;
            Ok(())
        }
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))?;
            std::process::exit(1);
        }
    }
}

/// Wheel tag triple from the cross-compile environment variables, typically
/// set by a Conan profile's [buildenv]. The environment is read only here,
/// at the process edge; core code consumes the explicit triple.
fn tags_from_env() -> WheelTags {
    match std::env::var("WHEEL_ARCH") {
        Ok(arch) if !arch.is_empty() => WheelTags {
            pyver: std::env::var("WHEEL_PYVER").unwrap_or_else(|_| "py3".to_string()),
            abi: std::env::var("WHEEL_ABI").unwrap_or_else(|_| "none".to_string()),
            arch,
        },
        _ => WheelTags::default(),
    }
}
