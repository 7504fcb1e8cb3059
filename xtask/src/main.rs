use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "env_feature_lambda";
const ARTIFACT_PATH: &str = "dist/env-feature.zip";

#[derive(Parser)]
#[command(name = "xtask", about = "Task runner for the environment feature custom resource")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Formatting, clippy, and tests for every crate
    Ci,
    /// Build the Lambda binary and zip it as `bootstrap`
    LambdaPackage {
        #[arg(long, env = "LAMBDA_TARGET", default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = Profile::Release)]
        profile: Profile,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Debug,
    Release,
}

fn cargo(args: &[&str]) -> Result<(), String> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("failed to execute cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("cargo {} exited with {status}", args[0]))
    }
}

fn ci() -> Result<(), String> {
    cargo(&["fmt", "--all", "--", "--check"])?;
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
    cargo(&["test", "--workspace"])
}

fn lambda_package(target: &str, profile: Profile) -> Result<PathBuf, String> {
    let mut build = vec!["build", "-p", LAMBDA_PACKAGE, "--bin", LAMBDA_PACKAGE, "--target", target];
    let profile_dir = match profile {
        Profile::Debug => "debug",
        Profile::Release => {
            build.push("--release");
            "release"
        }
    };
    cargo(&build)?;

    let binary = Path::new("target")
        .join(target)
        .join(profile_dir)
        .join(LAMBDA_PACKAGE);
    let artifact = PathBuf::from(ARTIFACT_PATH);
    write_bootstrap_zip(&binary, &artifact)?;
    Ok(artifact)
}

/// `provided.al2023` Lambdas run an executable named `bootstrap` at the zip root.
fn write_bootstrap_zip(binary: &Path, artifact: &Path) -> Result<(), String> {
    let bytes = fs::read(binary)
        .map_err(|error| format!("cannot read lambda binary {}: {error}", binary.display()))?;
    if let Some(parent) = artifact.parent() {
        fs::create_dir_all(parent).map_err(|error| format!("cannot create {}: {error}", parent.display()))?;
    }

    let file = fs::File::create(artifact)
        .map_err(|error| format!("cannot create {}: {error}", artifact.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    let write_error = |error: &dyn std::fmt::Display| format!("cannot write {}: {error}", artifact.display());
    zip.start_file("bootstrap", options).map_err(|error| write_error(&error))?;
    zip.write_all(&bytes).map_err(|error| write_error(&error))?;
    zip.finish().map_err(|error| write_error(&error))?;
    Ok(())
}

fn main() {
    let result = match Cli::parse().command {
        Task::Ci => ci(),
        Task::LambdaPackage { target, profile } => lambda_package(&target, profile)
            .map(|artifact| eprintln!("packaged {}", artifact.display())),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        exit(1);
    }
}
