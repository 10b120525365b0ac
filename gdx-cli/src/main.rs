use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gdx_core::{ParseContext, parse};
use walkdir::WalkDir;

/// gdx のコマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "gdx", version, about = "Transpile GDX into GDScript", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transpile every GDX file under PATH into a `.gd` file
    Build {
        path: PathBuf,

        #[arg(
            long,
            value_name = "DIR",
            help = "Write outputs under DIR, mirroring the source tree (defaults to next to each source)"
        )]
        out_dir: Option<PathBuf>,

        #[arg(long, default_value = "gdx", help = "Extension of source files")]
        extension: String,

        #[arg(
            long,
            value_name = "PATH",
            default_value = "res://",
            help = "Resource path that PATH maps to, used to resolve imports"
        )]
        res_root: String,
    },

    /// Run every `name.gdx` / `name.expected.gd` pair under DIR
    Test {
        dir: PathBuf,

        #[arg(long, value_name = "PATH", default_value = "res://")]
        res_root: String,
    },

    /// Transpile a single buffer (stdin and stdout when omitted)
    Transpile {
        #[arg(short, long)]
        input: Option<String>,

        #[arg(short, long)]
        output: Option<String>,

        #[arg(long, value_name = "PATH", default_value = "res://")]
        res_root: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            path,
            out_dir,
            extension,
            res_root,
        } => build(&path, out_dir.as_deref(), &extension, &res_root),
        Commands::Test { dir, res_root } => run_fixtures(&dir, &res_root),
        Commands::Transpile {
            input,
            output,
            res_root,
        } => transpile(input.as_deref(), output.as_deref(), &res_root),
    }
}

// ---------------------------------------------------------------------
// build
// ---------------------------------------------------------------------

fn build(path: &Path, out_dir: Option<&Path>, extension: &str, res_root: &str) -> Result<()> {
    let root = source_root(path);
    let sources = discover(path, extension)?;
    if sources.is_empty() {
        println!("No .{extension} files found under {}", path.display());
        return Ok(());
    }

    let mut failed = 0;
    for source_path in &sources {
        let source = fs::read_to_string(source_path)
            .with_context(|| format!("failed to read input file {}", source_path.display()))?;
        let context = context_for(&root, source_path, res_root);
        match parse(&source, &context) {
            Ok(output) => {
                let target = target_path(&root, source_path, out_dir);
                write_output(&target, output.as_bytes())?;
                println!("{} -> {}", source_path.display(), target.display());
            }
            Err(err) => {
                failed += 1;
                eprintln!(
                    "{}:{}:{}: {}",
                    source_path.display(),
                    err.line,
                    err.column,
                    err.message
                );
            }
        }
    }

    println!("Built {} file(s), {failed} failed", sources.len() - failed);
    if failed > 0 {
        bail!("{failed} file(s) failed to transpile");
    }
    Ok(())
}

/// Directory that resource paths are computed from.
fn source_root(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path.to_path_buf()
    }
}

fn discover(path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.exists() {
        bail!("path {} does not exist", path.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
        let file = entry.path();
        if entry.file_type().is_file() && file.extension().is_some_and(|ext| ext == extension) {
            files.push(file.to_path_buf());
        }
    }
    Ok(files)
}

/// `res_root` plus the directory of `file` relative to `root`.
fn context_for(root: &Path, file: &Path, res_root: &str) -> ParseContext {
    let base_name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let segments: Vec<String> = file
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|relative| {
            relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let folder = if segments.is_empty() {
        res_root.to_string()
    } else if res_root.ends_with('/') {
        format!("{res_root}{}", segments.join("/"))
    } else {
        format!("{res_root}/{}", segments.join("/"))
    };
    ParseContext::new(base_name, folder)
}

fn target_path(root: &Path, source: &Path, out_dir: Option<&Path>) -> PathBuf {
    let target = source.with_extension("gd");
    match out_dir {
        Some(dir) => dir.join(target.strip_prefix(root).unwrap_or(&target)),
        None => target,
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------
// test
// ---------------------------------------------------------------------

fn run_fixtures(dir: &Path, res_root: &str) -> Result<()> {
    let started = Instant::now();
    let fixtures: Vec<(PathBuf, PathBuf)> = discover(dir, "gdx")?
        .into_iter()
        .filter_map(|source| {
            let expected = source.with_extension("expected.gd");
            expected.is_file().then_some((source, expected))
        })
        .collect();

    let mut passed = 0;
    let mut failed = 0;
    for (source_path, expected_path) in &fixtures {
        let name = source_path.strip_prefix(dir).unwrap_or(source_path).display();
        let source = fs::read_to_string(source_path)
            .with_context(|| format!("failed to read fixture {}", source_path.display()))?;
        let expected = fs::read_to_string(expected_path)
            .with_context(|| format!("failed to read fixture {}", expected_path.display()))?;

        match parse(&source, &context_for(dir, source_path, res_root)) {
            Ok(actual) if actual == expected => {
                passed += 1;
                println!("PASS {name}");
            }
            Ok(actual) => {
                failed += 1;
                println!("FAIL {name}");
                if let Some(diff) = first_difference(&expected, &actual) {
                    println!("  first difference at line {}:", diff.line);
                    println!("    expected: {}", diff.expected.unwrap_or("<end of file>"));
                    println!("    actual:   {}", diff.actual.unwrap_or("<end of file>"));
                }
            }
            Err(err) => {
                failed += 1;
                println!("FAIL {name}");
                println!("  {err}");
            }
        }
    }

    println!(
        "{passed} passed, {failed} failed in {:.2?}",
        started.elapsed()
    );
    if failed > 0 {
        bail!("{failed} fixture(s) failed");
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct LineDiff<'a> {
    line: usize,
    expected: Option<&'a str>,
    actual: Option<&'a str>,
}

fn first_difference<'a>(expected: &'a str, actual: &'a str) -> Option<LineDiff<'a>> {
    let mut expected_lines = expected.split('\n');
    let mut actual_lines = actual.split('\n');
    for line in 1.. {
        match (expected_lines.next(), actual_lines.next()) {
            (None, None) => return None,
            (expected, actual) if expected != actual => {
                return Some(LineDiff {
                    line,
                    expected,
                    actual,
                });
            }
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------
// transpile
// ---------------------------------------------------------------------

fn transpile(input: Option<&str>, output: Option<&str>, res_root: &str) -> Result<()> {
    let (source, context) = match input {
        Some(path) => {
            let path = Path::new(path);
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            (source, context_for(&source_root(path), path, res_root))
        }
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            (buffer, ParseContext::new("", res_root))
        }
    };

    let result = parse(&source, &context)
        .with_context(|| format!("failed to transpile {}", input.unwrap_or("<stdin>")))?;

    match output {
        Some(path) => write_output(Path::new(path), result.as_bytes())?,
        None => io::stdout().write_all(result.as_bytes())?,
    }
    Ok(())
}
