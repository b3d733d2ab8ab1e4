//! taskview - render exercise notes from the command line

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use taskview_core::{Catalogue, Rejection, SourceLocation, ValidationResult};
use taskview_render::{
    DisplayMode, RenderOptions, RenderOutcome, RenderedDocument, Renderer, outcome_to_html,
};

#[derive(Parser)]
#[command(name = "taskview")]
#[command(version, about = "Render markdown exercise notes", long_about = None)]
#[command(after_help = "EXAMPLES:
    taskview render notes.md                    Render to HTML on stdout
    taskview render notes.md --format json      Print the presentation tree
    taskview render - --dark --scope exercise   Read stdin, dark theme
    taskview validate notes/*.md                Check files before publishing
    taskview catalogue tasks.json --root notes  List and check a catalogue")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a document to HTML or a JSON presentation tree
    Render(RenderArgs),
    /// Check documents for missing or unsafe content
    Validate {
        /// Markdown files to check
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Only report failures
        #[arg(short, long)]
        quiet: bool,
    },
    /// List the exercises of a catalogue
    Catalogue {
        /// Catalogue JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Content root; when given, every exercise document is validated
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown file, or `-` for stdin
    #[arg(value_name = "FILE")]
    input: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Use the dark highlighting theme
    #[arg(long)]
    dark: bool,

    /// Extra class for the root element
    #[arg(long, value_name = "CLASS")]
    scope: Option<String>,

    /// Render options as JSON; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Leave fenced code unhighlighted
    #[arg(long)]
    no_highlight: bool,

    /// Asset root; images missing under it are shown as placeholders
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Json,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Render(args) => render(&args),
        Command::Validate { files, quiet } => validate(&files, quiet),
        Command::Catalogue { file, root } => catalogue(&file, root.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// render
// ============================================================================

fn render(args: &RenderArgs) -> Result<ExitCode> {
    let options = load_options(args)?;
    let (name, content) = read_input(&args.input)?;

    let renderer = Renderer::new(options);
    let outcome = match renderer.render(Some(&content)) {
        RenderOutcome::Rendered { document } => match &args.assets {
            Some(root) => RenderOutcome::Rendered {
                document: fail_missing_images(document, root),
            },
            None => RenderOutcome::Rendered { document },
        },
        rejected => rejected,
    };

    let text = match args.format {
        Format::Html => outcome_to_html(&outcome),
        Format::Json => serde_json::to_string_pretty(&outcome)?,
    };
    write_output(args.output.as_deref(), &text)?;

    match outcome.diagnostic() {
        Some(diagnostic) => {
            let location = diagnostic
                .location
                .as_ref()
                .map(|l| SourceLocation::with_file(name.clone(), l.line, l.column));
            match location {
                Some(location) => eprintln!("{location}: {}", diagnostic.message),
                None => eprintln!("{name}: {}", diagnostic.message),
            }
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

/// Config file first, then command-line flags on top.
fn load_options(args: &RenderArgs) -> Result<RenderOptions> {
    let mut options = match &args.config {
        Some(path) => RenderOptions::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RenderOptions::default(),
    };

    if args.dark {
        options.display_mode = DisplayMode::Dark;
    }
    if let Some(scope) = &args.scope {
        options.scope_class = Some(scope.clone());
    }
    if args.no_highlight {
        options.highlight_code = false;
    }
    Ok(options)
}

fn read_input(input: &str) -> Result<(String, String)> {
    if input == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
        return Ok(("<stdin>".to_string(), content));
    }
    let content =
        fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?;
    Ok((input.to_string(), content))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}").context("failed to write stdout")
        }
    }
}

/// Swaps every local image that does not exist under `root` for its placeholder,
/// the way a browser host would after a failed load.
fn fail_missing_images(document: RenderedDocument, root: &Path) -> RenderedDocument {
    let missing: BTreeSet<String> = document
        .images()
        .into_iter()
        .map(|image| image.src.clone())
        .filter(|src| is_local(src) && !root.join(src.trim_start_matches('/')).exists())
        .collect();

    missing.iter().fold(document, |document, src| {
        log::info!("image not found under {}: {src}", root.display());
        document.with_failed_image(src)
    })
}

fn is_local(src: &str) -> bool {
    !(src.is_empty() || src.contains("://") || src.starts_with("data:") || src.starts_with("//"))
}

// ============================================================================
// validate
// ============================================================================

fn validate(files: &[PathBuf], quiet: bool) -> Result<ExitCode> {
    let mut failures = 0;
    for path in files {
        let name = path.display().to_string();
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read {name}"))?;
        let result = taskview_core::validate(Some(&content));
        match report_line(&name, &result) {
            Some(line) => {
                failures += 1;
                println!("{line}");
            }
            None if !quiet => println!("{name}: ok"),
            None => {}
        }
    }

    if failures > 0 {
        eprintln!("{failures} of {} file(s) rejected", files.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// One line per rejected file, compiler style.
fn report_line(name: &str, result: &ValidationResult) -> Option<String> {
    let rejection = result.rejection()?;
    match rejection {
        Rejection::Missing => Some(format!("{name}: {}", rejection.reason())),
        Rejection::Unsafe { pattern, location } => {
            let location =
                SourceLocation::with_file(name.to_string(), location.line, location.column);
            Some(format!(
                "{location}: {} ({})",
                rejection.reason(),
                pattern.description()
            ))
        }
    }
}

// ============================================================================
// catalogue
// ============================================================================

fn catalogue(path: &Path, root: Option<&Path>) -> Result<ExitCode> {
    let catalogue = Catalogue::from_path(path)
        .with_context(|| format!("failed to load catalogue {}", path.display()))?;

    let mut problems = 0;
    for category in catalogue.categories() {
        println!("{}", category.label);
        for exercise in &category.exercises {
            println!("  {} -> {}", exercise.name, exercise.document);
            if let Some(root) = root
                && let Some(problem) = check_exercise_document(root, &exercise.document)
            {
                problems += 1;
                println!("    {problem}");
            }
        }
    }

    if problems > 0 {
        eprintln!("{problems} exercise document(s) need attention");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn check_exercise_document(root: &Path, document: &str) -> Option<String> {
    let path = root.join(document);
    match fs::read_to_string(&path) {
        Ok(content) => report_line(document, &taskview_core::validate(Some(&content))),
        Err(e) => Some(format!("{document}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn plain_renderer() -> Renderer {
        Renderer::new(RenderOptions {
            highlight_code: false,
            ..RenderOptions::default()
        })
    }

    fn render_args(extra: &[&str]) -> RenderArgs {
        let mut argv = vec!["taskview", "render", "notes.md"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).expect("valid arguments").command {
            Command::Render(args) => args,
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn validate_requires_a_file() {
        assert!(Cli::try_parse_from(["taskview", "validate"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("options.json");
        fs::write(&config, r#"{"scopeClass": "from-file", "lazyImages": false}"#).unwrap();

        let config = config.to_str().unwrap();
        let args = render_args(&["--config", config, "--dark", "--scope", "from-flag"]);
        let options = load_options(&args).unwrap();
        assert_eq!(options.display_mode, DisplayMode::Dark);
        assert_eq!(options.scope_class.as_deref(), Some("from-flag"));
        assert!(!options.lazy_images);
        assert!(options.highlight_code);
    }

    #[test]
    fn bad_config_names_the_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("options.json");
        fs::write(&config, r#"{"displayMode": "sepia"}"#).unwrap();

        let args = render_args(&["--config", config.to_str().unwrap()]);
        let error = format!("{:#}", load_options(&args).unwrap_err());
        assert!(error.starts_with("failed to load config "));
        assert!(error.contains("JSON error"));
    }

    #[test]
    fn missing_local_images_become_placeholders() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("present.png"), b"png").unwrap();

        let outcome = plain_renderer().render(Some(
            "![here](present.png)\n\n![gone](gone.png)\n\n![remote](https://example.com/x.png)",
        ));
        let document = outcome.document().unwrap().clone();
        let document = fail_missing_images(document, dir.path());

        let sources: Vec<_> = document.images().into_iter().map(|i| i.src.as_str()).collect();
        assert_eq!(sources, ["present.png", "https://example.com/x.png"]);
        assert!(document.text().contains("Image not loaded: gone"));
    }

    #[test]
    fn report_line_points_at_the_unsafe_markup() {
        let result = taskview_core::validate(Some("# Task\n\ntext <script>alert(1)</script>"));
        let line = report_line("notes.md", &result).unwrap();
        assert!(line.starts_with("notes.md:3:6: potentially dangerous content detected"));

        assert_eq!(
            report_line("empty.md", &taskview_core::validate(Some(""))).as_deref(),
            Some("empty.md: content missing or malformed")
        );
        assert!(report_line("ok.md", &taskview_core::validate(Some("fine"))).is_none());
    }

    #[test]
    fn catalogue_documents_are_checked_against_the_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.md"), "# Good").unwrap();
        fs::write(dir.path().join("bad.md"), "<iframe src=x>").unwrap();

        assert!(check_exercise_document(dir.path(), "good.md").is_none());
        assert!(check_exercise_document(dir.path(), "bad.md").is_some());
        let missing = check_exercise_document(dir.path(), "absent.md").unwrap();
        assert!(missing.starts_with("absent.md: "));
    }

    #[test]
    fn only_relative_and_rooted_paths_are_local() {
        assert!(is_local("img/a.png"));
        assert!(is_local("/img/a.png"));
        assert!(!is_local("https://example.com/a.png"));
        assert!(!is_local("//cdn.example.com/a.png"));
        assert!(!is_local("data:image/png;base64,AAAA"));
    }
}
