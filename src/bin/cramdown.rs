use std::io::prelude::*;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as _;
use cramdown::config::DocumentConfig;
use cramdown::escaping::Escaper;
use cramdown::parsers::ParserKind;
use cramdown::report::DiffRenderer;
use cramdown::report::Palette;
use cramdown::report::PrettyRenderer;
use cramdown::report::Renderer;
use cramdown::Error;
use cramdown::Output;
use cramdown::TestCase;
use cramdown::Validator;

/// Parse transcript-style test documents and validate captured output
#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the configuration and test cases of a document as JSON
    Parse(DocumentArgs),
    /// Validate captured output against one test case of a document
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct DocumentArgs {
    /// Markdown or Cram document
    file: PathBuf,

    /// Syntax of the document, guessed from the file extension by default
    #[arg(long, value_enum)]
    kind: Option<ParserKind>,

    /// Language of Markdown code blocks that are tests (repeatable)
    #[arg(long = "language")]
    languages: Vec<String>,
}

#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// Line the command of the test case starts at
    #[arg(long)]
    line: usize,

    /// File with the captured stdout
    #[arg(long)]
    stdout: PathBuf,

    /// File with the captured stderr
    #[arg(long)]
    stderr: Option<PathBuf>,

    /// Exit code, `timeout[<ms>ms]` or anything else for unknown
    #[arg(long, default_value = "0")]
    exit_code: String,

    #[arg(long, value_enum, default_value_t = RendererKind::Pretty)]
    renderer: RendererKind,

    #[arg(long, value_enum, default_value_t)]
    escaper: Escaper,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
enum RendererKind {
    /// Header and line-by-line body per failure, then a summary
    Pretty,
    /// Unified diff of the document
    Diff,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = match &args.command {
        Command::Parse(args) => parse(args),
        Command::Validate(args) => validate(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(std::io::stderr(), "error: {err}");
            ExitCode::from(2)
        }
    }
}

fn parse(args: &DocumentArgs) -> cramdown::Result<ExitCode> {
    let (config, testcases) = load(args)?;
    let parsed = serde_json::json!({
        "config": config,
        "testcases": testcases,
    });
    let parsed = serde_json::to_string_pretty(&parsed).map_err(Error::new)?;
    writeln!(std::io::stdout(), "{parsed}").map_err(Error::new)?;
    Ok(ExitCode::SUCCESS)
}

fn validate(args: &ValidateArgs) -> cramdown::Result<ExitCode> {
    let (_, testcases) = load(&args.document)?;
    let testcase = testcases
        .iter()
        .find(|testcase| testcase.line_number == args.line)
        .ok_or_else(|| {
            Error::new(format!(
                "{}: no test case starts at line {}",
                args.document.file.display(),
                args.line
            ))
        })?;

    let stdout = read(&args.stdout)?;
    let stderr = match &args.stderr {
        Some(path) => read(path)?,
        None => Vec::new(),
    };
    let output = Output::new(stdout, stderr, args.exit_code.as_str());
    let location = args.document.file.display().to_string();

    let (ok, report) = match args.renderer {
        RendererKind::Pretty => {
            let renderer = PrettyRenderer {
                palette: Palette::auto(),
                escaper: args.escaper,
                ..Default::default()
            };
            check(renderer, testcase, &output, &location)
        }
        RendererKind::Diff => check(DiffRenderer::new(), testcase, &output, &location),
    };
    write!(std::io::stdout(), "{report}").map_err(Error::new)?;
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check<R: Renderer + Sync>(
    renderer: R,
    testcase: &TestCase,
    output: &Output,
    location: &str,
) -> (bool, String) {
    Validator::new(renderer).validate_all(&[(testcase, output, Some(location))])
}

fn load(args: &DocumentArgs) -> cramdown::Result<(DocumentConfig, Vec<TestCase>)> {
    let kind = args
        .kind
        .or_else(|| ParserKind::from_path(&args.file))
        .ok_or_else(|| {
            Error::new(format!(
                "{}: unknown document syntax, use `--kind`",
                args.file.display()
            ))
        })?;
    let text = std::fs::read_to_string(&args.file)
        .map_err(|err| Error::new(format!("{}: {err}", args.file.display())))?;
    kind.parser(&args.languages)
        .parse(&text)
        .map_err(|err| Error::new(format!("{}: {err}", args.file.display())))
}

fn read(path: &Path) -> cramdown::Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| Error::new(format!("{}: {err}", path.display())))
}
