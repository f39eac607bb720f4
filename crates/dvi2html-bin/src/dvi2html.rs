use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(err) = cli.run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Convert DVI files to HTML with inline SVG.
#[derive(Debug, clap::Parser)]
#[command(
    name = "dvi2html",
    version = "0.1",
    about,
    long_about,
    max_term_width(100)
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log more; repeat for more detail. RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

impl Cli {
    fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Html(html) => html.run(),
            Command::Text(text) => text.run(),
            Command::Inspect(inspect) => inspect.run(),
        }
    }
}

#[derive(Clone, Debug, clap::Subcommand)]
enum Command {
    /// Convert a DVI file to HTML.
    Html(Html),
    /// Extract the text of a DVI file.
    Text(Text),
    /// Print the ops of a DVI file in human-readable format.
    Inspect(Inspect),
}

#[derive(Clone, Debug, clap::Args)]
struct Conversion {
    /// Path to the DVI file.
    input: PathBuf,

    /// Path to write the output to. Defaults to standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory to search for .tfm files. May be repeated; directories are
    /// searched in order. Defaults to the current directory.
    #[arg(long = "fonts", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// JSON file mapping font names to character code tables.
    #[arg(long, value_name = "FILE")]
    encodings: Option<PathBuf>,

    /// Substitute characters with missing metrics or encodings instead of
    /// failing.
    #[arg(long)]
    lenient: bool,
}

impl Conversion {
    fn options(&self) -> dvi2html::Options {
        let mut options = dvi2html::Options {
            font_dirs: self.font_dirs.clone(),
            encodings: self.encodings.clone(),
            ..Default::default()
        };
        if self.lenient {
            options = options.lenient();
        }
        options
    }

    fn open(&self) -> anyhow::Result<std::io::BufReader<std::fs::File>> {
        let file = std::fs::File::open(&self.input)
            .with_context(|| format!("failed to read `{}`", self.input.display()))?;
        Ok(std::io::BufReader::new(file))
    }

    fn write(&self, b: &[u8]) -> anyhow::Result<()> {
        match &self.output {
            None => std::io::stdout()
                .write_all(b)
                .context("failed to write to standard output"),
            Some(path) => {
                std::fs::write(path, b)
                    .with_context(|| format!("failed to write `{}`", path.display()))?;
                tracing::info!(path = %path.display(), bytes = b.len(), "wrote output");
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, clap::Args)]
struct Html {
    #[command(flatten)]
    conversion: Conversion,

    /// Wrap the markup in a complete HTML document.
    #[arg(long)]
    standalone: bool,
}

impl Html {
    fn run(self) -> anyhow::Result<()> {
        let reader = self.conversion.open()?;
        let machine = dvi2html::dvi2html(reader, vec![], &self.conversion.options())
            .with_context(|| format!("failed to convert `{}`", self.conversion.input.display()))?;
        let fragment = String::from_utf8_lossy(&machine.into_inner()).into_owned();
        let output = if self.standalone {
            standalone(&self.conversion.input, &fragment)
        } else {
            fragment
        };
        self.conversion.write(output.as_bytes())
    }
}

/// Wraps converted markup in a minimal page that centers it.
fn standalone(input: &Path, fragment: &str) -> String {
    let title = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let title = html_escape::encode_text(&title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en-US">
    <head>
        <meta charset="utf-8">
        <meta name="viewport" content="width=device-width, initial-scale=1.0">
        <title>{title}</title>
        <link rel="stylesheet" href="fonts.css">
        <style>
            .svg-container {{
                margin: 10px auto;
                width: -moz-fit-content;
                width: fit-content;
                height: -moz-fit-content;
                height: fit-content;
            }}
            .svg-container svg {{ overflow: visible; }}
        </style>
    </head>
    <body>
        <div class="svg-container">{fragment}</div>
    </body>
</html>
"#
    )
}

#[derive(Clone, Debug, clap::Args)]
struct Text {
    #[command(flatten)]
    conversion: Conversion,
}

impl Text {
    fn run(self) -> anyhow::Result<()> {
        let reader = self.conversion.open()?;
        let machine = dvi2html::dvi2text(reader, vec![], &self.conversion.options())
            .with_context(|| format!("failed to convert `{}`", self.conversion.input.display()))?;
        self.conversion.write(&machine.into_inner())
    }
}

#[derive(Clone, Debug, Parser)]
struct Inspect {
    /// Path to the DVI file.
    path: PathBuf,
}

impl Inspect {
    fn run(self) -> anyhow::Result<()> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("failed to read `{}`", self.path.display()))?;
        let mut stdout = std::io::stdout().lock();
        for op in dvi::Reader::new(std::io::BufReader::new(file)) {
            writeln!(stdout, "{:?}", op?)?;
        }
        Ok(())
    }
}
