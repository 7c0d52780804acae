use clap::{Parser, Subcommand};
use env_logger::Env;
use notebook_export::imaging::RustBackend;
use notebook_export::notebook::{self, ExportOptions};
use notebook_export::pdf::ChromeRasterizer;
use notebook_export::{config, output};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "notebook-export")]
#[command(about = "Compile an engineering notebook into HTML and PDF")]
#[command(long_about = "\
Compile an engineering notebook into HTML and PDF

The notebook is described by JSON files under the project root. The
manifest lists entries month by month; each entry is a page file.

Project structure:

  <root>/
  ├── notebook.toml                 # Optional config (see gen-config)
  ├── index.html                    # Home page; configured sections are embedded
  ├── pages/
  │   ├── manifest.json             # {\"August\": [{\"id\": \"drive-v1\", \"date\": \"2025-08-28\"}]}
  │   └── August/
  │       └── drive-v1.json         # title, date, type, brief, elements
  └── resources/                    # Images, scripts, PDFs referenced by pages

Output goes to compilation/output/ by default:

  notebook.html                     # Self-contained document (links into <root>)
  notebook.pdf                      # Printed through headless Chrome
  assets/                           # Downscaled images, reused while fresh

Entries within a month are ordered by date, or by id when undated.
Element paths may use {class}, {title}, {type}, {id}, {file} placeholders.

Runs assume exclusive use of the output directory; do not run two exports
into the same directory at once.

Set NOTEBOOK_LOG_LEVEL (error, warn, info, debug) to control logging.
Run 'notebook-export gen-config' to generate a documented notebook.toml.")]
#[command(version)]
struct Cli {
    /// Project root containing pages/ and resources/
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory [default: <root>/compilation/output]
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// HTML output path [default: <output>/notebook.html]
    #[arg(long, global = true)]
    html_path: Option<PathBuf>,

    /// PDF output path [default: <output>/notebook.pdf]
    #[arg(long, global = true)]
    pdf_path: Option<PathBuf>,

    /// Write the HTML only; do not launch a browser
    #[arg(long, global = true)]
    skip_pdf: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Export the notebook to HTML and PDF (default)
    Build,
    /// Validate the manifest and page files without writing anything
    Check,
    /// Print a stock notebook.toml with all options documented
    GenConfig,
}

fn init_logging() {
    env_logger::Builder::from_env(Env::new().filter_or("NOTEBOOK_LOG_LEVEL", "info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let config = config::load_config(&cli.root)?;
            println!("==> Exporting {}", cli.root.display());
            let options = ExportOptions {
                root: cli.root.clone(),
                output_dir: cli.output,
                html_path: cli.html_path,
                pdf_path: cli.pdf_path,
                skip_pdf: cli.skip_pdf,
            };
            let report = notebook::export(
                &options,
                &config,
                RustBackend::new(),
                &ChromeRasterizer::default(),
            )?;
            let root = std::fs::canonicalize(&cli.root)?;
            output::print_export_output(&report, &root, &config.pages_dir);
            println!("==> Export complete: {}", report.output_dir.display());
        }
        Command::Check => {
            let config = config::load_config(&cli.root)?;
            println!("==> Checking {}", cli.root.display());
            let report = notebook::check(&cli.root, &config)?;
            let root = std::fs::canonicalize(&cli.root)?;
            output::print_check_output(&report, &root, &config.pages_dir);
            println!("==> Notebook is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
