use clap::{Parser, Subcommand};
use pagecraft::services::MemoryStorage;
use pagecraft::{
    Document, Error, Generator, GeneratorConfig, ImageFetcher, PageSize, PreviewFormat,
    PreviewGenerator, Properties, Template, TemplateProcessor,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pagecraft", about = "Compose PDF documents from JSON element lists")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a document JSON file to PDF
    Generate {
        /// Input document JSON file
        input: PathBuf,
        /// Output PDF file (defaults to input with .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Extra directory to search for TrueType fonts (repeatable)
        #[arg(long = "fonts")]
        font_dirs: Vec<PathBuf>,
        /// Page size for documents without a template (letter, legal, a3, a4, a5)
        #[arg(long)]
        page_size: Option<String>,
    },
    /// Build a quick preview of a document JSON file
    Preview {
        input: PathBuf,
        /// pdf, json or html
        #[arg(long, default_value = "html")]
        format: String,
        /// Only preview this page
        #[arg(long)]
        page: Option<u32>,
        /// Output file (defaults to input with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Instantiate a template JSON file into a document JSON file
    Instantiate {
        template: PathBuf,
        /// JSON object with the values to fill in
        #[arg(long)]
        data: Option<PathBuf>,
        /// Output document JSON file (defaults to template with .document.json extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Generate {
            input,
            output,
            font_dirs,
            page_size,
        } => {
            let mut document: Document = read_json(&input)?;
            let mut config = GeneratorConfig::from_env();
            config.font_dirs.extend(font_dirs);
            if let Some(name) = page_size {
                config.page_size = PageSize::named(&name)
                    .ok_or_else(|| Error::UnsupportedFormat(format!("page size '{name}'")))?;
            }

            let fetcher = image_fetcher(&config)?;
            let storage = MemoryStorage::new();
            let generator = Generator::new(config, fetcher.as_ref(), &storage);
            let bytes = generator.generate(&mut document)?;

            let output = output.unwrap_or_else(|| input.with_extension("pdf"));
            std::fs::write(&output, bytes)?;
            log::info!("wrote {}", output.display());
            Ok(())
        }
        Command::Preview {
            input,
            format,
            page,
            output,
        } => {
            let format: PreviewFormat = format.parse()?;
            let document: Document = read_json(&input)?;
            let preview = PreviewGenerator::new(&document).generate_preview(format, page)?;
            let output = output.unwrap_or_else(|| input.with_extension(format.to_string()));
            std::fs::write(&output, preview.into_bytes()?)?;
            log::info!("wrote {}", output.display());
            Ok(())
        }
        Command::Instantiate {
            template,
            data,
            output,
        } => {
            let parsed: Template = read_json(&template)?;
            let data: Properties = match data {
                Some(path) => read_json(&path)?,
                None => Properties::new(),
            };
            let document = TemplateProcessor::new(Arc::new(parsed), data).process();
            let output = output.unwrap_or_else(|| template.with_extension("document.json"));
            std::fs::write(&output, serde_json::to_vec_pretty(&document)?)?;
            log::info!(
                "wrote {} ({} elements)",
                output.display(),
                document.elements.len()
            );
            Ok(())
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(feature = "http")]
fn image_fetcher(config: &GeneratorConfig) -> Result<Box<dyn ImageFetcher>, Error> {
    Ok(Box::new(pagecraft::services::HttpImageFetcher::new(
        config.fetch_timeout,
    )?))
}

#[cfg(not(feature = "http"))]
fn image_fetcher(_config: &GeneratorConfig) -> Result<Box<dyn ImageFetcher>, Error> {
    Ok(Box::new(pagecraft::services::StaticFetcher::new()))
}
