//! Lorikeet CLI
//!
//! Parses an SGML/HTML document and prints the event stream, followed by a
//! summary of the reported diagnostics.
//!
//! - lorikeet page.html             # Colored event listing
//! - lorikeet --json page.html      # Events and diagnostics as JSON
//! - lorikeet --html '<p>x&amp;y'   # Parse a string

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use lorikeet_common::{CollectingLogger, ConsoleLogger, Diagnostic, Logger};
use lorikeet_sgml::{Attr, Event, EventRecorder, FileResolver, ParserConfig, SgmlParser, Source};
use owo_colors::OwoColorize;
use serde_json::json;

/// Lorikeet - tolerant SGML/HTML parser
#[derive(Parser, Debug)]
#[command(name = "lorikeet")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the events of a document
    lorikeet ./index.html

    # Parse a string
    lorikeet --html '<!DOCTYPE d [<!ENTITY who "world">]><p>hello &who;'

    # Declare the encoding of the input
    lorikeet --charset windows-1252 ./legacy.html

    # Machine readable output
    lorikeet --json ./index.html

    # Options from a JSON file, e.g. {"html5_compat": false}
    lorikeet --config sgml.json ./doc.sgml
"#)]
struct Cli {
    /// Document to parse
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Parse this string instead of a file
    #[arg(long, value_name = "HTML", conflicts_with = "path")]
    html: Option<String>,

    /// Character encoding of the input (default: UTF-8)
    #[arg(long, value_name = "LABEL")]
    charset: Option<String>,

    /// Parser options as a JSON file; flags below override it
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Print events and diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Ignore <meta> charset declarations
    #[arg(long)]
    no_meta_switch: bool,

    /// Match names case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Use XML 1.0 name characters
    #[arg(long)]
    xml_names: bool,

    /// Do not report comments
    #[arg(long)]
    no_comments: bool,

    /// Treat warnings as errors and require ';' after parameter entity references
    #[arg(long)]
    strict: bool,

    /// Stop at the first error
    #[arg(long)]
    fatal: bool,
}

impl Cli {
    fn parser_config(&self) -> anyhow::Result<ParserConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config '{}'", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid config '{}'", path.display()))?
            }
            None => ParserConfig::default(),
        };
        if self.no_meta_switch {
            config.enable_meta_charenc_switching = false;
        }
        if self.case_sensitive {
            config.case_insensitive = false;
        }
        if self.xml_names {
            config.accept_xml_1_0_names = true;
        }
        if self.no_comments {
            config.report_comments = false;
        }
        if self.strict {
            config.treat_warnings_as_errors = true;
            config.strict_references = true;
        }
        if self.fatal {
            config.die_on_first_error = true;
        }
        Ok(config)
    }
}

/// Keeps every diagnostic for the summary, echoing it to stderr unless the
/// output is JSON.
struct SummaryLogger {
    console: Option<ConsoleLogger>,
    collected: CollectingLogger,
}

impl Logger for SummaryLogger {
    fn log(&mut self, diagnostic: Diagnostic) {
        if let Some(console) = &mut self.console {
            console.log(diagnostic.clone());
        }
        self.collected.log(diagnostic);
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.parser_config()?;

    let (bytes, system_ident) = match (&cli.html, &cli.path) {
        (Some(html), _) => (html.clone().into_bytes(), String::new()),
        (None, Some(path)) => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
            (bytes, path.to_string_lossy().into_owned())
        }
        (None, None) => anyhow::bail!("expected a file path or --html"),
    };
    let charset = cli.charset.as_deref().unwrap_or("UTF-8");
    let source = Source::from_bytes(&bytes)
        .with_charenc(charset)
        .with_system_ident(&system_ident);

    let mut recorder = EventRecorder::new();
    let mut resolver = FileResolver::new(charset);
    let mut logger = SummaryLogger {
        console: (!cli.json).then(ConsoleLogger::new),
        collected: CollectingLogger::new(),
    };
    let result = SgmlParser::new(config).parse(source, &mut recorder, &mut resolver, &mut logger);

    let diagnostics = &logger.collected;
    if cli.json {
        let output = json!({
            "events": recorder.events,
            "diagnostics": diagnostics.diagnostics,
            "aborted": result.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for event in &recorder.events {
            print_event(event);
        }
        println!(
            "\n{} error(s), {} warning(s)",
            diagnostics.error_count(),
            diagnostics.warning_count()
        );
        if let Err(e) = &result {
            eprintln!("{} {e}", "parse aborted:".red().bold());
        }
    }

    if result.is_err() || diagnostics.error_count() > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_event(event: &Event) {
    match event {
        Event::DoctypeBegin {
            name,
            public_ident,
            system_ident,
        } => {
            let mut line = format!("<!DOCTYPE {name}");
            if let Some(public_ident) = public_ident {
                line.push_str(&format!(" PUBLIC {public_ident:?}"));
            } else if system_ident.is_some() {
                line.push_str(" SYSTEM");
            }
            if let Some(system_ident) = system_ident {
                line.push_str(&format!(" {system_ident:?}"));
            }
            println!("{}", line.magenta());
        }
        Event::DoctypeEnd => println!("{}", ">".magenta()),
        Event::ElemBegin { name, attrs } => {
            println!("{}{}{}", "<".cyan(), name.cyan().bold(), format_attrs(attrs));
        }
        Event::ElemEnd { name } => println!("{}{}{}", "</".cyan(), name.cyan().bold(), ">".cyan()),
        Event::Text { text } => println!("{}", format!("{text:?}").green()),
        Event::Comment { text } => println!("{}", format!("<!--{text}-->").dimmed()),
        Event::ProcInstr { text } => println!("{}", format!("<?{text}>").yellow()),
        Event::Script { attrs, content } => {
            println!("{}{}", "<script".blue().bold(), format_attrs(attrs));
            println!("{}", format!("{content:?}").blue());
        }
        Event::Style { attrs, content } => {
            println!("{}{}", "<style".blue().bold(), format_attrs(attrs));
            println!("{}", format!("{content:?}").blue());
        }
    }
}

fn format_attrs(attrs: &[Attr]) -> String {
    let mut out = String::new();
    for attr in attrs {
        out.push_str(&format!(" {}={:?}", attr.name.yellow(), attr.value));
    }
    out.push('>');
    out
}
