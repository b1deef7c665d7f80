use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::NonEmptyStringValueParser;
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use rayon::prelude::*;
use tokcount::{Counter, Error, Server, VERSION};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const SERVE_HELP: &str = "Serve protocol: client sends [u32 LE length][bytes], \
                          server answers \"<count>\\n\" (a bare \"\\n\" for length 0).";

/// Count tokens in text, files, or stdin.
#[derive(Parser)]
#[command(name = "tokcount", version = VERSION, after_help = SERVE_HELP)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["text", "file", "stdin", "serve"])
))]
struct Cli {
    /// Counter provider: default, bpe (alias openai), or tiktoken
    #[arg(long, env = "TOKCOUNT_PROVIDER", default_value = "default")]
    provider: String,

    /// Model identifier, e.g. /data/o200k_base.tiktoken
    #[arg(long, env = "TOKCOUNT_MODEL", value_parser = NonEmptyStringValueParser::new())]
    model: String,

    /// Count this text
    #[arg(long)]
    text: Option<String>,

    /// Count a file (repeatable)
    #[arg(long)]
    file: Vec<PathBuf>,

    /// Count everything read from stdin
    #[arg(long)]
    stdin: bool,

    /// Answer length-prefixed requests on stdin/stdout
    #[arg(long)]
    serve: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

struct Input {
    name: Option<String>,
    bytes: Vec<u8>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// An empty `--text` counts as not given.
fn text_input(cli: &Cli) -> Option<&str> {
    cli.text.as_deref().filter(|t| !t.is_empty())
}

/// Rejects `--text ""` when no other input source is selected.
fn validate(cli: &Cli) -> Result<(), clap::Error> {
    if text_input(cli).is_none() && cli.file.is_empty() && !cli.stdin && !cli.serve {
        return Err(Cli::command().error(
            ErrorKind::MissingRequiredArgument,
            "one of --text (non-empty), --file, --stdin or --serve is required",
        ));
    }
    Ok(())
}

fn read_inputs(cli: &Cli) -> tokcount::Result<Vec<Input>> {
    if let Some(text) = text_input(cli) {
        return Ok(vec![Input {
            name: None,
            bytes: text.as_bytes().to_vec(),
        }]);
    }
    if !cli.file.is_empty() {
        return cli
            .file
            .iter()
            .map(|path| {
                let bytes = fs::read(path).map_err(|source| Error::ReadInput {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(Input {
                    name: Some(path.display().to_string()),
                    bytes,
                })
            })
            .collect();
    }
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;
    Ok(vec![Input { name: None, bytes: buf }])
}

fn format_line(count: &str, label: &str) -> String {
    format!("{:>8} {}\n", count, label)
}

fn report<W: Write>(out: &mut W, cli: &Cli, inputs: &[Input], counts: &[usize]) -> io::Result<()> {
    let total: usize = counts.iter().sum();

    if cli.json {
        let value = if inputs.len() == 1 {
            serde_json::json!({
                "provider": cli.provider,
                "model": cli.model,
                "tokens": total,
            })
        } else {
            let files: Vec<serde_json::Value> = inputs
                .iter()
                .zip(counts)
                .map(|(input, count)| {
                    serde_json::json!({ "path": input.name, "tokens": count })
                })
                .collect();
            serde_json::json!({
                "provider": cli.provider,
                "model": cli.model,
                "files": files,
                "total": total,
            })
        };
        return writeln!(out, "{}", value);
    }

    if inputs.len() == 1 {
        return writeln!(out, "{}", total);
    }
    for (input, count) in inputs.iter().zip(counts) {
        write!(
            out,
            "{}",
            format_line(&count.to_string(), input.name.as_deref().unwrap_or(""))
        )?;
    }
    write!(out, "{}", format_line(&total.to_string(), "total"))
}

fn run(cli: &Cli) -> tokcount::Result<()> {
    let counter = tokcount::create(&cli.provider, &cli.model)?;

    if cli.serve {
        let served = Server::new(counter).run(io::stdin().lock(), io::stdout().lock())?;
        debug!(served, "input closed, stopping server");
        return Ok(());
    }

    let inputs = read_inputs(cli)?;
    let count_one = |input: &Input| counter.count(&input.bytes);
    let counts: Vec<usize> = if inputs.len() > 1 {
        inputs.par_iter().map(count_one).collect()
    } else {
        inputs.iter().map(count_one).collect()
    };

    report(&mut io::stdout().lock(), cli, &inputs, &counts)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse().and_then(|cli| validate(&cli).map(|()| cli)) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(e.exit_code() as u8);
        }
    };
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
