//! iam-match CLI
//!
//! Evaluates wildcard patterns, templates, and conditions from the command
//! line. Exit status: 0 = match/allow, 1 = no match/deny, 2 = error.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use iam_match::iam::{
    compile_template_with_budget, evaluate_conditions, ConditionKeyRegistry, PatternMatcher,
    RequestInfo,
};
use iam_match::MatcherConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "iam-match")]
#[command(about = "Evaluate IAM wildcard patterns and policy conditions")]
struct Args {
    /// Matcher configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match an identifier against a comma-separated pattern list
    Match {
        /// Identifier from the request (e.g. ecs:DescribeInstances)
        candidate: String,
        /// Pattern list from the policy (e.g. "ecs:Describe*,ecs:List*")
        patterns: String,
    },

    /// Compile a delimiter template and match a candidate against it
    Template {
        /// Template with embedded regex fragments (e.g. "id:<[0-9]+>")
        template: String,
        candidate: String,
        /// Opening delimiter
        #[arg(long, default_value = "<")]
        open: char,
        /// Closing delimiter
        #[arg(long, default_value = ">")]
        close: char,
    },

    /// Evaluate a condition document against a context document
    Eval {
        /// Context JSON, e.g. '{"inf:SourceIP": "10.0.0.1"}'
        #[arg(long)]
        context: String,
        /// Condition JSON, e.g. '{"IPAddress": {"inf:SourceIP": ["10.0.0.0/8"]}}'
        #[arg(long)]
        condition: String,
    },

    /// Print the context the built-in condition keys produce for a request
    Context {
        /// Peer address (host:port)
        #[arg(long, default_value = "127.0.0.1:0")]
        remote_addr: String,
        /// Request header as name=value (repeatable)
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
}

fn parse_header(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("Invalid header '{}'. Expected name=value", s)),
    }
}

fn delimiter(c: char) -> Result<u8> {
    if !c.is_ascii() {
        bail!("Delimiter '{}' must be a single ASCII character", c);
    }
    Ok(c as u8)
}

fn verdict(matched: bool) -> ExitCode {
    println!("{}", matched);
    if matched {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = match &args.config {
        Some(path) => MatcherConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MatcherConfig::default(),
    };
    debug!("Matcher config: {:?}", config);

    match args.command {
        Command::Match {
            candidate,
            patterns,
        } => {
            let matcher = PatternMatcher::new(&config);
            Ok(verdict(matcher.matches(&candidate, &patterns)?))
        }
        Command::Template {
            template,
            candidate,
            open,
            close,
        } => {
            let compiled = compile_template_with_budget(
                &template,
                delimiter(open)?,
                delimiter(close)?,
                config.match_timeout(),
            )?;
            info!("Template compiled to {}", compiled.as_regex_str());
            Ok(verdict(compiled.is_match(&candidate)?))
        }
        Command::Eval { context, condition } => {
            Ok(verdict(evaluate_conditions(&context, &condition)?))
        }
        Command::Context {
            remote_addr,
            headers,
        } => {
            let mut request = RequestInfo::new(remote_addr);
            for (name, value) in headers {
                request.insert_header(&name, value);
            }
            let context = ConditionKeyRegistry::with_defaults().build_context(&request);
            println!("{}", serde_json::to_string_pretty(&context)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
