use clap::{Args, Parser as ClapParser, Subcommand};
use linq_rewrite::cli::{self, CliError, Pass, PassOptions, PassResult};
use linq_rewrite::{DEFAULT_TRANSIENT_PREFIX, RewriteOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "linq-rewrite")]
#[command(about = "linq-rewrite - Normalize query and index-definition expression trees")]
#[command(version)]
struct Cli {
    /// Log rewrite decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// JSON expression tree (reads from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the root identifiers a tree depends on
    Roots {
        #[command(flatten)]
        input: InputArgs,

        /// Leave out roots bound by an enclosing lambda
        #[arg(long)]
        free: bool,
    },

    /// Normalize SelectMany calls into the two-lambda form
    SelectMany {
        #[command(flatten)]
        input: InputArgs,

        /// First transient id
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Prefix of transient identifiers
        #[arg(long, default_value = DEFAULT_TRANSIENT_PREFIX)]
        prefix: String,
    },

    /// Expand comparisons on any-paths into ANY quantifiers
    ExpandAny {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Render a tree through the operator templates
    Render {
        /// JSON expression tree (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Show the tree encoding and the available passes
    Docs,

    /// List operators and their render templates
    Operators,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let result = match cli.command {
        Commands::Roots { input, free } => {
            let pass = if free { Pass::FreeRoots } else { Pass::Roots };
            run_pass(pass, input, RewriteOptions::default())
        }
        Commands::SelectMany {
            input,
            seed,
            prefix,
        } => run_pass(
            Pass::SelectMany,
            input,
            RewriteOptions::seeded(seed).with_prefix(prefix),
        ),
        Commands::ExpandAny { input } => run_pass(Pass::ExpandAny, input, RewriteOptions::default()),
        Commands::Render { input } => run_pass(
            Pass::Render,
            InputArgs {
                input,
                pretty: false,
            },
            RewriteOptions::default(),
        ),
        Commands::Docs => {
            print!("{}", cli::get_encoding_overview());
            Ok(())
        }
        Commands::Operators => {
            print!("{}", cli::get_operator_reference());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_pass(pass: Pass, args: InputArgs, rewrite: RewriteOptions) -> Result<(), CliError> {
    let input = match args.input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = PassOptions {
        pass,
        input,
        rewrite,
    };

    let json = match cli::execute_pass(&options)? {
        PassResult::Text(text) => {
            println!("{}", text);
            return Ok(());
        }
        PassResult::Roots(roots) => serde_json::Value::from(roots),
        PassResult::Tree { tree, changed } => {
            tracing::debug!(changed, "pass finished");
            tree
        }
    };

    let out = if args.pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_takes_input_only() {
        let cli = Cli::try_parse_from(["linq-rewrite", "render", "-i", "{\"path\": \"x\"}"]).unwrap();
        assert!(matches!(cli.command, Commands::Render { input: Some(_) }));

        assert!(Cli::try_parse_from(["linq-rewrite", "render", "--pretty"]).is_err());
    }

    #[test]
    fn test_tree_commands_accept_pretty() {
        let cli = Cli::try_parse_from(["linq-rewrite", "expand-any", "--pretty"]).unwrap();
        match cli.command {
            Commands::ExpandAny { input } => assert!(input.pretty),
            _ => panic!("Expected expand-any"),
        }
    }
}
