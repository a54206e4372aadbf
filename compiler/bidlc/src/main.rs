//! bidl compiler CLI.

use bidlc::{commands, parse_args, CliError, CliOptions};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: bidlc check <files or dirs> [options]");
                std::process::exit(2);
            }
            run(commands::check, &args[2..]);
        }
        "dump-api" => {
            if args.len() < 3 {
                eprintln!("Usage: bidlc dump-api <files or dirs> --out=<dir> [options]");
                std::process::exit(2);
            }
            run(commands::dump_api, &args[2..]);
        }
        "check-api" => {
            if args.len() < 4 {
                eprintln!("Usage: bidlc check-api <old dump dir> <new dump dir> [options]");
                std::process::exit(2);
            }
            run(commands::check_api, &args[2..]);
        }
        "preprocess" => {
            if args.len() < 3 {
                eprintln!("Usage: bidlc preprocess <files or dirs> [--out=<file>]");
                std::process::exit(2);
            }
            run(commands::preprocess, &args[2..]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("bidlc {}", env!("CARGO_PKG_VERSION"));
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    }
}

fn run(command: fn(&CliOptions) -> Result<bool, CliError>, args: &[String]) {
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(2);
        }
    };
    match command(&options) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("BIDL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_usage() {
    println!("bidl compiler");
    println!();
    println!("Usage: bidlc <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <inputs>            Parse and validate source files");
    println!("  dump-api <inputs>         Write the canonical API dump (needs --out)");
    println!("  check-api <old> <new>     Compare two API dump trees for compatibility");
    println!("  preprocess <inputs>       Condense inputs into a one-line-per-type index");
    println!("  help                      Show this help message");
    println!("  version                   Show version information");
    println!();
    println!("Options:");
    println!("  --lang=<backend>          Target backend: java (default), cpp, ndk");
    println!("  --structured              Reject unstructured parcelables");
    println!("  -I <dir>                  Add an import root (repeatable)");
    println!("  --preprocessed=<file>     Register a preprocessed index (repeatable)");
    println!("  --out=<path>              Output directory (dump-api) or file (preprocess)");
    println!();
    println!("Logging is controlled by the BIDL_LOG environment variable.");
}
