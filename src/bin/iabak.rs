use std::env;
use std::path::PathBuf;

use ia_backup::cli::CliOptions;

fn print_usage() {
    eprintln!("Usage: iabak [OPTIONS] [username]");
    eprintln!();
    eprintln!("Backs up every file uploaded by an Internet Archive account,");
    eprintln!("one folder per identifier, under the current directory.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -y, --yes              Skip the confirmation prompt");
    eprintln!("  -o, --output <DIR>     Destination root (default: ./<username>)");
    eprintln!("  -c, --concurrency <N>  Identifiers transferred in parallel");
    eprintln!("  -h, --help             Show this help");
    eprintln!();
    eprintln!("Exit codes: 0 completed, 1 enumeration failure, 2 cancelled,");
    eprintln!("            64 usage error.");
}

#[tokio::main]
async fn main() -> ia_backup::Result<()> {
    env_logger::init();

    let mut options = CliOptions::default();
    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-y" | "--yes" => options.yes = true,
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    options.output = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: --output requires a value");
                    std::process::exit(1);
                }
            }
            "-c" | "--concurrency" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse().ok()) {
                    Some(n) if n > 0 => options.concurrency = Some(n),
                    _ => {
                        eprintln!("Error: --concurrency requires a positive number");
                        std::process::exit(1);
                    }
                }
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: unknown option '{arg}'");
                print_usage();
                std::process::exit(1);
            }
            arg => {
                if options.username.is_some() {
                    eprintln!("Error: more than one username given");
                    std::process::exit(1);
                }
                options.username = Some(arg.to_string());
            }
        }
        i += 1;
    }

    let code = ia_backup::cli::run(options).await?;
    std::process::exit(code);
}
