//! torr-ctl: command-line client for torrd nodes.

use anyhow::{Context, Result};

mod cmd;

use cmd::client::Target;
use cmd::files::{cmd_chunk, cmd_download, cmd_upload};
use cmd::search::{cmd_local_search, cmd_replicate, cmd_search};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5011;

fn print_usage() {
    println!("Usage: torr-ctl [--host <host>] [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  upload <path>                  Store a file on the node");
    println!("  download <hash> [--out <path>] Fetch a whole file");
    println!("  chunk <hash> <index>           Fetch one chunk");
    println!("  local-search <pattern>         Match filenames on the node");
    println!("  search <pattern> <subnet>      Match filenames across a subnet");
    println!("  replicate <hash> <subnet>      Copy a file from subnet peers");
    println!();
    println!("Options:");
    println!("  --host <host>   Node host (default: {})", DEFAULT_HOST);
    println!("  --port <port>   Node port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --host, --port and --out
    let mut target = Target {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
    };
    let mut out: Option<String> = None;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                target.host = args.get(i).context("--host requires a value")?.clone();
            }
            "--port" => {
                i += 1;
                target.port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--out" => {
                i += 1;
                out = Some(args.get(i).context("--out requires a value")?.clone());
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["upload", path]                => cmd_upload(&target, path).await,
        ["download", hash]              => cmd_download(&target, hash, out.as_deref()).await,
        ["chunk", hash, index]          => cmd_chunk(&target, hash, index).await,
        ["local-search", pattern]       => cmd_local_search(&target, pattern).await,
        ["search", pattern, subnet]     => cmd_search(&target, pattern, subnet).await,
        ["replicate", hash, subnet]     => cmd_replicate(&target, hash, subnet).await,
        ["help"] | ["--help"] | ["-h"] | [] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
