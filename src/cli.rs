use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Turn proxy subscription feeds into V2Ray engine configs", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "Feed to read, accept file path or URL", conflicts_with = "source")]
    pub input: Option<String>,

    #[arg(short, long, help = "Index of the configured source to fetch [default: 0]")]
    pub source: Option<usize>,

    #[arg(short = 'c', long = "sources", help = "Sources config TOML file")]
    pub sources_config: Option<String>,

    #[arg(short, long, help = "Maximum number of servers to read from the feed")]
    pub limit: Option<usize>,

    #[arg(short = 'n', long, default_value_t = 0, help = "Index of the server to emit")]
    pub index: usize,

    #[arg(short, long, help = "Pick the server interactively", conflicts_with = "index")]
    pub pick: bool,

    #[arg(long, help = "List decoded servers and exit")]
    pub list: bool,

    #[arg(short, long, help = "Engine config output path, '-' for stdout")]
    pub output: Option<String>,

    #[arg(short, long, help = "Emit debug log")]
    pub verbose: bool,
}
