use clap::Parser;
use sub_hunter::output::Format;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, default_value_t = false, global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Enumerate subdomains of a domain or of every domain in a file
    Scan {
        /// Target domain (e.g. example.com), URL, or path to file with newline-delimited domains
        target: String,

        /// Output directory
        #[arg(short = 'o', long, default_value = "./results")]
        out: String,

        /// Export format
        #[arg(short = 'f', long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Collector concurrency applied to every stage
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,

        /// Stage timeout in seconds (brute force is never timed out)
        #[arg(long)]
        timeout: Option<u64>,

        /// Run the DNS brute force stage
        #[arg(long, default_value_t = false)]
        brute: bool,

        /// Skip the liveness validation pass
        #[arg(long, default_value_t = false)]
        no_validate: bool,

        /// Only export hosts that validated as alive
        #[arg(long, default_value_t = false)]
        alive_only: bool,

        /// Brute force wordlist (overrides config)
        #[arg(long)]
        wordlist: Option<String>,

        /// YAML or JSON configuration file
        #[arg(long)]
        config: Option<String>,

        /// Collapse duplicate titles and 403 floods on large result sets
        #[arg(long, default_value_t = false)]
        postprocess: bool,
    },

    /// Print the configured stages and their collectors
    Modules {
        /// YAML or JSON configuration file
        #[arg(long)]
        config: Option<String>,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
