use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mcp_activity::commands::{
    self, AnalyzeOptions, RefetchOptions, VisualizeOptions,
};
use mcp_activity::config::{Config, DEFAULT_MAX_CONCURRENT};

/// mcp-activity - MCP server activity vs popularity
///
/// Lists every server in the MCP registry, looks up GitHub stars and the date
/// of the last commit for each, saves the result as CSV and plots it.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// Unauthenticated runs hit the GitHub rate limit quickly; `refetch` fills the gaps later.
///
/// Examples:
///   mcp-activity analyze                    # Full run
///   mcp-activity refetch mcp_servers_data.csv
///   mcp-activity visualize mcp_servers_data.csv --log-scale
#[derive(Parser, Debug)]
#[command(author, version = env!("MCP_ACTIVITY_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch the registry and GitHub stats, save the table and plot it
    Analyze(AnalyzeArgs),

    /// Refetch missing GitHub stats in an existing table
    Refetch(RefetchArgs),

    /// Plot an existing table
    Visualize(VisualizeArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Maximum concurrent GitHub API requests (1-50)
    #[arg(long, short = 'c', default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,

    /// GitHub API token
    #[arg(
        long = "github-token",
        short = 't',
        env = "GITHUB_TOKEN",
        hide_env_values = true
    )]
    pub github_token: Option<String>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Registry listing URL (defaults to the official MCP registry)
    #[arg(long = "registry-url", value_name = "URL")]
    pub registry_url: Option<String>,

    /// Disable progress output
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl FetchArgs {
    fn config(&self) -> Result<Config> {
        Ok(Config::new(
            self.max_concurrent,
            self.github_token.clone(),
            self.api_url.clone(),
            self.registry_url.clone(),
        )?)
    }
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Where to save the collected table
    #[arg(long = "output-csv", short = 'o', default_value = "mcp_servers_data.csv")]
    pub output_csv: PathBuf,

    /// Where to save the scatter plot (SVG)
    #[arg(
        long = "output-plot",
        short = 'p',
        default_value = "mcp_activity_vs_popularity.svg"
    )]
    pub output_plot: PathBuf,

    /// Where to save the 2x2 overview plot (SVG)
    #[arg(
        long = "enhanced-plot",
        short = 'e',
        default_value = "mcp_activity_vs_popularity_enhanced.svg"
    )]
    pub enhanced_plot: PathBuf,

    /// Do not render the overview plot
    #[arg(long = "skip-enhanced")]
    pub skip_enhanced: bool,

    /// Use a log scale for stars
    #[arg(long = "log-scale", short = 'l')]
    pub log_scale: bool,

    /// Only collect the table, do not plot
    #[arg(long = "skip-plot")]
    pub skip_plot: bool,
}

#[derive(clap::Args, Debug)]
pub struct RefetchArgs {
    /// Table produced by `analyze`
    #[arg(value_name = "CSV")]
    pub input_csv: PathBuf,

    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Where to save the updated table (defaults to overwriting the input)
    #[arg(long = "output-csv", short = 'o')]
    pub output_csv: Option<PathBuf>,

    /// Refetch every row with a GitHub repository, not only the missing ones
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct VisualizeArgs {
    /// Table produced by `analyze`
    #[arg(value_name = "CSV")]
    pub input_csv: PathBuf,

    /// Where to save the scatter plot (SVG)
    #[arg(
        long = "output-plot",
        short = 'p',
        default_value = "mcp_activity_vs_popularity.svg"
    )]
    pub output_plot: PathBuf,

    /// Where to save the 2x2 overview plot (SVG)
    #[arg(
        long = "enhanced-plot",
        short = 'e',
        default_value = "mcp_activity_vs_popularity_enhanced.svg"
    )]
    pub enhanced_plot: PathBuf,

    /// Do not render the overview plot
    #[arg(long = "skip-enhanced")]
    pub skip_enhanced: bool,

    /// Use a log scale for stars
    #[arg(long = "log-scale", short = 'l')]
    pub log_scale: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => {
            let config = args.fetch.config()?;
            let options = AnalyzeOptions {
                output_csv: args.output_csv,
                output_plot: args.output_plot,
                enhanced_plot: (!args.skip_enhanced).then_some(args.enhanced_plot),
                log_scale: args.log_scale,
                skip_plot: args.skip_plot,
                show_progress: !args.fetch.no_progress,
            };
            commands::analyze(&config, &options).await?
        }
        Commands::Refetch(args) => {
            let config = args.fetch.config()?;
            let options = RefetchOptions {
                input_csv: args.input_csv,
                output_csv: args.output_csv,
                force: args.force,
                show_progress: !args.fetch.no_progress,
            };
            commands::refetch(&config, &options).await?
        }
        Commands::Visualize(args) => {
            let options = VisualizeOptions {
                input_csv: args.input_csv,
                output_plot: args.output_plot,
                enhanced_plot: (!args.skip_enhanced).then_some(args.enhanced_plot),
                log_scale: args.log_scale,
            };
            commands::visualize(&options)?
        }
    }
    Ok(())
}
