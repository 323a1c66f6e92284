use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "portfolio-metrics")]
#[command(about = "Fetch OpenAlex metrics and render a static portfolio page", version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory holding metrics.json and news.json
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log CPU and memory usage per phase
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch works from OpenAlex and write metrics.json
    Fetch(FetchArgs),
    /// Render the page from metrics.json and news.json
    Render(RenderArgs),
    /// Fetch, then render
    Build {
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FetchArgs {
    /// OpenAlex author id (A..., digits, or full URL)
    #[arg(long, env = "OPENALEX_AUTHOR_ID")]
    pub author_id: Option<String>,

    /// Contact email sent as `mailto` for the OpenAlex polite pool
    #[arg(long, env = "OPENALEX_EMAIL")]
    pub email: Option<String>,

    /// OpenAlex API base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// Works per page (1-200)
    #[arg(long)]
    pub per_page: Option<usize>,

    /// Pause between pages, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RenderArgs {
    /// Directory the page is written to
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Rows shown in each top-N table
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Page title
    #[arg(long)]
    pub title: Option<String>,

    /// Also write site.zip with the generated files
    #[arg(long)]
    pub bundle: bool,
}

impl FetchArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(id) = &self.author_id {
            settings.author_id = id.clone();
        }
        if let Some(email) = &self.email {
            settings.mailto = Some(email.clone());
        }
        if let Some(api_base) = &self.api_base {
            settings.api_base = api_base.clone();
        }
        if let Some(per_page) = self.per_page {
            settings.per_page = per_page;
        }
        if let Some(delay) = self.delay_ms {
            settings.request_delay_ms = delay;
        }
    }
}

impl RenderArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(out_dir) = &self.out_dir {
            settings.output_dir = out_dir.clone();
        }
        if let Some(top_n) = self.top_n {
            settings.top_n = top_n;
        }
        if let Some(title) = &self.title {
            settings.site_title = title.clone();
        }
        if self.bundle {
            settings.bundle = true;
        }
    }
}

impl Cli {
    /// Layers defaults, the optional TOML file and the command line.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path);
            settings.apply_toml(&TomlConfig::from_file(path)?);
        }

        if let Some(data_dir) = &self.data_dir {
            settings.data_dir = data_dir.clone();
        }

        match &self.command {
            Command::Fetch(fetch) => fetch.apply(&mut settings),
            Command::Render(render) => render.apply(&mut settings),
            Command::Build { fetch, render } => {
                fetch.apply(&mut settings);
                render.apply(&mut settings);
            }
        }

        settings.finalize()
    }
}
