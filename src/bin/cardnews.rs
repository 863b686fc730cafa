use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cardnews_renderer::{
    AspectRatio, CardError, CardNewsPipeline, CardResult, RenderProfile, RenderRequest,
    load_user_image, write_archive, write_cards,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cardnews", version, about = "Turn a news article into card-news slides")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a deck for an article URL.
    Render(RenderArgs),
    /// Print the default profile as JSON.
    Profile,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Article URL.
    url: String,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Profile JSON; command-line flags override it.
    #[arg(long)]
    profile: Option<PathBuf>,

    #[arg(long, value_enum)]
    aspect: Option<AspectArg>,

    /// Sample the accent color from the main background image.
    #[arg(long)]
    auto_color: bool,

    /// Use this image as the only background instead of scraped ones.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Logo symbol (file path or URL).
    #[arg(long)]
    logo_symbol: Option<String>,

    /// Logo wordmark (file path or URL).
    #[arg(long)]
    logo_wordmark: Option<String>,

    /// Directory for downloaded fonts and logos.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Seed for the content layout variety.
    #[arg(long)]
    seed: Option<u64>,

    /// Output archive (.zip) or directory.
    #[arg(long, default_value = "cardnews.zip")]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AspectArg {
    Square,
    Story,
}

impl From<AspectArg> for AspectRatio {
    fn from(arg: AspectArg) -> Self {
        match arg {
            AspectArg::Square => AspectRatio::Square,
            AspectArg::Story => AspectRatio::Story,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Profile => cmd_profile(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, fatal = err.is_fatal(), "cardnews failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_profile() -> CardResult<()> {
    println!("{}", RenderProfile::new().to_json_pretty()?);
    Ok(())
}

fn build_profile(args: &RenderArgs) -> CardResult<RenderProfile> {
    let mut profile = match &args.profile {
        Some(path) => RenderProfile::from_path(path)?,
        None => RenderProfile::new(),
    };
    if let Some(aspect) = args.aspect {
        profile.aspect = aspect.into();
    }
    if args.auto_color {
        profile.auto_color = true;
    }
    if let Some(symbol) = &args.logo_symbol {
        profile.branding.logo_symbol = Some(symbol.clone());
    }
    if let Some(wordmark) = &args.logo_wordmark {
        profile.branding.logo_wordmark = Some(wordmark.clone());
    }
    if let Some(dir) = &args.cache_dir {
        profile.fonts.cache_dir = Some(dir.clone());
    }
    Ok(profile)
}

fn cmd_render(args: RenderArgs) -> CardResult<()> {
    let profile = build_profile(&args)?;

    let mut request = RenderRequest::new(args.url.clone());
    if let Some(path) = &args.image {
        request = request.with_user_image(load_user_image(path)?);
    }
    if let Some(seed) = args.seed {
        request = request.with_seed(seed);
    }

    let mut pipeline = CardNewsPipeline::http(&profile, &args.api_key)?;
    let bundle = pipeline.run(&request)?;

    for failure in &bundle.failures {
        eprintln!("slide {} ({}) skipped: {}", failure.index, failure.kind.name(), failure.error);
    }

    write_output(&args.out, &bundle.deck, &bundle.hashtags)?;
    println!("{} cards written to {}", bundle.deck.len(), args.out.display());
    if !bundle.hashtags.is_empty() {
        println!("{}", bundle.hashtags);
    }
    Ok(())
}

fn write_output(out: &Path, deck: &cardnews_renderer::CardDeck, hashtags: &str) -> CardResult<()> {
    let is_zip = out
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip {
        write_archive(out, deck, hashtags)
    } else if out.is_file() {
        Err(CardError::input(format!("{} exists and is not a directory", out.display())))
    } else {
        write_cards(out, deck)
    }
}
