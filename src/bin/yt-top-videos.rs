use clap::Parser;
use tracing::info;
use yt_data_client::YouTubeClient;
use yt_draft_studio::{config::read_secret, telemetry};
use yt_oauth::{ClientSecret, OAUTH_CALLBACK_PORT, OAuthClient, OAuthConfig, start_loopback_flow};

/// Sign in from the terminal and list your channel's most viewed recent uploads
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// OAuth client secret document of an installed app (JSON content)
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Path to the OAuth client_secret.json file
    #[arg(long)]
    client_secret_path: Option<String>,

    /// Google API key for read-only Data API queries
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    /// Path to file containing the Google API key
    #[arg(long)]
    google_api_key_path: Option<String>,

    /// YouTube Data API address
    #[arg(long, env = "REST_API_ADDRESS", default_value = yt_data_client::DEFAULT_REST_API_ADDRESS)]
    rest_api_address: String,

    /// Number of recent uploads to rank
    #[arg(long, default_value_t = yt_data_client::DEFAULT_TOP_LIMIT)]
    limit: usize,

    /// Local port for the OAuth callback
    #[arg(long, default_value_t = OAUTH_CALLBACK_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();
    let args = Args::parse();

    let secret = ClientSecret::from_json(&read_secret(
        args.client_secret.as_deref(),
        args.client_secret_path.as_deref(),
        "OAuth client secret",
    )?)?;
    let api_key = read_secret(
        args.google_api_key.as_deref(),
        args.google_api_key_path.as_deref(),
        "Google API key",
    )?;

    let oauth = OAuthClient::new(OAuthConfig::loopback(secret, args.port));
    let credentials = start_loopback_flow(&oauth, args.port).await?;

    let youtube = YouTubeClient::new(&args.rest_api_address, api_key);
    let channel = youtube
        .resolve_own_channel(&credentials.access_token)
        .await?;
    info!(channel_id = %channel.id, "Ranking uploads");

    let top = youtube.list_top_items(&channel.id, args.limit).await?;

    println!("Top {} of the latest uploads on {}:", top.len(), channel.title);
    for (rank, video) in top.iter().enumerate() {
        println!("{:>3}. {:>12} views  {}", rank + 1, video.view_count, video.title);
    }
    Ok(())
}
