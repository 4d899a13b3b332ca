use url::Url;
use std::path::PathBuf;
use std::time;
use crate::errors::PipelineError;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 8000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

/// Page bounds for the playlist fetch
pub const PAGE_LIMIT_MAX: u32 = 100;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Wrapper over env::var to return an invalid environment var error
fn env_check(s: &str) -> Result<String, PipelineError> {
    match std::env::var(s) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PipelineError::Config(format!("{s} was not set"))),
    }
}

/// Ensures that url is https
fn ensure_https(url: &Url) -> Result<(), String> {
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(format!("URL must be https: {url}"))
    }
}

fn ensure_host(url: &Url, expected_host: &str) -> Result<(), String> {
    match url.host_str() {
        Some(h) if h.eq_ignore_ascii_case(expected_host) => Ok(()),
        Some(h) => Err(
            format!("Unexpected host for {url} (got {h}, expected {expected_host})")
        ),
        None => Err(format!("URL missing host: {url}"))
    }
}

/// Configuration that Spotify expects when hitting endpoints
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: Url,
    pub api_base: Url,
}

fn build_spotify() -> Result<SpotifyConfig, PipelineError> {
    let client_id     = env_check("SPOTIFY_CLIENT_ID")?;
    let client_secret = env_check("SPOTIFY_CLIENT_SECRET")?;

    // form urls
    let token_url = std::env::var("SPOTIFY_TOKEN_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/api/token".to_string());

    let api_base  = std::env::var("SPOTIFY_API_BASE")
        .unwrap_or_else(|_| "https://api.spotify.com/v1/".to_string());

    let token_url = Url::parse(&token_url)
        .map_err(|e| PipelineError::Config(
                format!("SPOTIFY_TOKEN_URL invalid: {e}")
        ))?;

    let mut api_base  = Url::parse(&api_base)
        .map_err(|e| PipelineError::Config(
                format!("SPOTIFY_API_BASE invalid: {e}")
        ))?;

    // ensure valid https and hostname for both urls
    ensure_https(&token_url).map_err(PipelineError::Config)?;
    ensure_https(&api_base).map_err(PipelineError::Config)?;
    ensure_host(&token_url, "accounts.spotify.com")
        .map_err(PipelineError::Config)?;
    ensure_host(&api_base, "api.spotify.com")
        .map_err(PipelineError::Config)?;

    if !api_base.path().ends_with('/') {
        let mut path = api_base.path().to_string();
        path.push('/');
        api_base.set_path(&path);
    }

    Ok( SpotifyConfig { client_id, client_secret, token_url, api_base })
}

///
/// Which playlist one extract invocation pulls and how many
/// pages it may take before stopping
///
#[derive(Debug, Clone)]
pub struct PlaylistConfig {
    pub playlist_id: String,
    pub page_limit: u32,  // items per page, api caps at 100
    pub max_pages: u32,   // bound on one invocation's walk
}

fn build_playlist() -> Result<PlaylistConfig, PipelineError> {
    let playlist_id = env_check("PLAYLIST_ID")?;

    let env_to_uint = |s: &str, default: u32| -> u32 {
        match std::env::var(s) {
            Ok(s) => {
                match s.parse::<u32>() {
                    Ok(value) => value,
                    _ => default
                }
            },
            Err(_) => {
                default
            }
        }
    };

    let page_limit = env_to_uint("PLAYLIST_PAGE_LIMIT", DEFAULT_PAGE_LIMIT)
        .clamp(1, PAGE_LIMIT_MAX);
    let max_pages  = env_to_uint("PLAYLIST_MAX_PAGES", DEFAULT_MAX_PAGES).max(1);

    Ok( PlaylistConfig { playlist_id, page_limit, max_pages } )
}

///
/// Where raw and tabular objects land. The root is the local
/// mount standing in for the bucket; prefixes under it are
/// fixed in src/sink.rs and src/records.rs
///
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { data_root: PathBuf::from("./data") }
    }
}

fn build_store() -> StoreConfig {
    match std::env::var("DATA_ROOT") {
        Ok(v) if !v.trim().is_empty() => StoreConfig { data_root: PathBuf::from(v) },
        _ => StoreConfig::default()
    }
}

///
/// Configuration for Http timeouts, pooling, etc. Requests are
/// single attempt; re-invocation policy lives outside this crate
///
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
        }
    }
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,playlist_etl=debug,reqwest=warn".to_string(),
            format: LogFormat::Json,
            with_ansi: true,
            include_file_line: true,
            include_target: true,
        }
    }
}

fn build_logging() -> LoggingConfig {
    let mut cfg = LoggingConfig::default();
    if std::env::var("LOG_FORMAT").ok().as_deref() == Some("pretty") {
        cfg.format = LogFormat::Pretty;
    }
    cfg
}

///
/// Everything the extract invocation needs
///
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub spotify: SpotifyConfig,
    pub playlist: PlaylistConfig,
    pub store: StoreConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig
}

///
/// The transform invocation stays off the api, so it only
/// carries the store and logging sections. It must run where no
/// api credentials are set
///
#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig
}

///
/// Return all environment variables the extract entry point
/// needs at program start.
///
pub fn load_extract_config() -> Result<ExtractConfig, PipelineError> {
    dotenvy::dotenv().ok();

    let spotify  = build_spotify()?;
    let playlist = build_playlist()?;
    let store    = build_store();
    let http     = HttpConfig::default();
    let logging  = build_logging();

    Ok( ExtractConfig { spotify, playlist, store, http, logging } )
}

pub fn load_transform_config() -> Result<TransformConfig, PipelineError> {
    dotenvy::dotenv().ok();

    let store   = build_store();
    let logging = build_logging();

    Ok( TransformConfig { store, logging } )
}
