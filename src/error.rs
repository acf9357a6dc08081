use thiserror::Error;

/// Errors raised while building, sending or interpreting an AI tool request
#[derive(Error, Debug)]
pub enum AiError {
    /// Neither content nor a prompt was supplied
    #[error("Nothing to send: both content and prompt are empty")]
    EmptyInput,

    /// The selected provider has no request builder
    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    /// The selected provider needs an API key and none was configured
    #[error("No API key configured for provider '{0}'")]
    MissingApiKey(String),

    /// The provider answered with a non-2xx status
    #[error("Provider returned HTTP {status}: {body}")]
    ProviderHttp { status: u16, body: String },

    /// The provider envelope lacks the field holding the generated text
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// A JSON tool answer could not be located or parsed
    #[error("Invalid JSON in model output: {0}")]
    InvalidJson(String),

    /// A quiz item violates the question schema
    #[error("Invalid quiz question at index {index}: {reason}")]
    InvalidQuestionShape { index: usize, reason: String },

    /// A flashcard item violates the card schema
    #[error("Invalid flashcard at index {index}: {reason}")]
    InvalidFlashcardShape { index: usize, reason: String },

    /// The model returned fewer items than the tool accepts
    #[error("Expected at least {minimum} {kind}, got {actual}")]
    TooFewItems {
        kind: &'static str,
        minimum: usize,
        actual: usize,
    },

    /// Failed to reach the provider
    #[error("Request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API key cannot be used as an HTTP header value
    #[error("Header parse error: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Errors raised while resolving a YouTube transcript
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Invalid YouTube video id or URL: {0}")]
    InvalidVideoId(String),

    #[error("YouTube is rate limiting transcript requests")]
    TooManyRequests,

    #[error("Video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("No transcript available for video {0}")]
    NoTranscript(String),

    #[error("Transcript request failed with status {0}")]
    Http(u16),

    #[error("Failed to parse transcript data: {0}")]
    Parse(String),

    #[error("Failed to fetch transcript: {0}")]
    Transport(#[from] reqwest::Error),
}

impl TranscriptError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            TranscriptError::TooManyRequests | TranscriptError::Transport(_) => true,
            TranscriptError::Http(status) => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Errors raised while turning a study source into plain text
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Study text cannot be empty")]
    EmptyText,

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("No text found in PDF {0}")]
    EmptyPdf(String),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// Errors raised while reading or writing persisted settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while starting the HTTP server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Failed to set up transcript fetching: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Failed to set up the AI client: {0}")]
    Client(#[from] AiError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
