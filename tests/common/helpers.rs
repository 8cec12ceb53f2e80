use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use curlish::transport::codes;
use curlish::{
    Client, ClientConfig, Diagnostics, OptionKey, Session, Transport, TransportFailure,
    TransportOption,
};

// Common test constants
pub const TEST_URL: &str = "http://example.com/resource";
pub const TEST_USER_AGENT: &str = "curlish-test-agent";
pub const OK_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Installs a test subscriber honouring `RUST_LOG`; repeated calls are fine.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// === Scripted Transport ===

/// What the scripted session answers to one `execute`.
#[derive(Debug, Clone)]
pub enum Reply {
    Raw { bytes: Vec<u8>, redirects: u32 },
    Fail(TransportFailure),
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Reply>,
    opened: Vec<Option<String>>,
    closed: usize,
    calls: Vec<Vec<TransportOption>>,
}

/// In-memory transport returning canned replies and recording every option
/// it receives.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw reply with no redirects.
    pub fn reply(&self, raw: &str) -> &Self {
        self.reply_with_redirects(raw, 0)
    }

    pub fn reply_with_redirects(&self, raw: &str, redirects: u32) -> &Self {
        self.push(Reply::Raw {
            bytes: raw.as_bytes().to_vec(),
            redirects,
        })
    }

    pub fn fail(&self, code: u32, message: &str) -> &Self {
        self.push(Reply::Fail(TransportFailure::new(code, message)))
    }

    fn push(&self, reply: Reply) -> &Self {
        self.script.lock().unwrap().replies.push_back(reply);
        self
    }

    /// Number of sessions opened so far.
    pub fn opened(&self) -> usize {
        self.script.lock().unwrap().opened.len()
    }

    /// The URL each session was opened with.
    pub fn opened_urls(&self) -> Vec<Option<String>> {
        self.script.lock().unwrap().opened.clone()
    }

    /// Number of sessions dropped so far.
    pub fn closed(&self) -> usize {
        self.script.lock().unwrap().closed
    }

    /// Options applied before each executed call, in order.
    pub fn calls(&self) -> Vec<Vec<TransportOption>> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn last_call(&self) -> Vec<TransportOption> {
        self.calls().pop().expect("no call was executed")
    }
}

impl Transport for ScriptedTransport {
    type Session = ScriptedSession;

    fn open(&self, url: Option<&str>) -> curlish::Result<ScriptedSession> {
        self.script.lock().unwrap().opened.push(url.map(str::to_string));
        Ok(ScriptedSession {
            script: Arc::clone(&self.script),
            applied: Vec::new(),
            diagnostics: Diagnostics::default(),
        })
    }
}

pub struct ScriptedSession {
    script: Arc<Mutex<Script>>,
    applied: Vec<TransportOption>,
    diagnostics: Diagnostics,
}

impl Session for ScriptedSession {
    fn set_option(&mut self, option: &TransportOption) -> curlish::Result<()> {
        self.applied.push(option.clone());
        Ok(())
    }

    fn execute(&mut self) -> Result<Vec<u8>, TransportFailure> {
        let applied = std::mem::take(&mut self.applied);
        let trace = request_trace(&applied);
        let url = match find_option(&applied, OptionKey::Url) {
            Some(TransportOption::Url(url)) => url,
            _ => String::new(),
        };

        let mut script = self.script.lock().unwrap();
        script.calls.push(applied);
        let reply = script.replies.pop_front().unwrap_or_else(|| {
            Reply::Fail(TransportFailure::new(
                codes::COULDNT_CONNECT,
                "no scripted reply left",
            ))
        });

        match reply {
            Reply::Raw { bytes, redirects } => {
                self.diagnostics = Diagnostics {
                    effective_url: url,
                    redirect_count: redirects,
                    http_code: status_code(&bytes),
                    total_time: Default::default(),
                    request_header: trace,
                };
                Ok(bytes)
            }
            Reply::Fail(failure) => Err(failure),
        }
    }

    fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.clone()
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        if let Ok(mut script) = self.script.lock() {
            script.closed += 1;
        }
    }
}

/// A request trace the way a transport would report it.
fn request_trace(options: &[TransportOption]) -> String {
    let method = options
        .iter()
        .rev()
        .find_map(|option| match option {
            TransportOption::NoBody(true) => Some("HEAD".to_string()),
            TransportOption::HttpGet(true) => Some("GET".to_string()),
            TransportOption::Post(true) => Some("POST".to_string()),
            TransportOption::CustomRequest(method) => Some(method.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "GET".to_string());

    let mut trace = format!("{method} / HTTP/1.1\r\n");
    if let Some(TransportOption::HttpHeader(lines)) = find_option(options, OptionKey::HttpHeader) {
        for line in lines {
            trace.push_str(&line);
            trace.push_str("\r\n");
        }
    }
    trace.push_str("\r\n");
    trace
}

/// Status code of the last status line in a canned reply.
fn status_code(bytes: &[u8]) -> u16 {
    String::from_utf8_lossy(bytes)
        .split("\r\n")
        .filter(|line| line.starts_with("HTTP/"))
        .last()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

/// The last option with `key` in `options`.
pub fn find_option(options: &[TransportOption], key: OptionKey) -> Option<TransportOption> {
    options.iter().rev().find(|option| option.key() == key).cloned()
}

// === Client Helpers ===

/// Creates a client over a fresh scripted transport.
pub fn create_scripted_client() -> (Client<ScriptedTransport>, ScriptedTransport) {
    create_scripted_client_with(ClientConfig::default())
}

pub fn create_scripted_client_with(config: ClientConfig) -> (Client<ScriptedTransport>, ScriptedTransport) {
    let transport = ScriptedTransport::new();
    let client = Client::with_transport(config, transport.clone());
    (client, transport)
}

/// The URL the last call was sent to.
pub fn last_url(transport: &ScriptedTransport) -> String {
    match find_option(&transport.last_call(), OptionKey::Url) {
        Some(TransportOption::Url(url)) => url,
        other => panic!("expected a URL option, got {other:?}"),
    }
}
