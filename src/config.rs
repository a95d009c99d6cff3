//! Service configuration from environment variables
//!
//! ```bash
//! API_KEY=change-me                 # required for any guarded endpoint
//! PORT=10000
//! DATA_DIR=/tmp/saved_files
//! RECORD_FIELDS=voucher,box,site    # first field is the identifier
//! IDENTIFIER_ALIASES=receipt_code
//! FILE_PREFIX=delivery_requests
//! PERSIST_UPLOADS=false
//! RUST_LOG=receipt_server=info,receipt_drop=info,tower_http=info
//! ```

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::store::StoreLayout;
use crate::types::FieldSet;

const DEFAULT_PORT: u16 = 10000;

/// Log directives used when `RUST_LOG` is unset. The binary logs under
/// `receipt_server`, the library under `receipt_drop`.
pub const DEFAULT_LOG_FILTER: &str = "receipt_server=info,receipt_drop=info,tower_http=info";

/// Log filter from a `RUST_LOG` value, falling back to [`DEFAULT_LOG_FILTER`]
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(DEFAULT_LOG_FILTER),
    }
}

/// Runtime configuration
#[derive(Clone)]
pub struct ServiceConfig {
    /// Shared secret expected in `X-API-Key`. Empty rejects every request.
    pub api_key: String,
    pub bind_addr: SocketAddr,
    pub layout: StoreLayout,
    pub fields: FieldSet,
    /// Request keys accepted in place of the identifier field
    pub identifier_aliases: Vec<String>,
    /// Keep files attached to `/api/receipts/upload`
    pub persist_uploads: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            layout: StoreLayout::default(),
            fields: FieldSet::default(),
            identifier_aliases: vec!["receipt_code".to_string()],
            persist_uploads: false,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read configuration through `var`. Unparseable values keep their
    /// defaults and are logged.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = var("API_KEY") {
            config.api_key = key;
        }

        if let Some(port) = var("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.bind_addr.set_port(port),
                Err(_) => warn!(value = %port, "Invalid PORT, using {}", DEFAULT_PORT),
            }
        }

        if let Some(dir) = var("DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.layout.data_dir = PathBuf::from(dir);
        }

        if let Some(prefix) = var("FILE_PREFIX").filter(|p| !p.trim().is_empty()) {
            config.layout = config.layout.with_prefix(prefix.trim());
        }

        if let Some(list) = var("RECORD_FIELDS") {
            match FieldSet::parse(&list) {
                Some(fields) => config.fields = fields,
                None => warn!(value = %list, "Invalid RECORD_FIELDS, using defaults"),
            }
        }

        if let Some(list) = var("IDENTIFIER_ALIASES") {
            config.identifier_aliases = list
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(flag) = var("PERSIST_UPLOADS") {
            match parse_flag(&flag) {
                Some(value) => config.persist_uploads = value,
                None => warn!(value = %flag, "Invalid PERSIST_UPLOADS, keeping it off"),
            }
        }

        config
    }
}

// The API key stays out of logs
impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };

        f.debug_struct("ServiceConfig")
            .field("api_key", &api_key)
            .field("bind_addr", &self.bind_addr)
            .field("layout", &self.layout)
            .field("fields", &self.fields.names())
            .field("identifier_aliases", &self.identifier_aliases)
            .field("persist_uploads", &self.persist_uploads)
            .finish()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
