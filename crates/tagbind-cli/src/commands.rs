//! Command implementations shared by the binary and its tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tagbind_core::{BindConfig, Binder, RequestParts, by_name};
use tagbind_map::canonical_header_key;
use tagbind_model::{Destination, Shape, Values};
use tracing::{info, warn};

/// Inputs of one `bind` run.
#[derive(Debug, Clone)]
pub struct BindOptions {
    pub shape: PathBuf,
    /// Binding name as accepted by [`by_name`].
    pub binding: String,
    /// `KEY=VALUE` pairs.
    pub fields: Vec<String>,
    pub body: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Splits a `KEY=VALUE` argument at the first `=`.
pub fn parse_field(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("field `{raw}` is not KEY=VALUE");
    };
    if key.is_empty() {
        bail!("field `{raw}` has an empty key");
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn load_shape(path: &Path) -> Result<Shape> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read shape file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse shape file {}", path.display()))
}

/// Reads the TOML configuration, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<BindConfig> {
    let Some(path) = path else {
        return Ok(BindConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parse config file {}", path.display()))
}

/// Reads a body file, refusing files larger than `max_memory` bytes.
pub fn read_body(path: &Path, max_memory: u64) -> Result<Vec<u8>> {
    let len = fs::metadata(path)
        .with_context(|| format!("stat body file {}", path.display()))?
        .len();
    if len > max_memory {
        bail!(
            "body file {} is {len} bytes, over the {max_memory} byte limit",
            path.display()
        );
    }
    fs::read(path).with_context(|| format!("read body file {}", path.display()))
}

/// Places the field pairs where `binding` reads them from.
pub fn build_request(binding: &str, fields: &[(String, String)], body: Option<Vec<u8>>) -> RequestParts {
    let values: Values = fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let mut request = match binding {
        "header" => fields
            .iter()
            .fold(RequestParts::new(), |request, (key, value)| request.header(key, value.as_str())),
        "uri" => RequestParts::new().with_params(values),
        _ => RequestParts::new().with_query(values),
    };
    request.body = body;
    request
}

/// Runs one binding and returns the destination as JSON.
pub fn run_bind(options: &BindOptions) -> Result<serde_json::Value> {
    let config = load_config(options.config.as_deref())?;
    let shape = load_shape(&options.shape)?;
    let Some(binding) = by_name(&options.binding) else {
        bail!("unknown binding `{}`", options.binding);
    };

    let fields = options
        .fields
        .iter()
        .map(String::as_str)
        .map(parse_field)
        .collect::<Result<Vec<_>>>()?;
    if binding.name() == "json" && !fields.is_empty() {
        warn!(count = fields.len(), "fields are ignored by the json binding");
    }
    let body = options
        .body
        .as_deref()
        .map(|path| read_body(path, config.max_memory))
        .transpose()?;

    let request = build_request(binding.name(), &fields, body);
    let mut dest = Destination::new(shape);
    Binder::new(config)
        .bind_with(binding, &request, &mut dest)
        .with_context(|| format!("{} binding failed", binding.name()))?;
    info!(binding = binding.name(), fields = fields.len(), "bound destination");
    Ok(dest.to_json())
}

pub fn run_canonical(key: &str) -> String {
    canonical_header_key(key).into_owned()
}
