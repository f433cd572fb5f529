//! One binding per transport.
//!
//! A binding reads its source out of an already parsed [`RequestParts`],
//! runs the mapping engine over the destination and then the validation
//! gate.

use tagbind_map::{
    DecodeOptions, canonical_header_key, decode_json, map_form, map_header, map_multipart, map_uri,
};
use tagbind_model::{Destination, MultipartForm, Values};
use tagbind_validate::StructValidator;
use tracing::debug;

use crate::driver::{bind_value, validate};
use crate::error::BindError;

pub const MIME_JSON: &str = "application/json";
pub const MIME_POST_FORM: &str = "application/x-www-form-urlencoded";
pub const MIME_MULTIPART_POST_FORM: &str = "multipart/form-data";

/// The parsed parts of a request that bindings read from.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub query: Values,
    pub post_form: Values,
    /// Header values under canonical keys; see [`RequestParts::header`].
    pub headers: Values,
    /// Captures of the matched route.
    pub params: Values,
    pub multipart: Option<MultipartForm>,
    pub body: Option<Vec<u8>>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_query(mut self, query: Values) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_post_form(mut self, post_form: Values) -> Self {
        self.post_form = post_form;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Values) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_multipart(mut self, multipart: MultipartForm) -> Self {
        self.multipart = Some(multipart);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a header value under the canonical form of `key`.
    #[must_use]
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.add(canonical_header_key(key), value);
        self
    }

    /// Post form values followed by query values, then multipart values.
    pub fn form(&self) -> Values {
        let mut form = self.post_form.clone();
        form.extend_from(&self.query);
        if let Some(multipart) = &self.multipart {
            form.extend_from(&multipart.values);
        }
        form
    }
}

/// What a binding needs besides the request and destination.
#[derive(Clone, Copy)]
pub struct BindContext<'a> {
    pub decode: &'a DecodeOptions,
    pub validator: &'a dyn StructValidator,
}

/// Fills a destination from one part of a request.
pub trait Binding: Send + Sync {
    fn name(&self) -> &'static str;

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError>;
}

/// Query and form values, tag `form`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBinding;

impl Binding for FormBinding {
    fn name(&self) -> &'static str {
        "form"
    }

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        let form = request.form();
        let (shape, value) = dest.parts_mut();
        bind_value(
            value,
            shape,
            &|value, shape| map_form(value, shape, &form, ctx.decode),
            ctx.validator,
        )
    }
}

/// Url-encoded post form only, tag `form`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormPostBinding;

impl Binding for FormPostBinding {
    fn name(&self) -> &'static str {
        "form-urlencoded"
    }

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        let (shape, value) = dest.parts_mut();
        bind_value(
            value,
            shape,
            &|value, shape| map_form(value, shape, &request.post_form, ctx.decode),
            ctx.validator,
        )
    }
}

/// Multipart form values and files, tag `form`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormMultipartBinding;

impl Binding for FormMultipartBinding {
    fn name(&self) -> &'static str {
        "multipart/form-data"
    }

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        let multipart = request.multipart.as_ref().ok_or(BindError::InvalidRequest)?;
        let (shape, value) = dest.parts_mut();
        bind_value(
            value,
            shape,
            &|value, shape| map_multipart(value, shape, multipart, ctx.decode),
            ctx.validator,
        )
    }
}

/// Query string only, tag `form`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBinding;

impl Binding for QueryBinding {
    fn name(&self) -> &'static str {
        "query"
    }

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        let (shape, value) = dest.parts_mut();
        bind_value(
            value,
            shape,
            &|value, shape| map_form(value, shape, &request.query, ctx.decode),
            ctx.validator,
        )
    }
}

/// Request headers, tag `header`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderBinding;

impl Binding for HeaderBinding {
    fn name(&self) -> &'static str {
        "header"
    }

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        let (shape, value) = dest.parts_mut();
        bind_value(
            value,
            shape,
            &|value, shape| map_header(value, shape, &request.headers, ctx.decode),
            ctx.validator,
        )
    }
}

/// Route captures, tag `uri`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UriBinding;

impl Binding for UriBinding {
    fn name(&self) -> &'static str {
        "uri"
    }

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        let (shape, value) = dest.parts_mut();
        bind_value(
            value,
            shape,
            &|value, shape| map_uri(value, shape, &request.params, ctx.decode),
            ctx.validator,
        )
    }
}

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBinding;

impl JsonBinding {
    /// Decodes `body` into `dest` and validates the result.
    pub fn bind_body(
        &self,
        body: &[u8],
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        let (shape, value) = dest.parts_mut();
        decode_json(body, value, shape, ctx.decode)?;
        validate(value, shape, ctx.validator)
    }
}

impl Binding for JsonBinding {
    fn name(&self) -> &'static str {
        "json"
    }

    fn bind(
        &self,
        request: &RequestParts,
        dest: &mut Destination,
        ctx: BindContext<'_>,
    ) -> Result<(), BindError> {
        match request.body.as_deref() {
            Some(body) if !body.is_empty() => self.bind_body(body, dest, ctx),
            _ => Err(BindError::InvalidRequest),
        }
    }
}

pub static FORM: FormBinding = FormBinding;
pub static FORM_POST: FormPostBinding = FormPostBinding;
pub static FORM_MULTIPART: FormMultipartBinding = FormMultipartBinding;
pub static QUERY: QueryBinding = QueryBinding;
pub static HEADER: HeaderBinding = HeaderBinding;
pub static URI: UriBinding = UriBinding;
pub static JSON: JsonBinding = JsonBinding;

/// Picks a body binding from the request method and content type.
///
/// `GET` always binds the form; unknown content types fall back to it.
pub fn for_content_type(method: &str, content_type: &str) -> &'static dyn Binding {
    if method.eq_ignore_ascii_case("GET") {
        return &FORM;
    }
    let mime = content_type
        .split([';', ' '])
        .next()
        .unwrap_or_default()
        .trim();
    match mime {
        MIME_JSON => &JSON,
        MIME_MULTIPART_POST_FORM => &FORM_MULTIPART,
        MIME_POST_FORM => &FORM_POST,
        _ => &FORM,
    }
}

/// Looks a binding up by its name.
pub fn by_name(name: &str) -> Option<&'static dyn Binding> {
    let binding: &'static dyn Binding = match name {
        "form" => &FORM,
        "form-urlencoded" => &FORM_POST,
        "multipart/form-data" | "multipart" => &FORM_MULTIPART,
        "query" => &QUERY,
        "header" => &HEADER,
        "uri" => &URI,
        "json" => &JSON,
        _ => return None,
    };
    debug!(binding = binding.name(), "resolved binding");
    Some(binding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_selects_binding() {
        assert_eq!(for_content_type("GET", MIME_JSON).name(), "form");
        assert_eq!(for_content_type("POST", "application/json; charset=utf-8").name(), "json");
        assert_eq!(
            for_content_type("POST", "multipart/form-data; boundary=x").name(),
            "multipart/form-data"
        );
        assert_eq!(for_content_type("PUT", MIME_POST_FORM).name(), "form-urlencoded");
        assert_eq!(for_content_type("POST", "text/plain").name(), "form");
    }

    #[test]
    fn form_merges_post_form_before_query() {
        let request = RequestParts::new()
            .with_query([("q", "query")].into_iter().collect())
            .with_post_form([("q", "post")].into_iter().collect());
        let form = request.form();
        assert_eq!(form.get_all("q"), Some(&["post".to_string(), "query".to_string()][..]));
    }

    #[test]
    fn headers_are_stored_canonically() {
        let request = RequestParts::new().header("x-request-id", "1");
        assert_eq!(request.headers.get("X-Request-Id"), Some("1"));
    }
}
