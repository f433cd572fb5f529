//! The `Binder` facade: one configuration and validator shared across bindings.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tagbind_map::{MapError, map_form_with_tag};
use tagbind_model::{Destination, Shape, Values};
use tagbind_validate::{DefaultValidator, StructValidator};
use tracing::debug;

use crate::binding::{BindContext, Binding, FORM, HEADER, JSON, QUERY, RequestParts, URI, for_content_type};
use crate::config::BindConfig;
use crate::driver;
use crate::error::BindError;

/// Runs bindings with one configuration and one shared validator.
#[derive(Clone)]
pub struct Binder {
    config: BindConfig,
    validator: Arc<dyn StructValidator>,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(BindConfig::default())
    }
}

impl Binder {
    /// A binder validating with [`DefaultValidator`] on the configured tag.
    pub fn new(config: BindConfig) -> Self {
        let validator = Arc::new(DefaultValidator::with_tag(config.validator_tag.clone()));
        Self { config, validator }
    }

    pub fn with_validator(config: BindConfig, validator: Arc<dyn StructValidator>) -> Self {
        Self { config, validator }
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    pub fn validator(&self) -> &dyn StructValidator {
        self.validator.as_ref()
    }

    fn context(&self) -> BindContext<'_> {
        BindContext {
            decode: &self.config.decode,
            validator: self.validator.as_ref(),
        }
    }

    /// Binds with an explicit binding.
    pub fn bind_with(
        &self,
        binding: &dyn Binding,
        request: &RequestParts,
        dest: &mut Destination,
    ) -> Result<(), BindError> {
        debug!(binding = binding.name(), "binding request");
        binding.bind(request, dest, self.context())
    }

    /// Binds with the binding picked from method and content type.
    pub fn bind(
        &self,
        method: &str,
        content_type: &str,
        request: &RequestParts,
        dest: &mut Destination,
    ) -> Result<(), BindError> {
        self.bind_with(for_content_type(method, content_type), request, dest)
    }

    pub fn bind_form(&self, request: &RequestParts, dest: &mut Destination) -> Result<(), BindError> {
        self.bind_with(&FORM, request, dest)
    }

    pub fn bind_query(&self, request: &RequestParts, dest: &mut Destination) -> Result<(), BindError> {
        self.bind_with(&QUERY, request, dest)
    }

    pub fn bind_header(&self, request: &RequestParts, dest: &mut Destination) -> Result<(), BindError> {
        self.bind_with(&HEADER, request, dest)
    }

    pub fn bind_uri(&self, request: &RequestParts, dest: &mut Destination) -> Result<(), BindError> {
        self.bind_with(&URI, request, dest)
    }

    pub fn bind_json(&self, request: &RequestParts, dest: &mut Destination) -> Result<(), BindError> {
        self.bind_with(&JSON, request, dest)
    }

    /// Maps form-like values under any tag family, without validation.
    pub fn map_form_with_tag(
        &self,
        dest: &mut Destination,
        form: &Values,
        tag: &str,
    ) -> Result<(), BindError> {
        debug!(tag, "mapping form");
        let (shape, value) = dest.parts_mut();
        map_form_with_tag(value, shape, form, tag, &self.config.decode)?;
        Ok(())
    }

    /// Runs the validation gate over an already populated destination.
    pub fn validate(&self, dest: &mut Destination) -> Result<(), BindError> {
        let (shape, value) = dest.parts_mut();
        driver::validate(value, shape, self.validator.as_ref())
    }

    /// Binds into a fresh destination of `shape` and converts the result.
    pub fn bind_as<T: DeserializeOwned>(
        &self,
        binding: &dyn Binding,
        request: &RequestParts,
        shape: Shape,
    ) -> Result<T, BindError> {
        let mut dest = Destination::new(shape);
        self.bind_with(binding, request, &mut dest)?;
        dest.deserialize().map_err(|e| BindError::Map(MapError::Json(e)))
    }
}
