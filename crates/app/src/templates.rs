use handlebars::{Handlebars, RenderError};
use serde::Serialize;

const UPLOAD_TEMPLATE: &str = "upload";

/// Values shown on the upload page. Missing fields are simply not rendered.
#[derive(Debug, Default, Serialize)]
pub struct UploadView {
    pub status: Option<String>,
    pub filename: Option<String>,
    pub doc_len: Option<usize>,
    pub chunks: Option<usize>,
}

impl UploadView {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }
}

pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_template_string(UPLOAD_TEMPLATE, include_str!("../templates/upload.html"))?;
        Ok(Self { registry })
    }

    pub fn render_upload(&self, view: &UploadView) -> Result<String, RenderError> {
        self.registry.render(UPLOAD_TEMPLATE, view)
    }
}
