// src/handlers/upload.rs
//
// Leitura de formulários multipart (imagens para o serviço facial).

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{common::error::AppError, services::face_client::ImageUpload};

/// Campos de texto + arquivos de um formulário multipart.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<(String, ImageUpload)>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                    form.files.push((
                        name,
                        ImageUpload { file_name, content_type, bytes: bytes.to_vec() },
                    ));
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid form field: {}", e)))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// Arquivos não vazios enviados sob `name`.
    pub fn take_files(&mut self, name: &str) -> Vec<ImageUpload> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        matching
            .into_iter()
            .map(|(_, file)| file)
            .filter(|file| !file.bytes.is_empty())
            .collect()
    }
}
