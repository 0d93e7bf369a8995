//! Configuration lookup tables edited from the dashboard's config panels.

use serde::{Deserialize, Serialize};

use super::{double_option, is_hex_color};
use crate::errors::AppError;

/// The lookup tables exposed under `/api/config/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// Ticket topics
    Temas,
    TiposEvento,
    TiposNota,
    TiposRecurso,
    /// Color palette
    Colores,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 5] = [
        CatalogKind::Temas,
        CatalogKind::TiposEvento,
        CatalogKind::TiposNota,
        CatalogKind::TiposRecurso,
        CatalogKind::Colores,
    ];

    /// URL path segment.
    pub fn slug(&self) -> &'static str {
        match self {
            CatalogKind::Temas => "temas",
            CatalogKind::TiposEvento => "tipos-evento",
            CatalogKind::TiposNota => "tipos-nota",
            CatalogKind::TiposRecurso => "tipos-recurso",
            CatalogKind::Colores => "colores",
        }
    }

    pub fn parse(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Backing table. Only ever one of these constants is interpolated into SQL.
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Temas => "temas",
            CatalogKind::TiposEvento => "tipos_evento",
            CatalogKind::TiposNota => "tipos_nota",
            CatalogKind::TiposRecurso => "tipos_recurso",
            CatalogKind::Colores => "colores",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Temas => "Tema",
            CatalogKind::TiposEvento => "Tipo de evento",
            CatalogKind::TiposNota => "Tipo de nota",
            CatalogKind::TiposRecurso => "Tipo de recurso",
            CatalogKind::Colores => "Color",
        }
    }

    pub fn requires_color(&self) -> bool {
        matches!(self, CatalogKind::Colores)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: String,
}

impl CatalogEntry {
    pub fn validate(&self, kind: CatalogKind) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(format!("{} name is required", kind.label())));
        }
        match &self.color {
            Some(color) if !is_hex_color(color) => Err(AppError::Validation(format!(
                "Color must be in #RRGGBB format, got {}",
                color
            ))),
            None if kind.requires_color() => {
                Err(AppError::Validation("Color value is required".to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCatalogEntryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCatalogEntryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
}
