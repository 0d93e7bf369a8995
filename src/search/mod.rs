//! Tantivy-based search index module.
//!
//! Provides full-text search over knowledge-base resources with field boosting.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{CatalogEntry, CatalogKind, Resource, ResourceFilter};

/// Field boost values.
const BOOST_TITLE: f32 = 10.0;
const BOOST_TAGS: f32 = 6.0;
const BOOST_DESCRIPTION: f32 = 4.0;
const BOOST_TYPE_NAME: f32 = 2.0;

/// Search hit with relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub resource_id: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    resource_id: Field,
    title: Field,
    description: Field,
    tags: Field,
    type_name: Field,
}

/// Tantivy search index for resources.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        // Define schema
        let mut schema_builder = Schema::builder();
        let resource_id = schema_builder.add_text_field("resource_id", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let description = schema_builder.add_text_field("description", TEXT);
        let tags = schema_builder.add_text_field("tags", TEXT);
        let type_name = schema_builder.add_text_field("type_name", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            resource_id,
            title,
            description,
            tags,
            type_name,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from resources.
    pub async fn rebuild(
        &self,
        resources: &[Resource],
        types: &[CatalogEntry],
    ) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        // Clear existing index
        writer.delete_all_documents()?;

        for resource in resources {
            writer.add_document(self.create_document(resource, types))?;
        }

        writer.commit()?;

        // Reload reader to see new documents
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} resources", resources.len());
        Ok(())
    }

    /// Rebuild from the current database contents. Returns the number of indexed resources.
    pub async fn rebuild_from(&self, repo: &Repository) -> Result<usize, AppError> {
        let resources = repo.list_resources(&ResourceFilter::default()).await?;
        let types = repo.list_catalog(CatalogKind::TiposRecurso).await?;
        self.rebuild(&resources, &types).await?;
        Ok(resources.len())
    }

    /// Index (or re-index) a single resource.
    pub async fn index_resource(
        &self,
        resource: &Resource,
        types: &[CatalogEntry],
    ) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        // Delete existing document if any
        let term = tantivy::Term::from_field_text(self.fields.resource_id, &resource.id);
        writer.delete_term(term);

        writer.add_document(self.create_document(resource, types))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a resource from the index.
    pub async fn remove_resource(&self, resource_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.resource_id, resource_id);
        writer.delete_term(term);
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for resources matching every term of the query.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        self.run_query(query_str, limit, offset, true)
    }

    /// Best matches for free text where any term may match, e.g. a chat message.
    pub fn search_any(&self, text: &str, limit: usize) -> Result<Vec<SearchResult>, AppError> {
        self.run_query(text, limit, 0, false)
    }

    fn run_query(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
        conjunction: bool,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let boosted_fields = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.tags, BOOST_TAGS),
            (self.fields.description, BOOST_DESCRIPTION),
            (self.fields.type_name, BOOST_TYPE_NAME),
        ];

        // A single parser over every field, so each term may match in any of them
        let mut parser = QueryParser::for_index(
            &self.index,
            boosted_fields.iter().map(|(field, _)| *field).collect(),
        );
        for (field, boost) in boosted_fields {
            parser.set_field_boost(field, boost);
        }
        if conjunction {
            parser.set_conjunction_by_default();
        }
        let (query, _errors) = parser.parse_query_lenient(query_str);

        // Execute search with pagination
        let top_docs = searcher
            .search(&*query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results: Vec<SearchResult> = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let resource_id = doc.get_first(self.fields.resource_id)?.as_str()?.to_string();
                Some(SearchResult { resource_id, score })
            })
            .collect();

        Ok(results)
    }

    /// Create a Tantivy document from a resource.
    fn create_document(&self, resource: &Resource, types: &[CatalogEntry]) -> TantivyDocument {
        let type_name = resource
            .tipo_recurso_id
            .as_deref()
            .and_then(|id| types.iter().find(|t| t.id == id))
            .map(|t| t.name.clone())
            .unwrap_or_default();

        doc!(
            self.fields.resource_id => resource.id.clone(),
            self.fields.title => resource.title.clone(),
            self.fields.description => resource.description.clone().unwrap_or_default(),
            self.fields.tags => resource.tags.join(" "),
            self.fields.type_name => type_name
        )
    }
}
