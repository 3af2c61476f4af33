use std::path::Path;

use log::{debug, info};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, TEXT};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, TantivyDocument, Term};

use crate::error::{Error, Result};
use super::{LinkDocument, SearchHits, SearchIndexClient};

/// Tokenized article text, searched by phrase.
pub const FIELD_TEXT: &str = "text";
/// Stored `target<TAB>anchor...` encoding of the article's links.
pub const FIELD_LINKS: &str = "links";

#[derive(Clone, Copy, Debug)]
pub struct Fields {
    pub text: Field,
    pub links: Field,
}

/// Schema the index must carry (extra fields are ignored).
pub fn link_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_text_field(FIELD_TEXT, TEXT);
    schema_builder.add_text_field(FIELD_LINKS, STORED);
    schema_builder.build()
}

pub fn fields_from_schema(schema: &Schema) -> Result<Fields> {
    let text = schema
        .get_field(FIELD_TEXT)
        .map_err(|_| Error::search(format!("schema missing {}", FIELD_TEXT)))?;
    let links = schema
        .get_field(FIELD_LINKS)
        .map_err(|_| Error::search(format!("schema missing {}", FIELD_LINKS)))?;
    Ok(Fields { text, links })
}

/// Phrase search against a tantivy index with `text` and `links` fields.
pub struct TantivySearchClient {
    index: Index,
    reader: IndexReader,
    fields: Fields,
}

impl TantivySearchClient {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening search index at {:?}", path);
        let index = Index::open_in_dir(path)?;
        Self::new(index)
    }

    pub fn new(index: Index) -> Result<Self> {
        let fields = fields_from_schema(&index.schema())?;
        let reader = index.reader()?;
        debug!("Index has {} searchable documents", reader.searcher().num_docs());
        Ok(Self { index, reader, fields })
    }

    /// Runs each token through the text field's analyzer so query terms
    /// match what the indexer stored.
    fn analyze(&self, tokens: &[&str]) -> Result<Vec<Term>> {
        let mut analyzer = self.index.tokenizer_for_field(self.fields.text)?;
        let mut terms = Vec::with_capacity(tokens.len());
        for token in tokens {
            let mut stream = analyzer.token_stream(token);
            while stream.advance() {
                terms.push(Term::from_field_text(self.fields.text, &stream.token().text));
            }
        }
        Ok(terms)
    }
}

impl SearchIndexClient for TantivySearchClient {
    fn phrase_search(&self, tokens: &[&str], limit: usize) -> Result<SearchHits> {
        let mut terms = self.analyze(tokens)?;
        let query: Box<dyn Query> = match terms.len() {
            0 => return Ok(SearchHits::default()),
            1 => Box::new(TermQuery::new(terms.remove(0), IndexRecordOption::Basic)),
            _ => Box::new(PhraseQuery::new(terms)),
        };

        let searcher = self.reader.searcher();
        let (top_docs, total_hits) = searcher.search(&query, &(TopDocs::with_limit(limit), Count))?;
        let mut documents = Vec::with_capacity(top_docs.len());
        for (_score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let links = doc
                .get_first(self.fields.links)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            documents.push(LinkDocument { links });
        }
        Ok(SearchHits { total_hits, documents })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::{doc, IndexWriter};

    fn build_index(docs: &[(&str, &str)]) -> Index {
        let schema = link_schema();
        let fields = fields_from_schema(&schema).unwrap();
        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter = index.writer_with_num_threads(1, 15_000_000).unwrap();
        for (text, links) in docs {
            writer
                .add_document(doc!(fields.text => *text, fields.links => *links))
                .unwrap();
        }
        writer.commit().unwrap();
        index
    }

    #[test]
    fn phrase_search_returns_stored_links() {
        let index = build_index(&[
            ("The capital of France is Paris", "en:Capital of France\tcapital of France"),
            ("France has a capital", "en:France\tFrance"),
            ("Of France, the capital", "en:France\tFrance"),
        ]);
        let client = TantivySearchClient::new(index).unwrap();
        let hits = client.phrase_search(&["Capital", "of", "France"], 10).unwrap();
        assert_eq!(hits.total_hits, 1);
        assert_eq!(hits.documents.len(), 1);
        assert_eq!(hits.documents[0].links, "en:Capital of France\tcapital of France");
    }

    #[test]
    fn limit_caps_returned_documents_but_not_total() {
        let docs: Vec<(&str, &str)> = (0..5).map(|_| ("paris again", "en:Paris\tParis")).collect();
        let client = TantivySearchClient::new(build_index(&docs)).unwrap();
        let hits = client.phrase_search(&["paris"], 2).unwrap();
        assert_eq!(hits.total_hits, 5);
        assert_eq!(hits.documents.len(), 2);
    }

    #[test]
    fn empty_phrase_matches_nothing() {
        let client = TantivySearchClient::new(build_index(&[("text", "")])).unwrap();
        let hits = client.phrase_search(&[], 10).unwrap();
        assert_eq!(hits.total_hits, 0);
    }

    #[test]
    fn missing_fields_are_reported() {
        let mut builder = Schema::builder();
        builder.add_text_field("body", TEXT);
        let index = Index::create_in_ram(builder.build());
        assert!(TantivySearchClient::new(index).is_err());
    }
}
