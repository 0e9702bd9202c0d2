use std::cell::RefCell;
use std::collections::HashMap;

use pretty_assertions::assert_eq;
use ragloop::{
    EmbeddingGateway, EmbeddingInput, IndexedEmbedding, IngestParams, MemoryStore, RagError,
    SearchMode, SearchParams, TextProcessor, VectorStore,
};

/// Embeds every text as `[chars, first byte]` unless pinned, and answers with
/// the entries rotated so array order never matches submission order.
#[derive(Default)]
struct RotatingGateway {
    pinned: HashMap<String, Vec<f32>>,
    batches: RefCell<Vec<Vec<String>>>,
}

impl RotatingGateway {
    fn pin(mut self, text: &str, vector: &[f32]) -> Self {
        self.pinned.insert(text.to_string(), vector.to_vec());
        self
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        self.pinned.get(text).cloned().unwrap_or_else(|| {
            vec![
                text.chars().count() as f32,
                f32::from(text.bytes().next().unwrap_or(0)),
            ]
        })
    }
}

impl EmbeddingGateway for RotatingGateway {
    fn get_embeddings(
        &self,
        _dimensions: usize,
        inputs: EmbeddingInput<'_>,
    ) -> ragloop::Result<IndexedEmbedding> {
        let texts: Vec<&str> = match inputs {
            EmbeddingInput::Single(text) => vec![text],
            EmbeddingInput::Batch(texts) => texts.to_vec(),
        };
        self.batches
            .borrow_mut()
            .push(texts.iter().map(|t| t.to_string()).collect());
        let mut entries: Vec<(usize, Vec<f32>)> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| (index, self.vector_for(text)))
            .collect();
        let mid = entries.len() / 2;
        entries.rotate_left(mid);
        IndexedEmbedding::from_entries(entries)
    }
}

fn ingest_params(chunk_size: usize, overlap: usize, batch_size: Option<usize>) -> IngestParams {
    IngestParams {
        chunk_size,
        overlap,
        dimensions: 2,
        batch_size,
    }
}

fn search_params(search_mode: SearchMode, top_k: usize, score_threshold: f64) -> SearchParams {
    SearchParams {
        search_mode,
        top_k,
        score_threshold,
        dimensions: 2,
    }
}

fn manual() -> String {
    (0..900)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}

#[test]
fn manual_chunks_land_in_store_in_order() {
    let doc = manual();
    let gateway = RotatingGateway::default();
    let mut processor = TextProcessor::new(&gateway, MemoryStore::new(2).unwrap());

    let report = processor
        .ingest(&doc, &ingest_params(400, 40, None))
        .unwrap();
    assert_eq!(report.chunks, 3);
    assert_eq!(report.requests, 1);

    let texts: Vec<&str> = processor
        .store()
        .documents()
        .iter()
        .map(|d| d.text.as_str())
        .collect();
    assert_eq!(texts, vec![&doc[0..400], &doc[360..760], &doc[720..900]]);
}

#[test]
fn batch_identity_survives_shuffled_responses() {
    let doc: String = (0..60)
        .map(|i| char::from(b'A' + (i % 26) as u8))
        .collect();
    let gateway = RotatingGateway::default();
    let mut processor = TextProcessor::new(&gateway, MemoryStore::new(2).unwrap());

    let report = processor
        .ingest(&doc, &ingest_params(7, 2, Some(4)))
        .unwrap();
    assert!(report.requests > 1);
    assert_eq!(report.stored, report.chunks);
    for stored in processor.store().documents() {
        assert_eq!(stored.embedding, gateway.vector_for(&stored.text));
    }
    let submitted: Vec<String> = gateway.batches.borrow().concat();
    let stored: Vec<String> = processor
        .store()
        .documents()
        .iter()
        .map(|d| d.text.clone())
        .collect();
    assert_eq!(submitted, stored);
}

#[test]
fn only_chunks_within_distance_threshold_reach_the_context() {
    let gateway = RotatingGateway::default().pin("defrost", &[0.0, 0.0]);
    let mut store = MemoryStore::new(2).unwrap();
    store.insert("close chunk", &[0.3, 0.0]).unwrap();
    store.insert("distant chunk", &[0.0, 0.6]).unwrap();
    let processor = TextProcessor::new(&gateway, store);

    let context = processor
        .search("defrost", &search_params(SearchMode::Euclidean, 5, 0.5))
        .unwrap();
    assert_eq!(context.texts().collect::<Vec<_>>(), vec!["close chunk"]);
}

#[test]
fn similarity_metrics_keep_scores_above_threshold() {
    let gateway = RotatingGateway::default().pin("q", &[1.0, 0.0]);
    let mut store = MemoryStore::new(2).unwrap();
    store.insert("aligned", &[2.0, 0.0]).unwrap();
    store.insert("diagonal", &[1.0, 1.0]).unwrap();
    store.insert("orthogonal", &[0.0, 3.0]).unwrap();
    let processor = TextProcessor::new(&gateway, store);

    let cosine = processor
        .search("q", &search_params(SearchMode::Cosine, 5, 0.5))
        .unwrap();
    assert_eq!(cosine.texts().collect::<Vec<_>>(), vec!["aligned", "diagonal"]);
    for result in cosine.results() {
        assert!(result.score >= 0.5);
    }

    let inner = processor
        .search("q", &search_params(SearchMode::InnerProduct, 5, 1.5))
        .unwrap();
    assert_eq!(inner.texts().collect::<Vec<_>>(), vec!["aligned"]);
}

#[test]
fn retrieval_never_exceeds_top_k() {
    let doc = manual();
    let gateway = RotatingGateway::default().pin("q", &[10.0, 100.0]);
    let mut processor = TextProcessor::new(&gateway, MemoryStore::new(2).unwrap());
    processor
        .ingest(&doc, &ingest_params(20, 5, Some(8)))
        .unwrap();

    let context = processor
        .search("q", &search_params(SearchMode::Euclidean, 3, 1_000.0))
        .unwrap();
    assert_eq!(context.len(), 3);
    for result in context.results() {
        assert!(SearchMode::Euclidean.passes(result.score, 1_000.0));
    }
}

#[test]
fn empty_store_gives_empty_context() {
    let gateway = RotatingGateway::default();
    let processor = TextProcessor::new(&gateway, MemoryStore::new(2).unwrap());
    let context = processor
        .search("anything", &search_params(SearchMode::Euclidean, 5, 0.5))
        .unwrap();
    assert!(context.is_empty());
}

#[test]
fn reingesting_into_reset_store_is_identical() {
    let doc = manual();
    let gateway = RotatingGateway::default();
    let mut processor = TextProcessor::new(&gateway, MemoryStore::new(2).unwrap());
    let params = ingest_params(128, 16, Some(3));

    processor.ingest(&doc, &params).unwrap();
    let first = processor.store().documents().to_vec();
    processor.store_mut().reset(2).unwrap();
    processor.ingest(&doc, &params).unwrap();
    assert_eq!(processor.store().documents(), first.as_slice());
}

#[test]
fn store_width_is_checked_before_embedding() {
    let gateway = RotatingGateway::default();
    let mut processor = TextProcessor::new(&gateway, MemoryStore::new(3).unwrap());
    let err = processor
        .ingest(&manual(), &ingest_params(400, 40, None))
        .unwrap_err();
    assert!(matches!(
        err,
        RagError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    ));
    assert!(gateway.batches.borrow().is_empty());
}
