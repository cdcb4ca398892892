use index_store::{
    artifacts, similarity_from_distance, ArtifactPaths, Bm25Index, IndexError, Manifest,
    TfidfVectorizer, VectorIndex,
};

fn corpus() -> Vec<String> {
    vec![
        "mars has two moons phobos deimos".to_string(),
        "the moon orbits earth every month".to_string(),
        "basalt plains cover much martian crust".to_string(),
    ]
}

#[test]
fn both_indexes_agree_on_chunk_positions() {
    let chunks = corpus();
    let bm25 = Bm25Index::build(&chunks);
    let tfidf = TfidfVectorizer::fit(&chunks);
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| tfidf.transform(c)).collect();
    let index = VectorIndex::build(vectors).unwrap();

    let lex = bm25.query("phobos deimos", 1);
    assert_eq!(lex[0].0, 0);

    let hits = index.search(&tfidf.transform("phobos deimos"), 1).unwrap();
    assert_eq!(hits[0].0, 0);
}

#[test]
fn full_artifact_set_round_trips() {
    let tmp = tempfile::TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path().join("index"));
    paths.create_dir().unwrap();

    let chunks = corpus();
    let bm25 = Bm25Index::build(&chunks);
    let tfidf = TfidfVectorizer::fit(&chunks);
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| tfidf.transform(c)).collect();
    let index = VectorIndex::build(vectors).unwrap();

    artifacts::save_json(&paths.corpus(), &chunks).unwrap();
    artifacts::save_json(&paths.lexical(), &bm25).unwrap();
    artifacts::save_json(&paths.vectorizer(), &tfidf).unwrap();
    index.save(paths.vectors()).unwrap();
    let manifest = Manifest::new(
        chunks.len(),
        tfidf.dimension(),
        artifacts::corpus_fingerprint(&chunks),
    );
    artifacts::save_json(&paths.manifest(), &manifest).unwrap();

    let chunks2: Vec<String> = artifacts::load_json(&paths.corpus()).unwrap();
    let bm25_2: Bm25Index = artifacts::load_json(&paths.lexical()).unwrap();
    let tfidf2: TfidfVectorizer = artifacts::load_json(&paths.vectorizer()).unwrap();
    let index2 = VectorIndex::load(paths.vectors()).unwrap();
    let manifest2: Manifest = artifacts::load_json(&paths.manifest()).unwrap();

    assert_eq!(chunks2, chunks);
    assert_eq!(bm25_2.len(), chunks.len());
    assert_eq!(tfidf2.dimension(), tfidf.dimension());
    assert_eq!(index2.len(), chunks.len());
    assert_eq!(index2.dimension(), tfidf.dimension());
    assert_eq!(manifest2, manifest);
    assert_eq!(manifest2.corpus_fingerprint, artifacts::corpus_fingerprint(&chunks2));

    // Positional alignment survives the reload.
    let hits = index2.search(&tfidf2.transform("basalt martian crust"), 1).unwrap();
    assert_eq!(hits[0].0, 2);
}

#[test]
fn stale_vectorizer_is_detected() {
    let chunks = corpus();
    let tfidf = TfidfVectorizer::fit(&chunks);
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| tfidf.transform(c)).collect();
    let index = VectorIndex::build(vectors).unwrap();

    // A vectorizer refit on a different corpus projects into a different
    // space; the index must refuse its query vectors.
    let stale = TfidfVectorizer::fit(&vec!["entirely different words".to_string()]);
    assert_ne!(stale.dimension(), tfidf.dimension());
    let err = index.search(&stale.transform("different"), 1).unwrap_err();
    assert!(matches!(err, IndexError::DimensionMismatch { .. }));
}

#[test]
fn vector_scores_are_comparable_with_lexical() {
    let chunks = corpus();
    let tfidf = TfidfVectorizer::fit(&chunks);
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| tfidf.transform(c)).collect();
    let index = VectorIndex::build(vectors).unwrap();

    // An exact chunk text queries back at distance ~0, similarity ~1.
    let hits = index.search(&tfidf.transform(&chunks[1]), 1).unwrap();
    assert_eq!(hits[0].0, 1);
    let sim = similarity_from_distance(hits[0].1);
    assert!(sim > 0.99 && sim <= 1.0);
}
