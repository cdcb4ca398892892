use chunk_model::{DocMeta, SourceDocument, SourceKind};
use doc_segmenter::{Segmenter, SegmenterConfig};

fn long_document(words: usize) -> String {
    // Varied vocabulary so BPE counts are realistic, not degenerate.
    let bank = [
        "orbital", "telemetry", "regolith", "perihelion", "spectrometer", "lander",
        "basalt", "crater", "aquifer", "magnetosphere", "ionosphere", "payload",
    ];
    (0..words)
        .map(|i| bank[i % bank.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn every_chunk_fits_the_token_budget() {
    let cfg = SegmenterConfig::new(24, 6, false).unwrap();
    let seg = Segmenter::new(cfg).unwrap();
    let docs = vec![SourceDocument::new(long_document(500), DocMeta::default())];

    let (chunks, meta) = seg.segment(&docs);
    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        let measured = seg.count_tokens(chunk);
        assert!(measured <= 24, "chunk {i} has {measured} tokens");
        assert_eq!(meta[i].tokens, measured);
    }
}

#[test]
fn consecutive_chunks_share_overlap_words() {
    let overlap = 4usize;
    let cfg = SegmenterConfig::new(16, overlap, false).unwrap();
    let seg = Segmenter::new(cfg).unwrap();
    // Short common words encode to one BPE token each, so no window gets
    // trimmed and the overlap stays exact.
    let bank = ["sun", "moon", "rock", "dust", "wind", "sky", "star", "ice"];
    let text = (0..200).map(|i| bank[i % bank.len()]).collect::<Vec<_>>().join(" ");
    let docs = vec![SourceDocument::new(text, DocMeta::default())];

    let (chunks, _) = seg.segment(&docs);
    assert!(chunks.len() > 2);
    for pair in chunks.windows(2) {
        let prev: Vec<&str> = pair[0].split_whitespace().collect();
        let next: Vec<&str> = pair[1].split_whitespace().collect();
        let want = overlap.min(prev.len()).min(next.len());
        assert_eq!(
            prev[prev.len() - want..],
            next[..want],
            "chunks {:?} and {:?} do not overlap by {want} words",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn metadata_is_positionally_aligned_and_flattened() {
    let cfg = SegmenterConfig::new(16, 4, false).unwrap();
    let seg = Segmenter::new(cfg).unwrap();
    let docs = vec![
        SourceDocument::new(
            long_document(60),
            DocMeta {
                source_kind: SourceKind::Wikipedia,
                title: Some("Mars".into()),
                url: Some("https://en.wikipedia.org/wiki/Mars".into()),
                ..DocMeta::default()
            },
        ),
        SourceDocument::new(
            long_document(40),
            DocMeta {
                source_kind: SourceKind::Pdf,
                filename: Some("report.pdf".into()),
                ..DocMeta::default()
            },
        ),
    ];

    let (chunks, meta) = seg.segment(&docs);
    assert_eq!(chunks.len(), meta.len());

    let mut expect_chunk_id = 0usize;
    let mut current_doc = 0usize;
    for m in &meta {
        if m.doc_id != current_doc {
            current_doc = m.doc_id;
            expect_chunk_id = 0;
        }
        assert_eq!(m.chunk_id, expect_chunk_id);
        expect_chunk_id += 1;
        // Every chunk carries its owning document's metadata.
        match m.doc_id {
            0 => assert_eq!(m.source.title.as_deref(), Some("Mars")),
            1 => assert_eq!(m.source.filename.as_deref(), Some("report.pdf")),
            other => panic!("unexpected doc_id {other}"),
        }
    }
}

#[test]
fn normalization_reaches_the_chunks() {
    let cfg = SegmenterConfig::new(64, 8, false).unwrap();
    let seg = Segmenter::new(cfg).unwrap();
    let docs = vec![SourceDocument::new(
        "Dust &amp; Wind \u{2014} a \u{201C}Martian\u{201D} story",
        DocMeta::default(),
    )];
    let (chunks, _) = seg.segment(&docs);
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].contains("dust"));
    assert!(!chunks[0].contains('&'));
    assert!(!chunks[0].contains('\u{201C}'));
}

#[test]
fn stopword_filtering_follows_config() {
    let with = Segmenter::new(SegmenterConfig::new(64, 8, true).unwrap()).unwrap();
    let without = Segmenter::new(SegmenterConfig::new(64, 8, false).unwrap()).unwrap();
    let docs = vec![SourceDocument::new("The Moon orbits the Earth.", DocMeta::default())];

    let (filtered, _) = with.segment(&docs);
    let (kept, _) = without.segment(&docs);
    assert!(!filtered[0].split_whitespace().any(|w| w == "the"));
    assert!(kept[0].split_whitespace().any(|w| w == "the"));
}
