use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chunk_model::{DocMeta, SourceDocument, SourceKind};
use doc_segmenter::SegmenterConfig;
use hybrid_retrieval::{build_index, BuildOutcome, HybridRetriever, RetrieverConfig};

fn print_usage() {
    eprintln!(
        "Usage:\n\
         retrieval-cli build INDEX_DIR --docs DIR [--max-tokens N] [--overlap N] [--keep-stopwords]\n\
         retrieval-cli search INDEX_DIR --query Q [--k N] [--best]\n\
         \n\
         Notes: build reads every .txt and .md file under --docs (non-recursive);\n\
         an existing index directory is left untouched.\n"
    );
}

fn load_documents(dir: &Path) -> Result<Vec<SourceDocument>, String> {
    let mut docs = Vec::new();
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| format!("read docs dir {}: {e}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("txt") | Some("md")
            )
        })
        .collect();
    // Deterministic document order gives deterministic doc_ids.
    entries.sort();

    for path in entries {
        let text = fs::read_to_string(&path)
            .map_err(|e| format!("read {}: {e}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        docs.push(SourceDocument {
            text,
            meta: DocMeta {
                source_kind: SourceKind::Text,
                filename,
                ..DocMeta::default()
            },
        });
    }
    Ok(docs)
}

fn do_build(mut tail: Vec<String>) -> Result<(), String> {
    if tail.is_empty() || tail[0].starts_with('-') {
        return Err("build requires INDEX_DIR".into());
    }
    let index_dir = PathBuf::from(tail.remove(0));

    let mut docs_dir: Option<PathBuf> = None;
    let mut max_tokens: usize = 128;
    let mut overlap: usize = 32;
    let mut remove_stopwords = true;

    let mut i = 0;
    while i < tail.len() {
        match tail[i].as_str() {
            "--docs" => { if i+1<tail.len() { docs_dir = Some(PathBuf::from(&tail[i+1])); i+=2; } else { return Err("--docs requires dir".into()); } }
            "--max-tokens" => { if i+1<tail.len() { max_tokens = tail[i+1].parse().map_err(|_| "--max-tokens requires number".to_string())?; i+=2; } else { return Err("--max-tokens requires number".into()); } }
            "--overlap" => { if i+1<tail.len() { overlap = tail[i+1].parse().map_err(|_| "--overlap requires number".to_string())?; i+=2; } else { return Err("--overlap requires number".into()); } }
            "--keep-stopwords" => { remove_stopwords = false; i+=1; }
            _ => { return Err(format!("unknown build argument: {}", tail[i])); }
        }
    }

    let docs_dir = docs_dir.ok_or_else(|| "--docs required".to_string())?;
    let documents = load_documents(&docs_dir)?;
    if documents.is_empty() {
        return Err(format!("no .txt or .md files under {}", docs_dir.display()));
    }

    let segmenter = SegmenterConfig::new(max_tokens, overlap, remove_stopwords)
        .map_err(|e| e.to_string())?;
    let config = RetrieverConfig { index_dir, segmenter, ..RetrieverConfig::default() };

    match build_index(&config, &documents).map_err(|e| e.to_string())? {
        BuildOutcome::Built { chunks } => {
            println!("Built index: {} documents, {} chunks -> {}", documents.len(), chunks, config.index_dir.display());
        }
        BuildOutcome::SkippedExisting => {
            println!("Index already exists at {}, nothing to do", config.index_dir.display());
        }
    }
    Ok(())
}

fn do_search(mut tail: Vec<String>) -> Result<(), String> {
    if tail.is_empty() || tail[0].starts_with('-') {
        return Err("search requires INDEX_DIR".into());
    }
    let index_dir = PathBuf::from(tail.remove(0));

    let mut query: Option<String> = None;
    let mut k: Option<usize> = None;
    let mut best = false;

    let mut i = 0;
    while i < tail.len() {
        match tail[i].as_str() {
            "--query" => { if i+1<tail.len() { query = Some(tail[i+1].clone()); i+=2; } else { return Err("--query requires value".into()); } }
            "--k" => { if i+1<tail.len() { k = Some(tail[i+1].parse().map_err(|_| "--k requires number".to_string())?); i+=2; } else { return Err("--k requires number".into()); } }
            "--best" => { best = true; i+=1; }
            _ => { return Err(format!("unknown search argument: {}", tail[i])); }
        }
    }

    let query = query.ok_or_else(|| "--query required".to_string())?;
    let config = RetrieverConfig { index_dir, ..RetrieverConfig::default() };
    let k = k.unwrap_or(config.k);
    let retriever = HybridRetriever::load(config).map_err(|e| e.to_string())?;

    if best {
        match retriever.retrieve_best(&query).map_err(|e| e.to_string())? {
            Some(b) => {
                println!(
                    "[{}] score={:.4} doc={} chunk={} {}",
                    b.winner.tag(),
                    b.hit.score,
                    b.hit.meta.doc_id,
                    b.hit.meta.chunk_id,
                    truncate_chars(&b.hit.text, 80)
                );
            }
            None => println!("No hits"),
        }
        return Ok(());
    }

    let hits = retriever.retrieve(&query, k).map_err(|e| e.to_string())?;
    println!("Hits: {}", hits.len());
    for (i, h) in hits.iter().enumerate() {
        println!(
            "{:>2}. [{}] score={:.4} doc={} chunk={} {}",
            i + 1,
            h.method.tag(),
            h.score,
            h.meta.doc_id,
            h.meta.chunk_id,
            truncate_chars(&h.text, 80)
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return;
    }
    let cmd = args.remove(0);
    let res = match cmd.as_str() {
        "build" => do_build(args),
        "search" => do_search(args),
        _ => { print_usage(); return; }
    };
    if let Err(err) = res {
        eprintln!("Error: {}", err);
        print_usage();
        std::process::exit(1);
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let mut it = s.chars();
    let truncated: String = it.by_ref().take(max_chars).collect();
    if it.next().is_some() {
        format!("{}…", truncated)
    } else {
        truncated
    }
}
