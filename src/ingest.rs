use std::path::Path;

use anyhow::Context;
use quarry_index::Document;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Read every supported text file under `dir`, recursively, in path order.
///
/// Each document carries `source` (the file path) and `title` (the file stem).
pub async fn load_documents(dir: &Path) -> anyhow::Result<Vec<Document>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .with_context(|| format!("failed to read directory {}", current.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if is_supported(&path) {
                files.push(path);
            }
        }
    }
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "skipping empty file");
            continue;
        }
        documents.push(to_document(&path, content));
    }
    tracing::info!(dir = %dir.display(), documents = documents.len(), "documents loaded");
    Ok(documents)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

fn to_document(path: &Path, content: String) -> Document {
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Document::new(content)
        .with_metadata("source", path.display().to_string())
        .with_metadata("title", title)
}

/// Split documents into overlapping character windows, keeping their metadata.
#[must_use]
pub fn split_documents(documents: &[Document], chunk_size: usize, overlap: usize) -> Vec<Document> {
    documents
        .iter()
        .flat_map(|doc| {
            split_chars(doc.content(), chunk_size, overlap)
                .into_iter()
                .enumerate()
                .map(move |(i, chunk)| {
                    let mut out = Document::new(chunk);
                    for (key, value) in doc.metadata() {
                        out = out.with_metadata(key.clone(), value.clone());
                    }
                    out.with_metadata("chunk", i.to_string())
                })
        })
        .collect()
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        if !chunk.trim().is_empty() {
            chunks.push(chunk.trim().to_owned());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
